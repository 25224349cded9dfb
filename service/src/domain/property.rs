//! [`Property`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{media, user};

/// Property listing offered by its owner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the user who created this [`Property`].
    ///
    /// Never changes once the [`Property`] is created.
    pub owner: user::Id,

    /// Mutable [`Fields`] of this [`Property`].
    pub fields: Fields,

    /// [`media::Reference`]s to the images of this [`Property`] in their
    /// display order.
    pub images: Vec<media::Reference>,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Checks whether the provided user owns this [`Property`].
    #[must_use]
    pub fn is_owned_by(&self, user_id: user::Id) -> bool {
        self.owner == user_id
    }

    /// Replaces all the mutable data of this [`Property`] with the provided
    /// one, keeping its identity and ownership intact.
    #[must_use]
    pub fn replaced(
        &self,
        fields: Fields,
        images: Vec<media::Reference>,
    ) -> Self {
        Self {
            id: self.id,
            owner: self.owner,
            fields,
            images,
            created_at: self.created_at,
            updated_at: ModificationDateTime::now(),
        }
    }
}

/// Descriptive data of a [`Property`] replaced as a whole on every update.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Fields {
    /// [`Kind`] of the [`Property`].
    pub kind: Option<Kind>,

    /// [`Name`] of the [`Property`].
    pub name: Option<Name>,

    /// [`Description`] of the [`Property`].
    pub description: Option<Description>,

    /// [`Location`] of the [`Property`].
    pub location: Location,

    /// Number of bedrooms.
    pub beds: Option<Number>,

    /// Number of bathrooms.
    pub baths: Option<Number>,

    /// Living area in square feet.
    pub square_feet: Option<Number>,

    /// [`Amenity`] tags in the order they were provided.
    ///
    /// Duplicates are kept as is.
    pub amenities: Vec<Amenity>,

    /// [`Rates`] of the [`Property`].
    pub rates: Rates,

    /// Contact data of the seller.
    pub seller_info: SellerInfo,
}

/// ID of a [`Property`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Category tag of a [`Property`] (`Apartment`, `Cabin`, etc).
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Kind(String);

/// Name of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

/// Description of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

/// Amenity tag of a [`Property`] (`Wifi`, `Free Parking`, etc).
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Amenity(String);

/// Postal location of a [`Property`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Location {
    /// Street line.
    pub street: Option<String>,

    /// City name.
    pub city: Option<String>,

    /// State name.
    pub state: Option<String>,

    /// Postal code.
    pub zipcode: Option<String>,
}

/// Rental rates of a [`Property`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rates {
    /// Rate per week.
    pub weekly: Option<Number>,

    /// Rate per month.
    pub monthly: Option<Number>,

    /// Rate per night.
    pub nightly: Option<Number>,
}

/// Contact data of a [`Property`] seller.
///
/// This is a snapshot provided along with the listing, not a reference to the
/// owner's account.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SellerInfo {
    /// Name of the seller.
    pub name: Option<String>,

    /// Email of the seller.
    pub email: Option<String>,

    /// Phone of the seller.
    pub phone: Option<String>,
}

/// Numeric value of a [`Property`] field (counts, area, rates).
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(Decimal);

impl Number {
    /// Coerces the provided textual representation into a [`Number`].
    ///
    /// Blank input means an absent value, and so [`None`] is returned.
    ///
    /// # Errors
    ///
    /// If the non-blank input doesn't represent a decimal number.
    pub fn coerce(raw: &str) -> Result<Option<Self>, CoercionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(|d| Some(Self(d.normalize())))
            .map_err(|_| CoercionError(raw.to_owned()))
    }

    /// Returns the underlying [`Decimal`] of this [`Number`].
    #[must_use]
    pub const fn decimal(self) -> Decimal {
        self.0
    }
}

/// Error of coercing a text into a [`Number`].
#[derive(Clone, Debug, Display, Error)]
#[display("`{_0}` is not a number")]
pub struct CoercionError(#[error(not(source))] pub String);

/// Reconciles the [`media::Reference`]s kept by a client with the newly
/// uploaded ones.
///
/// Kept references go first in the order they were provided, followed by the
/// uploaded ones in the order of their submission. Nothing is deduplicated or
/// validated, so merging the previous list with no uploads reproduces it as
/// is.
#[must_use]
pub fn merge_images(
    kept: Vec<media::Reference>,
    uploaded: Vec<media::Reference>,
) -> Vec<media::Reference> {
    let mut images = kept;
    images.extend(uploaded);
    images
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was modified.
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;
