//! Authorization of [`Property`] mutations.

use derive_more::{Display, Error};

use crate::domain::{property, user, Property};

/// Decides whether the provided caller may mutate or delete the provided
/// [`Property`] snapshot.
///
/// Checks are performed in a fixed order: a missing caller wins over a missing
/// [`Property`], which wins over an ownership mismatch.
///
/// # Errors
///
/// With the first [`Denial`] reason met.
pub fn authorize(
    caller: Option<user::Id>,
    property: Option<&Property>,
) -> Result<&Property, Denial> {
    let user_id = caller.ok_or(Denial::Unauthenticated)?;
    let property = property.ok_or(Denial::NotFound)?;
    if !property.is_owned_by(user_id) {
        return Err(Denial::Forbidden {
            property_id: property.id,
            user_id,
        });
    }
    Ok(property)
}

/// Reason of denying a [`Property`] mutation.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum Denial {
    /// Caller is not authenticated.
    #[display("caller is not authenticated")]
    Unauthenticated,

    /// [`Property`] doesn't exist.
    #[display("`Property` does not exist")]
    NotFound,

    /// Caller doesn't own the [`Property`].
    #[display(
        "`User(id: {user_id})` doesn't own `Property(id: {property_id})`"
    )]
    Forbidden {
        /// ID of the [`Property`] being mutated.
        property_id: property::Id,

        /// ID of the caller.
        user_id: user::Id,
    },
}

#[cfg(test)]
mod spec {
    use crate::domain::{
        property::{self, Fields},
        user, Property,
    };

    use super::{authorize, Denial};

    fn property(owner: user::Id) -> Property {
        Property {
            id: property::Id::new(),
            owner,
            fields: Fields::default(),
            images: vec![],
            created_at: property::CreationDateTime::UNIX_EPOCH,
            updated_at: property::ModificationDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn allows_owner() {
        let owner = user::Id::new();
        let property = property(owner);

        assert_eq!(authorize(Some(owner), Some(&property)), Ok(&property));
    }

    #[test]
    fn denies_anonymous_caller_first() {
        let property = property(user::Id::new());

        assert_eq!(
            authorize(None, Some(&property)),
            Err(Denial::Unauthenticated),
        );
        assert_eq!(authorize(None, None), Err(Denial::Unauthenticated));
    }

    #[test]
    fn reports_missing_property_before_ownership() {
        assert_eq!(
            authorize(Some(user::Id::new()), None),
            Err(Denial::NotFound),
        );
    }

    #[test]
    fn denies_foreign_caller() {
        let property = property(user::Id::new());
        let stranger = user::Id::new();

        assert_eq!(
            authorize(Some(stranger), Some(&property)),
            Err(Denial::Forbidden {
                property_id: property.id,
                user_id: stranger,
            }),
        );
    }
}
