//! [`Intent`] of a [`Property`] update and its normalization.

use derive_more::{Display, Error};
use tracing as log;

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::{
    media,
    property::{
        self, CoercionError, Fields, Location, Number, Rates, SellerInfo,
    },
};

use super::form::{Part, Payload};

/// Name of the repeated field listing amenity tags.
const AMENITIES: &str = "amenities";

/// Name of the field containing a JSON-encoded list of the kept images.
const EXISTING_IMAGES: &str = "existingImages";

/// Name of the repeated field carrying new image files.
const IMAGES: &str = "images";

/// Canonical update intent decoded out of a [`Payload`].
#[derive(Clone, Debug, Default)]
pub struct Intent {
    /// Scalar fields, still in their textual form.
    pub fields: RawFields,

    /// Image [`media::Reference`]s the caller keeps, in the desired order.
    pub kept_images: Vec<media::Reference>,

    /// New image files pending upload, in the submission order.
    pub attachments: Vec<media::Attachment>,
}

/// Textual scalar fields of an [`Intent`].
///
/// Numeric fields are kept as raw text here and coerced only by
/// [`RawFields::coerce()`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawFields {
    /// `type` field.
    pub kind: Option<String>,

    /// `name` field.
    pub name: Option<String>,

    /// `description` field.
    pub description: Option<String>,

    /// `location.*` fields.
    pub location: Location,

    /// `beds` field.
    pub beds: Option<String>,

    /// `baths` field.
    pub baths: Option<String>,

    /// `square_feet` field.
    pub square_feet: Option<String>,

    /// `amenities` values in the submission order.
    pub amenities: Vec<String>,

    /// `rates.weekly` field.
    pub weekly_rate: Option<String>,

    /// `rates.monthly` field.
    pub monthly_rate: Option<String>,

    /// `rates.nightly` field.
    pub nightly_rate: Option<String>,

    /// `seller_info.*` fields.
    pub seller_info: SellerInfo,
}

impl Intent {
    /// Decodes the provided [`Payload`] into an [`Intent`].
    ///
    /// Unknown fields are ignored. Scalar fields take their first value.
    /// Files without a name are discarded. An absent or unparsable
    /// `existingImages` field means that no images are kept.
    ///
    /// # Errors
    ///
    /// If the [`Payload`] is unreadable or contains a non-UTF-8 text field.
    pub fn normalize(payload: Payload) -> Result<Self, MalformedPayload> {
        let form = match payload {
            Payload::Form(form) => form,
            Payload::Unreadable(reason) => {
                return Err(MalformedPayload::Unreadable(reason));
            }
        };

        let mut intent = Self::default();
        let mut existing_images = None;
        for part in form.into_parts() {
            if part.name == IMAGES {
                intent.attachments.extend(attachment(part));
                continue;
            }
            if part.file_name.is_some() {
                log::debug!("ignoring file submitted as `{}` field", part.name);
                continue;
            }

            let Part { name, content, .. } = part;
            let value = String::from_utf8(content)
                .map_err(|_| MalformedPayload::NonUtf8Field(name.clone()))?;

            let f = &mut intent.fields;
            let slot = match name.as_str() {
                AMENITIES => {
                    f.amenities.push(value);
                    continue;
                }
                EXISTING_IMAGES => &mut existing_images,
                "type" => &mut f.kind,
                "name" => &mut f.name,
                "description" => &mut f.description,
                "location.street" => &mut f.location.street,
                "location.city" => &mut f.location.city,
                "location.state" => &mut f.location.state,
                "location.zipcode" => &mut f.location.zipcode,
                "beds" => &mut f.beds,
                "baths" => &mut f.baths,
                "square_feet" => &mut f.square_feet,
                "rates.weekly" => &mut f.weekly_rate,
                "rates.monthly" => &mut f.monthly_rate,
                "rates.nightly" => &mut f.nightly_rate,
                "seller_info.name" => &mut f.seller_info.name,
                "seller_info.email" => &mut f.seller_info.email,
                "seller_info.phone" => &mut f.seller_info.phone,
                _ => {
                    log::debug!("ignoring unknown `{name}` field");
                    continue;
                }
            };
            _ = slot.get_or_insert(value);
        }

        intent.kept_images =
            existing_images.as_deref().map(kept_images).unwrap_or_default();

        Ok(intent)
    }
}

impl RawFields {
    /// Coerces these [`RawFields`] into [`property::Fields`].
    ///
    /// Blank numeric fields become absent.
    ///
    /// # Errors
    ///
    /// If any non-blank numeric field is not a number.
    pub fn coerce(self) -> Result<Fields, MalformedPayload> {
        let Self {
            kind,
            name,
            description,
            location,
            beds,
            baths,
            square_feet,
            amenities,
            weekly_rate,
            monthly_rate,
            nightly_rate,
            seller_info,
        } = self;

        Ok(Fields {
            kind: kind.map(Into::into),
            name: name.map(Into::into),
            description: description.map(Into::into),
            location,
            beds: number("beds", beds)?,
            baths: number("baths", baths)?,
            square_feet: number("square_feet", square_feet)?,
            amenities: amenities.into_iter().map(Into::into).collect(),
            rates: Rates {
                weekly: number("rates.weekly", weekly_rate)?,
                monthly: number("rates.monthly", monthly_rate)?,
                nightly: number("rates.nightly", nightly_rate)?,
            },
            seller_info,
        })
    }
}

/// Converts the provided file [`Part`] into a [`media::Attachment`].
///
/// [`None`] is returned if the [`Part`] has no file name.
fn attachment(part: Part) -> Option<media::Attachment> {
    let Part {
        name: _,
        file_name,
        content_type,
        content,
    } = part;
    Some(media::Attachment {
        file_name: media::FileName::new(file_name?)?,
        content_type,
        content,
    })
}

/// Parses the JSON-encoded list of kept [`media::Reference`]s.
///
/// Anything but a JSON array of strings is treated as an empty list.
fn kept_images(json: &str) -> Vec<media::Reference> {
    serde_json::from_str::<Vec<String>>(json)
        .map(|list| list.into_iter().map(media::Reference::new).collect())
        .unwrap_or_else(|e| {
            log::warn!(
                "treating unparsable `{EXISTING_IMAGES}` as empty list: {e}",
            );
            Vec::new()
        })
}

/// Coerces the provided raw `field` value into a [`Number`].
fn number(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<Number>, MalformedPayload> {
    raw.as_deref()
        .map(Number::coerce)
        .transpose()
        .map(Option::flatten)
        .map_err(|error| MalformedPayload::NotANumber { field, error })
}

/// Error of decoding a [`Payload`] into an [`Intent`].
#[derive(Clone, Debug, Display, Error)]
pub enum MalformedPayload {
    /// [`Payload`] couldn't be decoded at all.
    #[display("unreadable payload: {_0}")]
    Unreadable(#[error(not(source))] String),

    /// Text field is not a valid UTF-8.
    #[display("`{_0}` field is not a valid UTF-8 text")]
    NonUtf8Field(#[error(not(source))] String),

    /// Numeric field cannot be coerced into a number the store accepts.
    ///
    /// No field is required, so this is a failure of the store boundary
    /// rather than of the form schema.
    #[display("`{field}` field cannot be stored as a number: {error}")]
    NotANumber {
        /// Name of the field.
        field: &'static str,

        /// [`CoercionError`] of the field.
        error: CoercionError,
    },
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::update_property::form::{Form, Payload},
        domain::{media::Reference, property::Number},
    };

    use super::{Intent, MalformedPayload};

    fn normalize(form: Form) -> Intent {
        Intent::normalize(Payload::Form(form)).unwrap()
    }

    #[test]
    fn reassembles_nested_fields() {
        let intent = normalize(
            Form::new()
                .text("type", "Apartment")
                .text("name", "Boston Commons Retreat")
                .text("location.street", "120 Tremont Street")
                .text("location.city", "Boston")
                .text("location.state", "MA")
                .text("location.zipcode", "02108")
                .text("rates.weekly", "1100")
                .text("seller_info.name", "John Doe")
                .text("seller_info.email", "john@gmail.com"),
        );

        let f = &intent.fields;
        assert_eq!(f.kind.as_deref(), Some("Apartment"));
        assert_eq!(f.name.as_deref(), Some("Boston Commons Retreat"));
        assert_eq!(f.location.street.as_deref(), Some("120 Tremont Street"));
        assert_eq!(f.location.city.as_deref(), Some("Boston"));
        assert_eq!(f.location.state.as_deref(), Some("MA"));
        assert_eq!(f.location.zipcode.as_deref(), Some("02108"));
        assert_eq!(f.weekly_rate.as_deref(), Some("1100"));
        assert_eq!(f.monthly_rate, None);
        assert_eq!(f.seller_info.name.as_deref(), Some("John Doe"));
        assert_eq!(f.seller_info.email.as_deref(), Some("john@gmail.com"));
        assert_eq!(f.seller_info.phone, None);
    }

    #[test]
    fn keeps_amenities_order() {
        let intent = normalize(
            Form::new()
                .text("amenities", "Wifi")
                .text("name", "Cabin")
                .text("amenities", "Full kitchen")
                .text("amenities", "Wifi"),
        );

        assert_eq!(intent.fields.amenities, ["Wifi", "Full kitchen", "Wifi"]);
    }

    #[test]
    fn takes_first_scalar_value() {
        let intent =
            normalize(Form::new().text("name", "First").text("name", "Second"));

        assert_eq!(intent.fields.name.as_deref(), Some("First"));
    }

    #[test]
    fn parses_kept_images() {
        let intent = normalize(
            Form::new().text("existingImages", r#"["https://a", "https://b"]"#),
        );

        assert_eq!(
            intent.kept_images,
            [Reference::new("https://a"), Reference::new("https://b")],
        );
    }

    #[test]
    fn tolerates_malformed_kept_images() {
        for raw in ["not json", "", r#"{"a": 1}"#, "[1, 2]", r#"["a", 1]"#] {
            let intent = normalize(Form::new().text("existingImages", raw));

            assert!(intent.kept_images.is_empty(), "`{raw}` accepted");
        }

        assert!(normalize(Form::new()).kept_images.is_empty());
    }

    #[test]
    fn collects_named_files_only() {
        let intent = normalize(
            Form::new()
                .file("images", "a.png", Some("image/png"), vec![1])
                .file("images", "", None, vec![])
                .text("images", "not a file")
                .file("images", "b.jpg", None, vec![2]),
        );

        let names = intent
            .attachments
            .iter()
            .map(|a| a.file_name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a.png", "b.jpg"]);
        assert_eq!(
            intent.attachments[0].content_type.as_deref(),
            Some("image/png"),
        );
        assert_eq!(intent.attachments[1].content, [2]);
    }

    #[test]
    fn ignores_unknown_and_file_scalar_fields() {
        let intent = normalize(
            Form::new()
                .text("owner", "someone-else")
                .file("name", "name.txt", None, b"Sneaky".to_vec()),
        );

        assert_eq!(intent.fields.name, None);
    }

    #[test]
    fn fails_on_unreadable_payload() {
        assert!(matches!(
            Intent::normalize(Payload::Unreadable("boom".into())),
            Err(MalformedPayload::Unreadable(_)),
        ));
    }

    #[test]
    fn fails_on_non_utf8_text() {
        let mut form = Form::new();
        form.push(crate::command::update_property::form::Part {
            name: "name".into(),
            file_name: None,
            content_type: None,
            content: vec![0xff, 0xfe],
        });

        assert!(matches!(
            Intent::normalize(Payload::Form(form)),
            Err(MalformedPayload::NonUtf8Field(n)) if n == "name",
        ));
    }

    #[test]
    fn coerces_numeric_fields() {
        let fields = normalize(
            Form::new()
                .text("beds", "3")
                .text("baths", "1.5")
                .text("square_feet", "")
                .text("rates.nightly", " 120 "),
        )
        .fields
        .coerce()
        .unwrap();

        assert_eq!(fields.beds, Some(Number::from(Decimal::from(3))));
        assert_eq!(fields.baths, Some(Number::from(Decimal::new(15, 1))));
        assert_eq!(fields.square_feet, None);
        assert_eq!(
            fields.rates.nightly,
            Some(Number::from(Decimal::from(120))),
        );
        assert_eq!(fields.rates.weekly, None);
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = normalize(Form::new().text("rates.monthly", "a lot"))
            .fields
            .coerce()
            .unwrap_err();

        assert!(matches!(
            err,
            MalformedPayload::NotANumber { field: "rates.monthly", .. },
        ));
    }
}
