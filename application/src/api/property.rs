//! [`Property`]-related HTTP API definitions.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path},
    Extension, Json,
};
use common::DateTime;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use service::{
    command::{
        self,
        update_property::{Form, Part, Payload},
    },
    domain::{self, property, user},
    query, Command as _,
};
use tracing as log;

use crate::{api::ApiError, AsError, CurrentSession, Error, Service};

/// Public representation of a [`domain::Property`].
#[derive(Clone, Debug, Serialize)]
pub struct Property {
    /// ID of the [`Property`].
    pub id: String,

    /// ID of the owner.
    pub owner: String,

    /// Category of the [`Property`].
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Name of the [`Property`].
    pub name: Option<String>,

    /// Description of the [`Property`].
    pub description: Option<String>,

    /// [`Location`] of the [`Property`].
    pub location: Location,

    /// Number of bedrooms.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub beds: Option<Decimal>,

    /// Number of bathrooms.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub baths: Option<Decimal>,

    /// Living area in square feet.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub square_feet: Option<Decimal>,

    /// Amenity tags.
    pub amenities: Vec<String>,

    /// [`Rates`] of the [`Property`].
    pub rates: Rates,

    /// [`SellerInfo`] of the [`Property`].
    pub seller_info: SellerInfo,

    /// Image references in their display order.
    pub images: Vec<String>,

    /// [`DateTime`] when the [`Property`] was created.
    #[serde(serialize_with = "rfc3339")]
    pub created_at: DateTime,

    /// [`DateTime`] when the [`Property`] was modified the last time.
    #[serde(serialize_with = "rfc3339")]
    pub updated_at: DateTime,
}

/// Postal location of a [`Property`].
#[derive(Clone, Debug, Serialize)]
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
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Rates {
    /// Rate per week.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub weekly: Option<Decimal>,

    /// Rate per month.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub monthly: Option<Decimal>,

    /// Rate per night.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub nightly: Option<Decimal>,
}

/// Contact data of a [`Property`] seller.
#[derive(Clone, Debug, Serialize)]
pub struct SellerInfo {
    /// Name of the seller.
    pub name: Option<String>,

    /// Email of the seller.
    pub email: Option<String>,

    /// Phone of the seller.
    pub phone: Option<String>,
}

impl From<domain::Property> for Property {
    fn from(p: domain::Property) -> Self {
        let domain::Property {
            id,
            owner,
            fields,
            images,
            created_at,
            updated_at,
        } = p;
        let property::Fields {
            kind,
            name,
            description,
            location,
            beds,
            baths,
            square_feet,
            amenities,
            rates,
            seller_info,
        } = fields;

        Self {
            id: id.to_string(),
            owner: owner.to_string(),
            kind: kind.map(Into::into),
            name: name.map(Into::into),
            description: description.map(Into::into),
            location: Location {
                street: location.street,
                city: location.city,
                state: location.state,
                zipcode: location.zipcode,
            },
            beds: beds.map(property::Number::decimal),
            baths: baths.map(property::Number::decimal),
            square_feet: square_feet.map(property::Number::decimal),
            amenities: amenities.into_iter().map(Into::into).collect(),
            rates: Rates {
                weekly: rates.weekly.map(property::Number::decimal),
                monthly: rates.monthly.map(property::Number::decimal),
                nightly: rates.nightly.map(property::Number::decimal),
            },
            seller_info: SellerInfo {
                name: seller_info.name,
                email: seller_info.email,
                phone: seller_info.phone,
            },
            images: images.into_iter().map(Into::into).collect(),
            created_at: created_at.coerce(),
            updated_at: updated_at.coerce(),
        }
    }
}

/// Serializes the provided [`DateTime`] as an [RFC 3339] string.
///
/// [RFC 3339]: https://tools.ietf.org/html/rfc3339
fn rfc3339<S: Serializer>(dt: &DateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&dt.to_rfc3339())
}

/// Body of a successful [`delete`] response.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Deleted {
    /// Confirmation message.
    pub message: &'static str,
}

/// Parses the raw path segment into a [`property::Id`].
fn parse_id(raw: &str) -> Option<property::Id> {
    raw.parse().ok()
}

/// Returns the [`ApiError`] reported for a malformed [`property::Id`] on a
/// mutation.
///
/// Malformed IDs cannot name any [`Property`], while anonymous callers are
/// rejected before anything else.
fn malformed_id(caller: Option<user::Id>) -> ApiError {
    if caller.is_some() {
        ApiError::PropertyNotFound
    } else {
        ApiError::Unauthenticated
    }
}

/// Returns the [`Property`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `PROPERTY_NOT_FOUND` - no [`Property`] with the provided ID exists;
/// - `STORE_UNAVAILABLE` - the store failed.
#[tracing::instrument(skip_all, fields(property_id = %id))]
pub async fn get(
    Extension(service): Extension<Service>,
    Path(id): Path<String>,
) -> Result<Json<Property>, Error> {
    let id = parse_id(&id).ok_or(ApiError::PropertyNotFound)?;

    service
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|p| Json(p.into()))
        .ok_or_else(|| ApiError::PropertyNotFound.into())
}

/// Replaces all the fields and images of the [`Property`] with the submitted
/// `multipart/form-data` ones.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHENTICATED` - no valid session is provided;
/// - `PROPERTY_NOT_FOUND` - no [`Property`] with the provided ID exists;
/// - `FORBIDDEN` - caller doesn't own the [`Property`];
/// - `MALFORMED_PAYLOAD` - submitted form is malformed;
/// - `UPLOAD_FAILED` - new images couldn't be uploaded;
/// - `STORE_UNAVAILABLE` - the store failed.
#[tracing::instrument(
    skip_all,
    fields(property_id = %id, user_id = ?session.user_id()),
)]
pub async fn update(
    Extension(service): Extension<Service>,
    session: CurrentSession,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Property>, Error> {
    let caller = session.user_id();
    if caller.is_none() {
        return Err(ApiError::Unauthenticated.into());
    }
    let property_id = parse_id(&id).ok_or_else(|| malformed_id(caller))?;

    let payload = match multipart {
        Ok(multipart) => read_form(multipart).await,
        Err(e) => Payload::Unreadable(e.body_text()),
    };

    service
        .execute(command::UpdateProperty {
            property_id,
            caller,
            payload,
        })
        .await
        .map(|p| Json(p.into()))
        .map_err(AsError::into_error)
}

/// Deletes the [`Property`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHENTICATED` - no valid session is provided;
/// - `PROPERTY_NOT_FOUND` - no [`Property`] with the provided ID exists;
/// - `FORBIDDEN` - caller doesn't own the [`Property`];
/// - `STORE_UNAVAILABLE` - the store failed.
#[tracing::instrument(
    skip_all,
    fields(property_id = %id, user_id = ?session.user_id()),
)]
pub async fn delete(
    Extension(service): Extension<Service>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, Error> {
    let caller = session.user_id();
    let property_id = parse_id(&id).ok_or_else(|| malformed_id(caller))?;

    _ = service
        .execute(command::DeleteProperty {
            property_id,
            caller,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Deleted {
        message: "Property deleted",
    }))
}

/// Reads all the parts of the provided [`Multipart`] into a [`Payload`].
async fn read_form(mut multipart: Multipart) -> Payload {
    let mut form = Form::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Payload::Unreadable(e.body_text()),
        };

        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(ToOwned::to_owned);
        let content_type = field.content_type().map(ToOwned::to_owned);
        match field.bytes().await {
            Ok(content) => form.push(Part {
                name,
                file_name,
                content_type,
                content: content.to_vec(),
            }),
            Err(e) => {
                log::debug!("failed to read `{name}` part: {e}");
                return Payload::Unreadable(e.body_text());
            }
        }
    }
    Payload::Form(form)
}

#[cfg(test)]
mod spec {
    use axum::{
        body::{self, Body},
        extract::Multipart,
        http::{header, Request, StatusCode},
        routing::post,
        Router,
    };
    use service::{
        command::update_property::Payload,
        domain::{self, media, property, user},
    };
    use tower::ServiceExt as _;

    use super::{read_form, Property};

    #[test]
    fn serializes_property() {
        let p = domain::Property {
            id: property::Id::new(),
            owner: user::Id::new(),
            fields: property::Fields {
                kind: Some(property::Kind::from("Cabin".to_owned())),
                beds: property::Number::coerce("2").unwrap(),
                amenities: vec![property::Amenity::from("Wifi".to_owned())],
                rates: property::Rates {
                    nightly: property::Number::coerce("99.5").unwrap(),
                    ..property::Rates::default()
                },
                ..property::Fields::default()
            },
            images: vec![media::Reference::new("https://cdn/a.jpg")],
            created_at: property::CreationDateTime::UNIX_EPOCH,
            updated_at: property::ModificationDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_value(Property::from(p.clone())).unwrap();

        assert_eq!(json["id"], p.id.to_string());
        assert_eq!(json["owner"], p.owner.to_string());
        assert_eq!(json["type"], "Cabin");
        assert_eq!(json["name"], serde_json::Value::Null);
        assert_eq!(json["beds"], 2.0);
        assert_eq!(json["rates"]["nightly"], 99.5);
        assert_eq!(json["rates"]["weekly"], serde_json::Value::Null);
        assert_eq!(json["amenities"], serde_json::json!(["Wifi"]));
        assert_eq!(json["images"], serde_json::json!(["https://cdn/a.jpg"]));
        assert_eq!(json["location"]["city"], serde_json::Value::Null);
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
    }

    async fn echo(multipart: Multipart) -> String {
        match read_form(multipart).await {
            Payload::Form(form) => form
                .into_parts()
                .into_iter()
                .map(|p| {
                    format!(
                        "{}|{}|{}",
                        p.name,
                        p.file_name.unwrap_or_default(),
                        p.content.len(),
                    )
                })
                .collect::<Vec<_>>()
                .join(";"),
            Payload::Unreadable(reason) => format!("unreadable: {reason}"),
        }
    }

    #[tokio::test]
    async fn reads_multipart_parts_in_order() {
        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            Cabin\r\n\
            --X\r\n\
            Content-Disposition: form-data; name=\"images\"; \
            filename=\"a.jpg\"\r\n\
            Content-Type: image/jpeg\r\n\r\n\
            abc\r\n\
            --X\r\n\
            Content-Disposition: form-data; name=\"amenities\"\r\n\r\n\
            Wifi\r\n\
            --X--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap();

        let response = Router::new()
            .route("/", post(echo))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"name||5;images|a.jpg|3;amenities||4");
    }
}
