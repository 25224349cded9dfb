//! HTTP API definitions.

pub mod message;
pub mod property;

use axum::{
    routing::{get, post},
    Router,
};

use crate::define_error;

pub use self::property::Property;

/// Creates a new [`Router`] serving the HTTP API.
///
/// [`Service`] is expected to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/properties/:id",
            get(property::get)
                .put(property::update)
                .delete(property::delete),
        )
        .route("/api/messages/send-email", post(message::send_email))
}

define_error! {
    enum ApiError {
        #[code = "UNAUTHENTICATED"]
        #[status = UNAUTHORIZED]
        #[message = "Authentication required"]
        Unauthenticated,

        #[code = "FORBIDDEN"]
        #[status = UNAUTHORIZED]
        #[message = "Caller does not own the property"]
        Forbidden,

        #[code = "PROPERTY_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Property not found"]
        PropertyNotFound,

        #[code = "MALFORMED_PAYLOAD"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Malformed payload"]
        MalformedPayload,

        #[code = "UPLOAD_FAILED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Failed to upload images"]
        UploadFailed,

        #[code = "STORE_UNAVAILABLE"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Property store is unavailable"]
        StoreUnavailable,

        #[code = "NOTIFICATION_FAILED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Failed to send message"]
        NotificationFailed,
    }
}
