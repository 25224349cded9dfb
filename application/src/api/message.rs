//! Message-related HTTP API definitions.

use axum::{extract::rejection::JsonRejection, Extension, Json};
use serde::{Deserialize, Serialize};
use service::{command, Command as _};

use crate::{AsError, Error, Service};

/// Inquiry about a property sent by a visitor.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendEmailRequest {
    /// Name of the inquirer.
    pub name: String,

    /// Email of the inquirer.
    pub email: String,

    /// Phone of the inquirer.
    pub phone: String,

    /// Text of the inquiry.
    pub message: String,

    /// Identifier of the addressed user.
    pub recipient: String,

    /// Identifier of the property.
    pub property: String,
}

impl From<SendEmailRequest> for command::SendMessage {
    fn from(req: SendEmailRequest) -> Self {
        let SendEmailRequest {
            name,
            email,
            phone,
            message,
            recipient,
            property,
        } = req;
        Self {
            name,
            email,
            phone,
            message,
            recipient,
            property,
        }
    }
}

/// Body of a successful [`send_email`] response.
#[derive(Clone, Debug, Serialize)]
pub struct Sent {
    /// Confirmation message.
    pub message: &'static str,

    /// Delivery ID assigned by the notification channel.
    pub id: String,
}

/// Sends the provided inquiry by email.
///
/// # Errors
///
/// Possible error codes:
/// - `MALFORMED_PAYLOAD` - request body is not a valid inquiry;
/// - `NOTIFICATION_FAILED` - the message couldn't be delivered.
#[tracing::instrument(skip_all)]
pub async fn send_email(
    Extension(service): Extension<Service>,
    req: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<Sent>, Error> {
    let Json(req) = req.map_err(AsError::into_error)?;

    let id = service
        .execute(command::SendMessage::from(req))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Sent {
        message: "Message sent successfully",
        id: id.to_string(),
    }))
}
