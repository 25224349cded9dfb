//! [`Message`] definitions.

use derive_more::{AsRef, Display, From};

/// Notification delivered through an outbound channel (email).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    /// Address the [`Message`] is delivered to.
    pub to: Address,

    /// Subject line of the [`Message`].
    pub subject: String,

    /// Plain text body of the [`Message`].
    pub body: String,
}

/// Address of a [`Message`] recipient.
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str, String)]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is non-blank.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        let trimmed = address.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }
}

/// ID of a delivered [`Message`] assigned by the outbound channel.
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str, String)]
pub struct DeliveryId(String);
