//! [`Command`] for sending an inquiry [`Message`] about a [`Property`].

use common::operations::Notify;
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Property;
use crate::{
    domain::{message, Message},
    infra::{notifier, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for sending an inquiry [`Message`] about a [`Property`].
#[derive(Clone, Debug, Default)]
pub struct SendMessage {
    /// Name of the inquirer.
    pub name: String,

    /// Email of the inquirer, the [`Message`] is delivered to.
    pub email: String,

    /// Phone of the inquirer.
    pub phone: String,

    /// Text of the inquiry.
    pub message: String,

    /// Identifier of the user the inquiry is addressed to.
    pub recipient: String,

    /// Identifier of the [`Property`] the inquiry is about.
    pub property: String,
}

impl SendMessage {
    /// Renders this [`SendMessage`] into a [`Message`].
    ///
    /// # Errors
    ///
    /// If the `email` is blank.
    pub fn render(&self) -> Result<Message, ExecutionError> {
        let Self {
            name,
            email,
            phone,
            message,
            recipient: _,
            property,
        } = self;

        Ok(Message {
            to: message::Address::new(email.as_str())
                .ok_or(ExecutionError::NoAddress)?,
            subject: format!("New message about property {property}"),
            body: format!(
                "New Message Received\n\
                 \n\
                 Name: {name}\n\
                 Email: {email}\n\
                 Phone: {phone}\n\
                 Message: {message}\n\
                 \n\
                 Please log in to the platform to reply.\n",
            ),
        })
    }
}

impl<Db, St, Nt> Command<SendMessage> for Service<Db, St, Nt>
where
    Nt: Notifier<
        Notify<Message>,
        Ok = message::DeliveryId,
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = message::DeliveryId;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SendMessage) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let msg = cmd.render().map_err(tracerr::wrap!())?;

        let id = self
            .notifier()
            .execute(Notify(msg))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .inspect_err(|e| {
                log::error!(
                    property = %cmd.property, recipient = %cmd.recipient,
                    "failed to send message: {e}",
                );
            })?;

        log::info!(
            property = %cmd.property, recipient = %cmd.recipient, %id,
            "message sent",
        );
        Ok(id)
    }
}

/// Error of [`SendMessage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Notifier`] error.
    #[display("`Notifier` operation failed: {_0}")]
    Notifier(notifier::Error),

    /// No address to deliver the [`Message`] to.
    #[display("`email` is blank")]
    #[from(ignore)]
    NoAddress,
}

#[cfg(test)]
mod spec {
    use crate::{command::Command as _, test};

    use super::{ExecutionError, SendMessage};

    fn inquiry() -> SendMessage {
        SendMessage {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            message: "Is it still available?".into(),
            recipient: "owner-1".into(),
            property: "property-1".into(),
        }
    }

    #[test]
    fn renders_message() {
        let msg = inquiry().render().unwrap();

        assert_eq!(msg.to.to_string(), "jane@example.com");
        assert_eq!(msg.subject, "New message about property property-1");
        assert!(msg.body.contains("Name: Jane\n"));
        assert!(msg.body.contains("Phone: 555-0100\n"));
        assert!(msg.body.contains("Message: Is it still available?\n"));
    }

    #[test]
    fn keeps_markup_as_plain_text() {
        let msg = SendMessage {
            message: "<b>hi</b>".into(),
            ..inquiry()
        }
        .render()
        .unwrap();

        assert!(msg.body.contains("Message: <b>hi</b>\n"));
    }

    #[tokio::test]
    async fn delivers_through_notifier() {
        let service = test::service();

        let id = service.execute(inquiry()).await.unwrap();

        assert!(!id.to_string().is_empty());
        let delivered = service.notifier().delivered().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0], inquiry().render().unwrap());
    }

    #[tokio::test]
    async fn rejects_blank_email() {
        let service = test::service();

        let err = service
            .execute(SendMessage {
                email: "  ".into(),
                ..inquiry()
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoAddress));
        assert!(service.notifier().delivered().await.is_empty());
    }
}
