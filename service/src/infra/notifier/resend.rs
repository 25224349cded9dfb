//! [Resend] [`Notifier`] implementation.
//!
//! [Resend]: https://resend.com/docs/api-reference/emails/send-email

use common::operations::Notify;
use derive_more::Debug;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use tracerr::Traced;

use crate::{
    domain::{message, Message},
    infra::{notifier, Notifier},
};

/// [`Resend`] notifier configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the [Resend] API.
    ///
    /// [Resend]: https://resend.com
    pub api_url: String,

    /// API key authorizing requests.
    #[debug(skip)]
    pub api_key: SecretString,

    /// Address messages are sent from.
    pub from: String,
}

/// [`Notifier`] delivering [`Message`]s as emails via [Resend] API.
///
/// [Resend]: https://resend.com
#[derive(Clone, Debug)]
pub struct Resend {
    /// HTTP client performing requests.
    client: reqwest::Client,

    /// [`Config`] of this [`Resend`] notifier.
    config: Config,
}

impl Resend {
    /// Creates a new [`Resend`] notifier with the provided [`Config`].
    #[must_use]
    pub fn new(mut config: Config) -> Self {
        config.api_url = config.api_url.trim_end_matches('/').to_owned();
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Request body of the `POST /emails` endpoint.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    /// Sender address.
    from: &'a str,

    /// Recipient addresses.
    to: [&'a str; 1],

    /// Subject line.
    subject: &'a str,

    /// Plain text body.
    text: &'a str,
}

/// Successful response body of the `POST /emails` endpoint.
#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    /// ID of the sent email.
    id: String,
}

impl Notifier<Notify<Message>> for Resend {
    type Ok = message::DeliveryId;
    type Err = Traced<notifier::Error>;

    async fn execute(
        &self,
        Notify(msg): Notify<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        let resp = self
            .client
            .post(format!("{}/emails", self.config.api_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&SendEmailRequest {
                from: &self.config.from,
                to: [msg.to.as_ref()],
                subject: &msg.subject,
                text: &msg.body,
            })
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> notifier::Error))?;

        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            return Err(tracerr::new!(notifier::Error::Rejected {
                status,
                reason,
            }));
        }

        resp.json::<SendEmailResponse>()
            .await
            .map(|r| r.id.into())
            .map_err(tracerr::from_and_wrap!(=> notifier::Error))
    }
}
