//! HTTP [`Storage`] implementation.

use common::operations::Upload;
use derive_more::Debug;
use reqwest::header;
use secrecy::{ExposeSecret as _, SecretString};
use tracerr::Traced;
use tracing as log;
use uuid::Uuid;

use crate::{
    domain::media,
    infra::{storage, Storage},
};

/// [`Http`] storage configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL objects are `PUT` to.
    pub endpoint: String,

    /// Base URL objects are publicly available at.
    pub public_url: String,

    /// Bearer token authorizing uploads, if required.
    #[debug(skip)]
    pub token: Option<SecretString>,
}

/// [`Storage`] accepting objects via HTTP `PUT` requests.
#[derive(Clone, Debug)]
pub struct Http {
    /// HTTP client performing requests.
    client: reqwest::Client,

    /// [`Config`] of this [`Http`] storage.
    config: Config,
}

impl Http {
    /// Creates a new [`Http`] storage with the provided [`Config`].
    #[must_use]
    pub fn new(mut config: Config) -> Self {
        config.endpoint = config.endpoint.trim_end_matches('/').to_owned();
        config.public_url = config.public_url.trim_end_matches('/').to_owned();
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Generates a new unique key for the provided [`storage::Object`].
fn object_key(object: &storage::Object) -> String {
    let namespace = AsRef::<str>::as_ref(&object.namespace).trim_matches('/');
    let name = Uuid::new_v4().simple();
    match object.attachment.extension() {
        Some(ext) => format!("{namespace}/{name}.{ext}"),
        None => format!("{namespace}/{name}"),
    }
}

impl Storage<Upload<storage::Object>> for Http {
    type Ok = media::Reference;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Upload(object): Upload<storage::Object>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = object_key(&object);
        let storage::Object { attachment, .. } = object;

        let mut req = self
            .client
            .put(format!("{}/{key}", self.config.endpoint))
            .header(header::CONTENT_TYPE, attachment.content_type());
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = req
            .body(attachment.content)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> storage::Error))?;
        if !resp.status().is_success() {
            log::warn!(
                "`Storage` rejected `{}` upload as `{key}`: {}",
                attachment.file_name,
                resp.status(),
            );
            return Err(tracerr::new!(storage::Error::Rejected(resp.status())));
        }

        Ok(media::Reference::new(format!(
            "{}/{key}",
            self.config.public_url,
        )))
    }
}
