//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Object storage configuration.
    pub storage: Storage,

    /// Email notifier configuration.
    pub notifier: Notifier,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// Maximum size of a request body in bytes.
    #[default(20 * 1024 * 1024)]
    pub max_body_size: usize,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(SecretString::from("secret"))]
    pub jwt_secret: SecretString,

    /// Namespace new images are uploaded into.
    #[default("propertypulse".to_owned())]
    pub upload_namespace: String,

    /// Maximum duration of a single image upload.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub upload_timeout: time::Duration,

    /// Maximum duration of a single database operation.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub store_timeout: time::Duration,

    /// Address notifications are sent from.
    #[default("PropertyPulse <onboarding@resend.dev>".to_owned())]
    pub notification_sender: String,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            upload_namespace,
            upload_timeout,
            store_timeout,
            notification_sender: _,
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.expose_secret().as_bytes(),
            ),
            upload_namespace: upload_namespace.into(),
            upload_timeout,
            store_timeout,
        }
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Object storage configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Storage {
    /// Base URL objects are uploaded to.
    #[default("http://127.0.0.1:9000/media".to_owned())]
    pub endpoint: String,

    /// Base URL uploaded objects are publicly available at.
    #[default("http://127.0.0.1:9000/media".to_owned())]
    pub public_url: String,

    /// Bearer token authorizing uploads, if required.
    pub token: Option<SecretString>,
}

impl From<Storage> for service::infra::storage::http::Config {
    fn from(value: Storage) -> Self {
        let Storage {
            endpoint,
            public_url,
            token,
        } = value;
        Self {
            endpoint,
            public_url,
            token,
        }
    }
}

/// Email notifier configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Notifier {
    /// Base URL of the [Resend] API.
    ///
    /// [Resend]: https://resend.com
    #[default("https://api.resend.com".to_owned())]
    pub api_url: String,

    /// API key of the [Resend] account.
    ///
    /// [Resend]: https://resend.com
    #[default(SecretString::from(""))]
    pub api_key: SecretString,
}

impl Notifier {
    /// Converts this [`Notifier`] configuration into the one of
    /// [`service::infra::notifier::Resend`], sending from the provided
    /// address.
    #[must_use]
    pub fn into_resend(
        self,
        from: String,
    ) -> service::infra::notifier::resend::Config {
        let Self { api_url, api_key } = self;
        service::infra::notifier::resend::Config {
            api_url,
            api_key,
            from,
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
