//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod authorization;
pub mod command;
pub mod domain;
pub mod infra;
pub mod query;

use std::time;

use derive_more::Debug;

#[cfg(doc)]
use infra::{Database, Notifier, Storage};

use self::domain::media;

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`media::Namespace`] new images are uploaded into.
    pub upload_namespace: media::Namespace,

    /// Maximum duration of a single upload into the [`Storage`].
    pub upload_timeout: time::Duration,

    /// Maximum duration of a single [`Database`] operation.
    pub store_timeout: time::Duration,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, St, Nt> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Storage`] of this [`Service`].
    storage: St,

    /// [`Notifier`] of this [`Service`].
    notifier: Nt,
}

impl<Db, St, Nt> Service<Db, St, Nt> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(
        config: Config,
        database: Db,
        storage: St,
        notifier: Nt,
    ) -> Self {
        Self {
            config,
            database,
            storage,
            notifier,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Storage`] of this [`Service`].
    #[must_use]
    pub fn storage(&self) -> &St {
        &self.storage
    }

    /// Returns [`Notifier`] of this [`Service`].
    #[must_use]
    pub fn notifier(&self) -> &Nt {
        &self.notifier
    }
}

#[cfg(test)]
pub(crate) mod test {
    //! Shared fixtures of unit tests.

    use std::time;

    use common::operations::Insert;

    use crate::{
        domain::{
            media,
            property::{self, Fields},
            user, Property,
        },
        infra::{self, Database as _},
        Config, Service,
    };

    /// Secret signing session tokens in tests.
    pub(crate) const JWT_SECRET: &[u8] = b"secret";

    /// [`Service`] backed by in-memory infrastructure.
    pub(crate) type MemoryService = Service<
        infra::database::Memory,
        infra::storage::Memory,
        infra::notifier::Memory,
    >;

    /// Returns a [`Config`] suitable for tests.
    pub(crate) fn config() -> Config {
        Config {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                JWT_SECRET,
            ),
            upload_namespace: media::Namespace::from(
                "propertypulse".to_owned(),
            ),
            upload_timeout: time::Duration::from_secs(5),
            store_timeout: time::Duration::from_secs(5),
        }
    }

    /// Creates a new [`MemoryService`].
    pub(crate) fn service() -> MemoryService {
        Service::new(
            config(),
            infra::database::Memory::new(),
            infra::storage::Memory::new(),
            infra::notifier::Memory::new(),
        )
    }

    /// Creates a [`Property`] owned by the provided user and stores it.
    pub(crate) async fn seed(
        db: &infra::database::Memory,
        owner: user::Id,
    ) -> Property {
        let property = Property {
            id: property::Id::new(),
            owner,
            fields: Fields {
                name: Some(property::Name::from("Boston Commons".to_owned())),
                ..Fields::default()
            },
            images: vec![
                media::Reference::new("https://cdn/a.jpg"),
                media::Reference::new("https://cdn/b.jpg"),
            ],
            created_at: property::CreationDateTime::UNIX_EPOCH,
            updated_at: property::ModificationDateTime::UNIX_EPOCH,
        };
        db.execute(Insert(property.clone())).await.unwrap();
        property
    }
}
