//! Infrastructure layer.

pub mod database;
pub mod notifier;
pub mod storage;

pub use self::{database::Database, notifier::Notifier, storage::Storage};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
