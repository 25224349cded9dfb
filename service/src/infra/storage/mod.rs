//! [`Storage`]-related implementations.

pub mod http;
pub mod memory;

use derive_more::{Display, Error as StdError, From};

use crate::domain::media;

pub use self::{http::Http, memory::Memory};

/// Object storage operation.
pub use common::Handler as Storage;

/// Object to be uploaded into a [`Storage`].
#[derive(Clone, Debug)]
pub struct Object {
    /// [`media::Namespace`] to put the [`Object`] into.
    pub namespace: media::Namespace,

    /// [`media::Attachment`] to be stored.
    pub attachment: media::Attachment,
}

/// [`Storage`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Http`] request failed.
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// [`Storage`] rejected the [`Object`].
    #[display("`Storage` responded with `{_0}` status")]
    #[from(ignore)]
    Rejected(#[error(not(source))] reqwest::StatusCode),

    /// [`Storage`] operation didn't complete in time.
    #[display("`Storage` operation timed out")]
    #[from(ignore)]
    Timeout,
}
