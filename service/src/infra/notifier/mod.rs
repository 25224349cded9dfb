//! [`Notifier`]-related implementations.

pub mod memory;
pub mod resend;

use derive_more::{Display, Error as StdError, From};

pub use self::{memory::Memory, resend::Resend};

/// Outbound notification operation.
pub use common::Handler as Notifier;

/// [`Notifier`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed.
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// [`Notifier`] refused to deliver the message.
    #[display("`Notifier` responded with `{status}` status: {reason}")]
    #[from(ignore)]
    Rejected {
        /// HTTP status of the response.
        status: reqwest::StatusCode,

        /// Reason provided by the [`Notifier`].
        reason: String,
    },
}
