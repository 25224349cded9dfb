//! [`Command`] definition.

pub mod authorize_session;
pub mod delete_property;
pub mod send_message;
pub mod update_property;

use std::{future::Future, time};

use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Property;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_session::AuthorizeSession, delete_property::DeleteProperty,
    send_message::SendMessage, update_property::UpdateProperty,
};

/// Stage of a [`Property`] mutation a failure happened at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Resolving the caller.
    Authenticate,

    /// Loading the current [`Property`] snapshot.
    Fetch,

    /// Checking the caller's permissions.
    Authorize,

    /// Decoding the request payload.
    Normalize,

    /// Uploading new images.
    Upload,

    /// Writing the result.
    Persist,
}

/// Awaits the provided `fut`ure for no longer than the provided `duration`.
///
/// # Errors
///
/// With the provided `on_elapsed` error if the `duration` elapses, or with the
/// error of the `fut`ure itself.
pub(crate) async fn timed<T, E>(
    duration: time::Duration,
    fut: impl Future<Output = Result<T, Traced<E>>>,
    on_elapsed: E,
) -> Result<T, Traced<E>> {
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| tracerr::new!(on_elapsed))?
}
