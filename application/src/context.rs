//! [`CurrentSession`]-related definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::{
    command::{self, Command as _},
    domain::user::{self, session, Session},
};
use tracing as log;

use crate::{Error, Service};

/// [`Session`] of the caller performing the current HTTP request.
///
/// [`None`] if no `Authorization: Bearer <token>` header is provided, or the
/// provided token doesn't resolve to a [`Session`].
#[derive(Clone, Copy, Debug)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    /// Returns ID of the caller, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<user::Id> {
        self.0.map(|s| s.user_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        let bearer = match parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(e) => {
                if !e.is_missing() {
                    log::debug!("ignoring malformed `Authorization`: {e}");
                }
                return Ok(Self(None));
            }
        };

        #[expect(unsafe_code, reason = "specified in correct header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        let session = service
            .execute(command::AuthorizeSession { token })
            .await
            .inspect_err(|e| log::debug!("ignoring invalid session: {e}"))
            .ok();

        Ok(Self(session))
    }
}
