//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for resolving the [`Session`] of a caller out of its token.
#[derive(Clone, Debug, From)]
pub struct AuthorizeSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, St, Nt> Command<AuthorizeSession> for Service<Db, St, Nt> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeSession { token } = cmd;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims)
    }
}

/// Error of [`AuthorizeSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::Command as _,
        domain::user::{self, session, Session},
        test::{self, JWT_SECRET},
    };

    use super::AuthorizeSession;

    fn sign(session: &Session, secret: &[u8]) -> session::Token {
        let raw = jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        #[expect(unsafe_code, reason = "freshly encoded")]
        let token = unsafe { session::Token::new_unchecked(raw) };
        token
    }

    #[tokio::test]
    async fn resolves_valid_token() {
        let session = Session {
            user_id: user::Id::new(),
            expires_at: session::ExpirationDateTime::now()
                + Duration::from_secs(3600),
        };

        let resolved = test::service()
            .execute(AuthorizeSession {
                token: sign(&session, JWT_SECRET),
            })
            .await
            .unwrap();

        assert_eq!(resolved.user_id, session.user_id);
        assert_eq!(
            resolved.expires_at.unix_timestamp(),
            session.expires_at.unix_timestamp(),
        );
    }

    #[tokio::test]
    async fn rejects_foreign_signature() {
        let session = Session {
            user_id: user::Id::new(),
            expires_at: session::ExpirationDateTime::now()
                + Duration::from_secs(3600),
        };

        let res = test::service()
            .execute(AuthorizeSession {
                token: sign(&session, b"another secret"),
            })
            .await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let session = Session {
            user_id: user::Id::new(),
            expires_at: session::ExpirationDateTime::now()
                - Duration::from_secs(3600),
        };

        let res = test::service()
            .execute(AuthorizeSession {
                token: sign(&session, JWT_SECRET),
            })
            .await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let res = test::service()
            .execute(AuthorizeSession {
                token: "garbage".parse().unwrap(),
            })
            .await;

        assert!(res.is_err());
    }
}
