//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{
    authorization::Denial,
    command::{delete_property, send_message, update_property},
    infra::database,
};
use tracerr::{Trace, Traced};

use crate::api::ApiError;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// HTTP API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Replaces the message of this [`Error`] with the provided one.
    #[must_use]
    pub fn with_message(mut self, msg: &impl ToString) -> Self {
        self.message = msg.to_string();
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

/// Body of an [`Error`] response.
#[derive(Debug, Serialize)]
struct Body<'a> {
    /// Machine-readable [`Code`].
    code: Code,

    /// Human-readable message.
    message: &'a str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            tracing::error!("{self}");
        }
        (
            self.status_code,
            Json(Body {
                code: self.code,
                message: &self.message,
            }),
        )
            .into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(
            Error::from(ApiError::MalformedPayload)
                .with_message(&self.body_text()),
        )
    }
}

impl AsError for Denial {
    fn try_as_error(&self) -> Option<Error> {
        Some(
            match self {
                Self::Unauthenticated => ApiError::Unauthenticated,
                Self::NotFound => ApiError::PropertyNotFound,
                Self::Forbidden { .. } => ApiError::Forbidden,
            }
            .into(),
        )
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(ApiError::StoreUnavailable.into())
    }
}

impl AsError for update_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Denied(e) => e.try_as_error(),
            Self::Malformed(e) => Some(
                Error::from(ApiError::MalformedPayload).with_message(e),
            ),
            Self::Upload(_) => Some(ApiError::UploadFailed.into()),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for delete_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Denied(e) => e.try_as_error(),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for send_message::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Notifier(_) => ApiError::NotificationFailed.into(),
            Self::NoAddress => Error::from(ApiError::MalformedPayload)
                .with_message(&self),
        })
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use service::{
        authorization::Denial,
        command::{delete_property, send_message, update_property},
        domain::{property, user},
        infra::{database, storage},
    };

    use super::{AsError, Error};

    fn status_and_code(err: &impl AsError) -> (u16, &'static str) {
        let err = err.try_as_error().unwrap();
        (err.status_code.as_u16(), err.code)
    }

    #[test]
    fn maps_denials() {
        assert_eq!(
            status_and_code(&Denial::Unauthenticated),
            (401, "UNAUTHENTICATED"),
        );
        assert_eq!(
            status_and_code(&Denial::Forbidden {
                property_id: property::Id::new(),
                user_id: user::Id::new(),
            }),
            (401, "FORBIDDEN"),
        );
        assert_eq!(
            status_and_code(&Denial::NotFound),
            (404, "PROPERTY_NOT_FOUND"),
        );
    }

    #[test]
    fn maps_update_failures() {
        use update_property::ExecutionError as E;

        assert_eq!(
            status_and_code(&E::Denied(Denial::NotFound)),
            (404, "PROPERTY_NOT_FOUND"),
        );
        assert_eq!(
            status_and_code(&E::Malformed(
                update_property::MalformedPayload::Unreadable("boom".into()),
            )),
            (500, "MALFORMED_PAYLOAD"),
        );
        assert_eq!(
            status_and_code(&E::Upload(storage::Error::Timeout)),
            (500, "UPLOAD_FAILED"),
        );
        assert_eq!(
            status_and_code(&E::Db(database::Error::Timeout)),
            (500, "STORE_UNAVAILABLE"),
        );
    }

    #[test]
    fn reports_store_coercion_failure_as_malformed_payload() {
        let err = update_property::ExecutionError::Malformed(
            update_property::MalformedPayload::NotANumber {
                field: "beds",
                error: property::Number::coerce("two").unwrap_err(),
            },
        )
        .try_as_error()
        .unwrap();

        assert_eq!(err.code, "MALFORMED_PAYLOAD");
        assert_eq!(err.status_code.as_u16(), 500);
        assert!(
            err.message.contains("cannot be stored as a number"),
            "{}",
            err.message,
        );
    }

    #[test]
    fn maps_delete_and_message_failures() {
        assert_eq!(
            status_and_code(&delete_property::ExecutionError::Denied(
                Denial::Unauthenticated,
            )),
            (401, "UNAUTHENTICATED"),
        );
        assert_eq!(
            status_and_code(&send_message::ExecutionError::NoAddress),
            (500, "MALFORMED_PAYLOAD"),
        );
    }

    #[test]
    fn keeps_trace_of_traced_errors() {
        let err = tracerr::new!(Denial::NotFound).as_error();

        assert_eq!(err.code, "PROPERTY_NOT_FOUND");
        assert!(err.backtrace.is_some());
    }

    #[test]
    fn falls_back_to_internal_error() {
        let err = Error::internal(&"boom");

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(err.into_response().status(), 500);
    }
}
