use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use tracing::debug;
use tracing::warn;

/// A trait implemented by errors that translate to HTTP status codes.
pub trait IsHttpError: std::error::Error + Sized {
    fn status_code(&self) -> StatusCode;
}

/// A wrapper to translate errors into http [Response]s.
///
/// The body of the response is the [Display](std::fmt::Display) of the error.
#[derive(thiserror::Error, Debug, Clone)]
#[error(transparent)]
pub struct HttpError<E>(#[from] E);

impl<E: IsHttpError> IntoResponse for HttpError<E> {
    fn into_response(self) -> Response {
        let status_code = self.0.status_code();
        let message = self.to_string();
        if status_code.is_server_error() {
            warn!("{status_code}: {message}");
        } else {
            debug!("{status_code}: {message}");
        }
        (status_code, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse as _;

    use super::HttpError;
    use super::IsHttpError;

    #[derive(thiserror::Error, Debug)]
    #[error("Nothing to see here")]
    struct NotFound;

    impl IsHttpError for NotFound {
        fn status_code(&self) -> StatusCode {
            StatusCode::NOT_FOUND
        }
    }

    #[test]
    fn status_code() {
        let response = HttpError::from(NotFound).into_response();
        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }

    #[test]
    fn transparent() {
        assert_eq!("Nothing to see here", HttpError::from(NotFound).to_string());
    }
}
