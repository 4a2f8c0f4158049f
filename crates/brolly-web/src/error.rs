//! Failed requests rendered as HTML pages.

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use brolly_core::{
    AppError, AuthError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
};
use brolly_postcodes::{LookupError, StoreError};

use crate::templates;

/// Handler result alias.
pub type PageResult<T> = Result<T, PageError>;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The lookup service does not recognise the postcode
    #[error("Invalid postcode: {0}")]
    InvalidPostcode(String),

    #[error("Sign-in failed: {0}")]
    SignInFailed(String),

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] AppError),
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPostcode(_) | Self::SignInFailed(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let html = match self {
            Self::InvalidPostcode(_) => templates::general_error(
                templates::POSTCODE_ERROR_TITLE,
                templates::POSTCODE_ERROR_DETAIL,
            ),
            Self::SignInFailed(_) => templates::general_error(
                templates::SIGN_IN_ERROR_TITLE,
                "We couldn't sign you in with Google, please try again...",
            ),
            Self::NotFound => templates::status_error(404, "That page doesn't exist."),
            Self::Upstream(err) => {
                tracing::error!(error = %err, "Request failed");
                templates::status_error(500, err.user_message())
            }
        };

        HttpResponse::build(self.status_code())
            .content_type(ContentType::html())
            .body(html)
    }
}

impl From<LookupError> for PageError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Network(e) => AppError::Network(e.into_network_error()).into(),
            LookupError::Parse(message) => AppError::Postcode(message).into(),
        }
    }
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ValidationFailure(postcode) => Self::InvalidPostcode(postcode),
            StoreError::Lookup(e) => e.into(),
            StoreError::Database(e) => AppError::Database(e.into_database_error()).into(),
            corrupt @ StoreError::Corrupt { .. } => {
                AppError::Database(DatabaseError::Corruption(corrupt.to_string())).into()
            }
            StoreError::Io(e) => AppError::Io(e).into(),
            StoreError::Task(e) => AppError::Other(anyhow::Error::new(e)).into(),
        }
    }
}

impl From<brolly_weather::WeatherError> for PageError {
    fn from(err: brolly_weather::WeatherError) -> Self {
        use brolly_core::WeatherError as Core;
        use brolly_weather::WeatherError as Provider;

        let app = match err {
            Provider::Network(e) => AppError::Network(e.into_network_error()),
            Provider::InvalidApiKey => AppError::Weather(Core::InvalidApiKey),
            Provider::Api { status: 404, message } => {
                AppError::Weather(Core::LocationNotFound(message))
            }
            Provider::Api {
                status: 502..=504,
                ..
            } => AppError::Weather(Core::ServiceUnavailable),
            Provider::Api { status, message } => {
                AppError::Weather(Core::ApiError(format!("{status}: {message}")))
            }
            Provider::Parse(message) => AppError::Network(NetworkError::InvalidResponse(message)),
        };
        app.into()
    }
}

impl From<actix_session::SessionInsertError> for PageError {
    fn from(err: actix_session::SessionInsertError) -> Self {
        AppError::Auth(AuthError::Session(err.to_string())).into()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use actix_web::body::MessageBody;

    fn body_text(err: &PageError) -> String {
        let bytes = err.error_response().into_body().try_into_bytes().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PageError::InvalidPostcode("X".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PageError::SignInFailed("state".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PageError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PageError::Upstream(AppError::Postcode("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_failure_becomes_invalid_postcode() {
        let err: PageError = StoreError::ValidationFailure("NOTAPOSTCODE".into()).into();
        assert!(matches!(err, PageError::InvalidPostcode(ref p) if p == "NOTAPOSTCODE"));
        assert!(body_text(&err).contains("Postcode error!"));
    }

    #[test]
    fn test_upstream_page_hides_details() {
        let err: PageError = LookupError::Parse("secret internals".into()).into();
        let body = body_text(&err);
        assert!(body.contains("<h1>500</h1>"));
        assert!(body.contains("postcode service is unavailable"));
        assert!(!body.contains("secret internals"));
    }

    #[test]
    fn test_weather_error_mapping() {
        let err: PageError = brolly_weather::WeatherError::InvalidApiKey.into();
        assert!(matches!(
            err,
            PageError::Upstream(AppError::Weather(brolly_core::WeatherError::InvalidApiKey))
        ));

        let err: PageError = brolly_weather::WeatherError::Api {
            status: 503,
            message: "busy".into(),
        }
        .into();
        assert!(matches!(
            err,
            PageError::Upstream(AppError::Weather(
                brolly_core::WeatherError::ServiceUnavailable
            ))
        ));
    }

    #[test]
    fn test_not_found_page() {
        let body = body_text(&PageError::NotFound);
        assert!(body.contains("<h1>404</h1>"));
    }
}
