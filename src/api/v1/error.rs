use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType};
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (*code, code.to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (ApiErrorCode::InvalidInput, format!("Invalid request body: {}", e))
    } else if err.find::<UnsupportedMediaType>().is_some()
        || err.find::<PayloadTooLarge>().is_some()
        || err.find::<LengthRequired>().is_some()
    {
        (ApiErrorCode::InvalidInput, "Invalid request body".to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        let code = ApiErrorCode::MethodNotAllowed;
        let message = code.to_string();
        (code, message)
    } else if err.is_not_found() {
        let code = ApiErrorCode::NotFound;
        let message = code.to_string();
        (code, message)
    } else {
        error!("unhandled rejection: {:?}", err);
        let code = ApiErrorCode::InternalError;
        let message = code.to_string();
        (code, message)
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    #[error("Request is missing a field or carries an invalid value")]
    InvalidInput,
    #[error("Invalid subject or secret")]
    BadCredentials,
    #[error("Token is missing a required claim")]
    EmptyClaim,
    #[error("Token is malformed")]
    MalformedToken,
    #[error("Access token is invalid")]
    InvalidAccessToken,
    #[error("Principal not found")]
    PrincipalNotFound,
    #[error("No credential exists for this session")]
    CredentialNotFound,
    #[error("Refresh token does not match the session")]
    TokenMismatch,
    #[error("Refresh token is invalid or expired")]
    InvalidRefreshToken,
    #[error("Access token has not expired yet; the session was revoked")]
    InvalidTokenReissueRequest,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Not allowed")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        error!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ApiErrorCode::BadCredentials
            | ApiErrorCode::EmptyClaim
            | ApiErrorCode::MalformedToken
            | ApiErrorCode::InvalidAccessToken
            | ApiErrorCode::TokenMismatch
            | ApiErrorCode::InvalidRefreshToken
            | ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::PrincipalNotFound
            | ApiErrorCode::CredentialNotFound
            | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidTokenReissueRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::BadCredentials => ApiErrorCode::BadCredentials,
            AuthError::InvalidInput(reason) => {
                warn!(%reason, "rejected request");
                ApiErrorCode::InvalidInput
            }
            AuthError::EmptyClaim => ApiErrorCode::EmptyClaim,
            AuthError::MalformedToken => ApiErrorCode::MalformedToken,
            AuthError::InvalidAccessToken => ApiErrorCode::InvalidAccessToken,
            AuthError::PrincipalNotFound => ApiErrorCode::PrincipalNotFound,
            AuthError::CredentialNotFound => ApiErrorCode::CredentialNotFound,
            AuthError::TokenMismatch => ApiErrorCode::TokenMismatch,
            AuthError::InvalidRefreshToken => ApiErrorCode::InvalidRefreshToken,
            AuthError::InvalidTokenReissueRequest => ApiErrorCode::InvalidTokenReissueRequest,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
