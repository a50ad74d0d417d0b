use super::error::*;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::CredentialStore;
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

pub const ADMIN_AUTHORITY: &str = "ADMIN";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

fn no_content() -> warp::reply::WithStatus<impl warp::Reply> {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct LogInRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub secret: String,
}

pub async fn log_in(
    body: LogInRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = validate_log_in_request(&body.subject, &body.secret)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let tokens = auth_service
        .log_in(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let presented = validate_refresh_request(&body.refresh_token)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let tokens = auth_service
        .refresh(presented)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

pub async fn log_out(
    authorization: Option<String>,
    mut ctx: RequestContext,
    revocation_handler: Arc<RevocationHandler>,
) -> Result<impl warp::Reply, warp::Rejection> {
    revocation_handler
        .log_out(authorization.as_deref(), &mut ctx)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(no_content())
}

pub async fn me(identity: Identity) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(identity)))
}

pub async fn clear_credentials(
    identity: Identity,
    credential_store: Arc<dyn CredentialStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !identity
        .authorities
        .iter()
        .any(|authority| authority.0 == ADMIN_AUTHORITY)
    {
        warn!(subject = %identity.subject, "credential wipe refused");
        return Err(reject::custom(ApiErrorCode::Forbidden));
    }

    credential_store
        .delete_all()
        .await
        .map_err(ApiErrorCode::internal)
        .map_err(reject::custom)?;
    info!(subject = %identity.subject, "all stored credentials cleared");

    Ok(no_content())
}
