use super::error::*;
use super::handler;
use crate::application_impl::AuthenticationGate;
use crate::domain_model::*;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const BODY_LIMIT: u64 = 16 * 1024;

/// Every route mounted under `/api/v1`, with rejections turned into the JSON envelope.
pub fn api(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(server))
        .recover(recover_error)
}

/// Routes below `api/v1`. The caller mounts them under that prefix.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let log_in = warp::path!("auth" / "log-in")
        .and(warp::post())
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::log_in);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    // The default allow-list lets logout through unauthenticated. When an operator
    // narrows the allow-list, the gate fills the context and logout clears it.
    let log_out = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(authorization())
        .and(with_context(server.gate.clone()))
        .and(with(server.revocation_handler.clone()))
        .and_then(handler::log_out);

    let me = warp::path!("me")
        .and(warp::get())
        .and(with_identity(server.gate.clone()))
        .and_then(handler::me);

    let clear_credentials = warp::path!("admin" / "credentials")
        .and(warp::delete())
        .and(with_identity(server.gate.clone()))
        .and(with(server.credential_store.clone()))
        .and_then(handler::clear_credentials);

    log_in
        .or(refresh)
        .or(log_out)
        .or(me)
        .or(clear_credentials)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn authorization() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str())
}

/// Fresh per-request context, populated by the gate. Never rejects.
fn with_context(
    gate: Arc<AuthenticationGate>,
) -> impl Filter<Extract = (RequestContext,), Error = warp::Rejection> + Clone {
    warp::path::full()
        .and(authorization())
        .and_then(move |path: warp::path::FullPath, header: Option<String>| {
            let gate = gate.clone();
            async move {
                let mut ctx = RequestContext::new();
                gate.authenticate(path.as_str(), header.as_deref(), &mut ctx)
                    .await;
                Ok::<_, warp::Rejection>(ctx)
            }
        })
}

/// Rejects with `UNAUTHORIZED` when the gate left the request anonymous.
fn with_identity(
    gate: Arc<AuthenticationGate>,
) -> impl Filter<Extract = (Identity,), Error = warp::Rejection> + Clone {
    with_context(gate).and_then(|ctx: RequestContext| async move {
        ctx.identity()
            .cloned()
            .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))
    })
}
