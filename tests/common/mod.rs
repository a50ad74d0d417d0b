#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::Arc;
use tollgate::application_impl::{JwtConfig, JwtHs256Codec};
use tollgate::application_port::*;
use tollgate::domain_model::SessionId;
use tollgate::server::Server;
use tollgate::settings::settings_from_toml;
use warp::Filter;
use warp::http::StatusCode;

pub const SIGNING_KEY: &str = "integration-test-signing-key";
pub const ISSUER: &str = "tollgate.test";

pub const OWNER: (&str, &str) = ("01000000000", "owner-pw");
pub const STAFF: (&str, &str) = ("01011112222", "staff-pw");

/// Memory-backed settings. `access_ttl_secs = 0` makes every access token
/// expire on issue.
pub fn settings_toml(access_ttl_secs: u64, rotation: &str) -> String {
    format!(
        r#"
[auth]
issuer = "{ISSUER}"
access_ttl_secs = {access_ttl_secs}
refresh_ttl_secs = 3600
signing_key = "{SIGNING_KEY}"
refresh_rotation = "{rotation}"

[credential_store]
backend = "memory"
ttl = "durable"

[principal]
backend = "memory"

[[principal.seed]]
subject = "{}"
secret = "{}"
authorities = ["OWNER", "ADMIN"]

[[principal.seed]]
subject = "{}"
secret = "{}"
authorities = ["STAFF"]

[http]
address = "127.0.0.1:0"

[log]
filter = "debug"
"#,
        OWNER.0, OWNER.1, STAFF.0, STAFF.1
    )
}

pub async fn server(access_ttl_secs: u64, rotation: &str) -> Arc<Server> {
    let settings = settings_from_toml(&settings_toml(access_ttl_secs, rotation))
        .expect("test settings");
    Arc::new(Server::try_new(&settings).await.expect("memory server"))
}

/// Memory-backed server whose gate only skips the listed paths.
pub async fn server_with_allow_list(allow_list: &[&str]) -> Arc<Server> {
    let patterns: Vec<String> = allow_list.iter().map(|p| format!("\"{p}\"")).collect();
    let source = format!(
        "{}\n[gate]\nallow_list = [{}]\n",
        settings_toml(1800, "retain"),
        patterns.join(", ")
    );
    let settings = settings_from_toml(&source).expect("test settings");
    Arc::new(Server::try_new(&settings).await.expect("memory server"))
}

pub fn app(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    tollgate::api::v1::api(server)
}

pub fn codec() -> JwtHs256Codec {
    JwtHs256Codec::new(JwtConfig {
        issuer: ISSUER.to_string(),
        signing_key: SIGNING_KEY.as_bytes().to_vec(),
    })
}

pub fn session_of(token: &str) -> SessionId {
    codec().session_id_of(token).expect("session id claim")
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }

    pub fn access_token(&self) -> String {
        self.body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    pub fn refresh_token(&self) -> String {
        self.body["data"]["refreshToken"].as_str().unwrap().to_string()
    }
}

pub async fn send<F>(app: &F, request: warp::test::RequestBuilder) -> Reply
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let response = request.reply(app).await;
    let status = response.status();
    let body = if response.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(response.body()).expect("json body")
    };
    Reply { status, body }
}

pub async fn log_in<F>(app: &F, (subject, secret): (&str, &str)) -> Reply
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    send(
        app,
        warp::test::request()
            .method("POST")
            .path("/api/v1/auth/log-in")
            .json(&json!({ "subject": subject, "secret": secret })),
    )
    .await
}

pub async fn refresh<F>(app: &F, refresh_token: &str) -> Reply
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    send(
        app,
        warp::test::request()
            .method("POST")
            .path("/api/v1/auth/refresh")
            .json(&json!({ "refreshToken": refresh_token })),
    )
    .await
}

pub async fn log_out<F>(app: &F, access_token: Option<&str>) -> Reply
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let mut request = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/logout");
    if let Some(token) = access_token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    send(app, request).await
}

pub async fn me<F>(app: &F, access_token: &str) -> Reply
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    send(
        app,
        warp::test::request()
            .method("GET")
            .path("/api/v1/me")
            .header("authorization", format!("Bearer {access_token}")),
    )
    .await
}
