use crate::application_impl::RefreshRotation;
use anyhow::{Result, anyhow};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub credential_store: CredentialStore,
    pub principal: Principal,
    #[serde(default)]
    pub gate: Gate,
    pub http: Http,
    pub log: Log,
    #[serde(default)]
    pub mysql: Option<MySql>,
    #[serde(default)]
    pub redis: Option<Redis>,
}

#[derive(Deserialize)]
pub struct Auth {
    pub issuer: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub signing_key: String,
    #[serde(default)]
    pub refresh_rotation: RefreshRotation,
}

impl Auth {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("signing_key", &"<redacted>")
            .field("refresh_rotation", &self.refresh_rotation)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialStore {
    pub backend: String, // "mysql", "redis" or "memory"
    /// Memory backend only: "durable" or "refresh" (expire after the refresh TTL).
    #[serde(default = "default_memory_ttl")]
    pub ttl: String,
    /// MySQL backend only.
    #[serde(default)]
    pub prune_interval_secs: Option<u64>,
}

fn default_memory_ttl() -> String {
    "durable".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Principal {
    pub backend: String, // "mysql" or "memory"
    #[serde(default)]
    pub seed: Vec<PrincipalSeed>,
}

#[derive(Deserialize)]
pub struct PrincipalSeed {
    pub subject: String,
    pub secret: String,
    #[serde(default)]
    pub authorities: Vec<String>,
}

impl fmt::Debug for PrincipalSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrincipalSeed")
            .field("subject", &self.subject)
            .field("authorities", &self.authorities)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct Gate {
    pub allow_list: Vec<String>,
}

impl Default for Gate {
    fn default() -> Self {
        Gate {
            allow_list: vec!["/api/v1/auth/**".to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct MySql {
    pub dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub dsn: String,
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

fn default_redis_prefix() -> String {
    "auth:credential".to_string()
}

/// Ten years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl Settings {
    fn validate(&self) -> Result<()> {
        if self.auth.access_ttl_secs > MAX_TTL_SECS || self.auth.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(anyhow!("auth TTLs must not exceed {} seconds", MAX_TTL_SECS));
        }
        if self.auth.refresh_ttl_secs == 0 {
            return Err(anyhow!("auth.refresh_ttl_secs must be positive"));
        }
        if self.auth.access_ttl_secs == 0 && self.credential_store.backend != "memory" {
            return Err(anyhow!(
                "auth.access_ttl_secs may only be 0 with the memory credential store"
            ));
        }
        if self.auth.signing_key.len() < 16 {
            return Err(anyhow!("auth.signing_key must be at least 16 bytes"));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;
    settings.validate()?;
    Ok(settings)
}

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    build(
        Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("TOLLGATE")
                    .separator("__")
                    .try_parsing(true),
            ),
    )
}

/// Settings from an inline TOML document, without environment overrides.
pub fn settings_from_toml(source: &str) -> Result<Settings> {
    build(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
}
