use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::spawn_prune_scheduler;
use crate::settings::Settings;
use anyhow::{Context, anyhow};
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub gate: Arc<AuthenticationGate>,
    pub revocation_handler: Arc<RevocationHandler>,
    pub credential_store: Arc<dyn CredentialStore>,
    prune_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let cancel = CancellationToken::new();

        let needs_mysql = settings.credential_store.backend == "mysql"
            || settings.principal.backend == "mysql";
        let pool = if needs_mysql {
            let mysql = settings
                .mysql
                .as_ref()
                .ok_or_else(|| anyhow!("[mysql] section is required by the mysql backend"))?;
            Some(
                Pool::<MySql>::connect(&mysql.dsn)
                    .await
                    .context("connecting to mysql")?,
            )
        } else {
            None
        };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2CredentialHasher);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            signing_key: settings.auth.signing_key.clone().into_bytes(),
        }));
        let credential_issuer = Arc::new(CredentialIssuer::new(
            token_codec.clone(),
            Arc::new(UuidSessionIdGenerator),
            settings.auth.access_ttl(),
            settings.auth.refresh_ttl(),
        ));

        let mut prune_handle = None;
        let credential_store: Arc<dyn CredentialStore> =
            match settings.credential_store.backend.as_str() {
                "mysql" => {
                    let pool = pool.clone().ok_or_else(|| anyhow!("mysql pool missing"))?;
                    let store = Arc::new(MySqlCredentialStore::new(pool));
                    if let Some(secs) = settings.credential_store.prune_interval_secs {
                        prune_handle = Some(spawn_prune_scheduler(
                            store.clone(),
                            Duration::from_secs(secs.max(1)),
                            cancel.clone(),
                        ));
                    }
                    store
                }
                "redis" => {
                    let redis = settings
                        .redis
                        .as_ref()
                        .ok_or_else(|| anyhow!("[redis] section is required by the redis backend"))?;
                    let client = redis::Client::open(redis.dsn.as_str())?;
                    let manager = client
                        .get_connection_manager()
                        .await
                        .context("connecting to redis")?;
                    Arc::new(RedisCredentialStore::new(
                        manager,
                        redis.prefix.clone(),
                        settings.auth.refresh_ttl(),
                    ))
                }
                "memory" => match settings.credential_store.ttl.as_str() {
                    "durable" => Arc::new(InMemoryCredentialStore::durable()),
                    "refresh" => Arc::new(InMemoryCredentialStore::ephemeral(
                        settings.auth.refresh_ttl(),
                    )),
                    other => return Err(anyhow!("Unknown memory store ttl: {}", other)),
                },
                other => return Err(anyhow!("Unknown credential store backend: {}", other)),
            };

        let principal_repo: Arc<dyn PrincipalRepo> = match settings.principal.backend.as_str() {
            "mysql" => {
                let pool = pool.clone().ok_or_else(|| anyhow!("mysql pool missing"))?;
                Arc::new(MySqlPrincipalRepo::new(pool))
            }
            "memory" => {
                let repo = InMemoryPrincipalRepo::new();
                for seed in &settings.principal.seed {
                    repo.insert(Principal {
                        subject: seed.subject.clone(),
                        secret_hash: credential_hasher.hash_password(&seed.secret).await?,
                        authorities: seed.authorities.iter().cloned().map(Authority).collect(),
                        active: true,
                    });
                }
                debug!(count = settings.principal.seed.len(), "seeded principals");
                Arc::new(repo)
            }
            other => return Err(anyhow!("Unknown principal backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            principal_repo.clone(),
            credential_hasher,
            token_codec.clone(),
            credential_issuer,
            credential_store.clone(),
            settings.auth.refresh_rotation,
        ));

        let gate = Arc::new(AuthenticationGate::new(
            token_codec.clone(),
            credential_store.clone(),
            principal_repo,
            &settings.gate.allow_list,
        ));
        let revocation_handler = Arc::new(RevocationHandler::new(
            token_codec,
            credential_store.clone(),
        ));

        info!(
            credential_store = %settings.credential_store.backend,
            principal = %settings.principal.backend,
            rotation = ?settings.auth.refresh_rotation,
            "server started"
        );

        Ok(Self {
            auth_service,
            gate,
            revocation_handler,
            credential_store,
            prune_handle: Mutex::new(prune_handle),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.prune_handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("prune handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
