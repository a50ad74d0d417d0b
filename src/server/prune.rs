use crate::infra_mysql::MySqlCredentialStore;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Drops stored credentials whose refresh token has lapsed.
pub async fn prune_expired_credentials(store: &MySqlCredentialStore) {
    match store.delete_expired().await {
        Ok(count) if count > 0 => info!(count, "pruned expired credentials"),
        Ok(_) => {}
        Err(e) => error!(error = %e, "failed to prune expired credentials"),
    }
}

/// Runs [`prune_expired_credentials`] every `period` until `cancel` fires.
pub fn spawn_prune_scheduler(
    store: Arc<MySqlCredentialStore>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => prune_expired_credentials(&store).await,
            }
        }
        debug!("prune scheduler stopped");
    })
}
