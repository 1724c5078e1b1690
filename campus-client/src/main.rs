//! campus-watch: keep an institution's user list warm and log changes.

use campus_client::{rest_service, ClientConfig, ClientError, UserRecord};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::load()?;
    campus_client::telemetry::init_tracing(config.log_json)?;

    let key = config.collection_key()?;
    let service = rest_service::<UserRecord>(&config)?;
    let mut changes = service.changes();

    match service.list(&key).await {
        Ok(read) => tracing::info!(
            institution = %key,
            users = read.len(),
            version = read.version(),
            "Initial user list loaded"
        ),
        Err(err) => {
            tracing::error!(institution = %key, error = %err, "Initial load failed");
            return Err(err.into());
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
            event = changes.recv() => match event {
                Ok(change) => {
                    let active = change.collection.iter().filter(|u| u.active).count();
                    tracing::info!(
                        institution = %change.key,
                        version = change.version,
                        users = change.collection.len(),
                        active,
                        "User list changed"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    let stats = service.cache().stats();
    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        changes = stats.changes_detected,
        "Cache statistics"
    );
    service.cache().dispose();
    Ok(())
}
