use std::sync::Arc;
use std::time::Duration;

use inventory::Inventory;
use tokio::sync::watch;
use tokio::time::sleep;

/// Runs the periodic reconciliation loop until `cancel` is signalled.
/// Cooperative: the loop checks for cancellation between passes and on
/// its sleep boundary (§5). A panic-free pass is not guaranteed by the
/// type system, so any error bubbling out of a pass is logged and
/// swallowed rather than ending the loop (§4.4).
pub async fn run(inventory: Arc<Inventory>, interval: Duration, mut cancel: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    tracing::info!("reconciler cancelled");
                    return;
                }
            }
            _ = sleep(interval) => {
                inventory.reconcile_pass().await;
            }
        }

        if *cancel.borrow() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn stops_promptly_on_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("devices.yaml");
        fs::write(&catalog_path, "acme:\n  foo:\n    \"1.0\": []\n").unwrap();
        let credentials_path = dir.path().join("credentials.yaml");
        fs::write(&credentials_path, "default:\n  username: admin\n  password: x\n").unwrap();

        let inv = Arc::new(
            Inventory::load(catalog_path.to_str().unwrap(), credentials_path.to_str().unwrap())
                .await
                .unwrap(),
        );
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run(inv, Duration::from_secs(60), rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reconciler should stop promptly after cancellation")
            .unwrap();
    }
}
