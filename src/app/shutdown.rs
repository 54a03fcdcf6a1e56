use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Cancels `token` on Ctrl+C or SIGTERM. The listener also exits once the
/// token is cancelled by anyone else.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_signal() => token.cancel(),
            _ = token.cancelled() => {}
        }
    })
}

/// Waits for a listener from [`spawn_signal_listener`] to finish. A panic or
/// abort in the listener task is logged, never propagated.
pub async fn join_signal_listener(listener: JoinHandle<()>) {
    if let Err(e) = listener.await {
        warn!("Signal listener task failed: {}", e);
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match unix_signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!("Failed to create SIGTERM handler: {}", err);
                return ctrl_c().await;
            }
        };

        tokio::select! {
            _ = ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, cancelling the run");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

// Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT (Ctrl+C), cancelling the run"),
        Err(err) => {
            error!("Failed to listen for SIGINT: {}", err);
            std::future::pending::<()>().await
        }
    }
}
