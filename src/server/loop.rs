// Server loop module
// Accepts connections until a shutdown signal arrives

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop
///
/// Runs until `shutdown` resolves, then waits up to `grace` for in-flight
/// connections to finish.
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F, grace: Duration)
where
    F: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => break,
        }
    }

    drop(listener);
    drain(&active_connections, grace).await;
}

async fn drain(active_connections: &AtomicUsize, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;
    while active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutting down with {} connection(s) still open",
                active_connections.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
