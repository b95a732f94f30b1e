//! Cooperative shutdown.
//!
//! The first SIGINT / SIGTERM cancels a [`CancellationToken`]; the engine
//! observes it at its next suspension point and reports partial statistics.
//! A second signal force-exits without waiting.

use tokio_util::sync::CancellationToken;

pub(crate) fn install() -> CancellationToken {
    let token = CancellationToken::new();
    let handler = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        let mut sigterm = {
            use tokio::signal::unix::{signal, SignalKind};
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler")
        };

        let mut signals_seen = 0u32;
        loop {
            #[cfg(unix)]
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }

            #[cfg(not(unix))]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("failed to listen for Ctrl+C");
            }

            signals_seen += 1;
            if signals_seen == 1 {
                tracing::info!("interrupt received, stopping after the current item (press again to force exit)");
                handler.cancel();
            } else {
                tracing::warn!("second interrupt, exiting immediately");
                std::process::exit(130);
            }
        }
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_install_returns_live_token() {
        // Signal delivery itself can't be exercised safely in a shared test
        // binary; verify the token starts uncancelled.
        let token = install();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_child_tokens_follow_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
