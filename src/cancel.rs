// ABOUTME: Shared one-shot cancellation primitive for polling loops.
// ABOUTME: A CancelHandle fires exactly once; CancelTokens observe it via select.

use tokio::sync::watch;

/// Sender half: held by the supervising task (normally the Ctrl-C listener).
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Receiver half: cloned into every polling loop and network call site.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    /// Request cancellation. Idempotent: later calls are no-ops.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation has been requested.
    ///
    /// If the handle is dropped without ever cancelling, this pends forever so
    /// that select loops fall through to their other branches.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
