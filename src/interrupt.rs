use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;

/// Source of user interrupts (Ctrl+C).
///
/// Cloning shares the same source. Subscribers only see interrupts raised
/// after they subscribed, the same way a freshly installed signal handler
/// does not observe signals delivered before it existed.
#[derive(Clone)]
pub struct Interrupts {
    count: Arc<watch::Sender<u64>>,
}

impl Interrupts {
    /// A source that only fires when [`Interrupts::trigger`] is called.
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            count: Arc::new(count),
        }
    }

    /// A source fed by the process's SIGINT / Ctrl+C.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_os() -> Self {
        let interrupts = Self::new();
        let forward = interrupts.clone();
        tokio::spawn(async move {
            loop {
                if let Err(err) = signal::ctrl_c().await {
                    tracing::warn!("Interrupt listener failed: {}", err);
                    return;
                }
                tracing::debug!("Interrupt received");
                forward.trigger();
            }
        });
        interrupts
    }

    pub fn trigger(&self) {
        self.count.send_modify(|count| *count += 1);
    }

    pub fn subscribe(&self) -> InterruptWatch {
        InterruptWatch {
            receiver: self.count.subscribe(),
        }
    }
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscription to an [`Interrupts`] source.
pub struct InterruptWatch {
    receiver: watch::Receiver<u64>,
}

impl InterruptWatch {
    /// Wait for the next interrupt. Never resolves if the source is gone.
    pub async fn recv(&mut self) {
        if self.receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
