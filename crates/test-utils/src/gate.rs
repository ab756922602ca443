use std::sync::Arc;
use tokio::sync::{Semaphore, watch};

/// Holds mock calls back until the test lets them through.
///
/// Every call to [`Gate::pass`] is counted on entry, so a test can wait for an operation to be
/// parked at a known point before acting.
#[derive(Clone, Debug)]
pub struct Gate {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    permits: Semaphore,
    entered: watch::Sender<usize>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    /// A closed gate.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner { permits: Semaphore::new(0), entered: watch::Sender::new(0) }),
        }
    }

    /// Blocks until the gate lets one caller through.
    pub async fn pass(&self) {
        self.inner.entered.send_modify(|entered| *entered += 1);
        self.inner.permits.acquire().await.expect("gate closed").forget();
    }

    /// Lets `n` waiting or future callers through.
    pub fn open(&self, n: usize) {
        self.inner.permits.add_permits(n);
    }

    /// Waits until at least `n` callers reached the gate.
    pub async fn entered(&self, n: usize) {
        let mut rx = self.inner.entered.subscribe();
        rx.wait_for(|entered| *entered >= n).await.expect("gate dropped");
    }

    /// Number of callers that reached the gate so far.
    pub fn entered_count(&self) -> usize {
        *self.inner.entered.borrow()
    }
}
