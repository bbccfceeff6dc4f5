//! Fixed spacing between consecutive ledger requests.

use std::time::Duration;
use tokio::time::{Instant, sleep};

pub struct Pacer {
    delay: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    /// Wait until at least `delay` has passed since the previous call.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
