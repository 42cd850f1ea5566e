//! Cool-down between writes.

use std::future::Future;
use std::time::Duration;

/// Wait applied after every successful write.
pub const WRITE_COOLDOWN: Duration = Duration::from_secs(1);

/// Something that can wait for a duration.
pub trait Pause {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real wall-clock wait on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately. Used for dry runs, where nothing is sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl Pause for NoPause {
    async fn pause(&self, _duration: Duration) {}
}
