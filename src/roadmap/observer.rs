use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Receives progress reports and mesh lifecycle events.
///
/// `started` and `finished` mark the first and the last report of a stage;
/// `fraction` covers the whole pipeline and never decreases within one run.
/// Returning `false` from [`progress`](Self::progress) cancels the calculation.
pub trait PipelineObserver: Send {
    fn progress(&mut self, started: bool, finished: bool, fraction: f64, message: &str) -> bool {
        let _ = (started, finished, fraction, message);
        true
    }

    /// The roadmap no longer matches the instrument.
    fn mesh_invalidated(&mut self) {}

    /// A new roadmap is available for path queries.
    fn mesh_ready(&mut self) {}
}

/// Cooperative cancellation flag shared between a calculation and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Observer notifications as channel messages.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshEvent {
    Progress {
        started: bool,
        finished: bool,
        fraction: f64,
        message: String,
    },
    MeshInvalidated,
    MeshReady,
}

/// Forwards all notifications into an `mpsc` channel.
///
/// A dropped receiver does not cancel the calculation.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::Sender<MeshEvent>,
}

impl ChannelObserver {
    #[must_use]
    pub fn new(sender: mpsc::Sender<MeshEvent>) -> Self {
        Self { sender }
    }

    /// Creates an observer together with the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<MeshEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl PipelineObserver for ChannelObserver {
    fn progress(&mut self, started: bool, finished: bool, fraction: f64, message: &str) -> bool {
        let _ = self.sender.send(MeshEvent::Progress {
            started,
            finished,
            fraction,
            message: message.to_owned(),
        });
        true
    }

    fn mesh_invalidated(&mut self) {
        let _ = self.sender.send(MeshEvent::MeshInvalidated);
    }

    fn mesh_ready(&mut self) {
        let _ = self.sender.send(MeshEvent::MeshReady);
    }
}

/// Logs pipeline progress through `tracing` in steps of `step` percent.
#[derive(Debug, Clone)]
pub struct BuildProgress {
    step: u32,
    last: Option<u32>,
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self { step: 10, last: None }
    }
}

impl BuildProgress {
    #[must_use]
    pub fn new(step: u32) -> Self {
        Self {
            step: step.max(1),
            last: None,
        }
    }
}

impl PipelineObserver for BuildProgress {
    fn progress(&mut self, started: bool, finished: bool, fraction: f64, message: &str) -> bool {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
        let bucket = percent / self.step;
        if started || finished || self.last != Some(bucket) {
            tracing::info!(percent, "{message}");
            self.last = Some(bucket);
        }
        true
    }

    fn mesh_invalidated(&mut self) {
        self.last = None;
        tracing::info!("path mesh invalidated");
    }

    fn mesh_ready(&mut self) {
        tracing::info!("path mesh ready");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!other.is_cancelled());
    }

    #[test]
    fn channel_observer_forwards_events() {
        let (mut observer, rx) = ChannelObserver::channel();
        assert!(observer.progress(true, false, 0.0, "start"));
        observer.mesh_ready();
        let events: Vec<MeshEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], MeshEvent::MeshReady);
        drop(rx);
        assert!(observer.progress(false, true, 1.0, "done"));
    }

    #[test]
    fn build_progress_never_cancels() {
        let mut progress = BuildProgress::new(25);
        assert!((0..=20).all(|i| progress.progress(i == 0, i == 20, f64::from(i) / 20.0, "grid")));
    }
}
