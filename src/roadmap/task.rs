//! Mesh calculation on a background thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{PipelineError, Result};

use super::builder::{PathsBuilder, PipelineStatus};
use super::instrument::Instrument;
use super::observer::CancellationToken;

/// A running [`PathsBuilder::calculate_mesh`].
///
/// The builder moves onto the worker thread together with its configuration
/// and observer, and is handed back by [`join`](Self::join).
#[derive(Debug)]
pub struct MeshTask {
    cancel: CancellationToken,
    handle: JoinHandle<(PathsBuilder, PipelineStatus)>,
}

impl MeshTask {
    /// Starts the full pipeline for `instrument` on a new thread.
    pub fn spawn<I>(mut builder: PathsBuilder, instrument: Arc<I>) -> Self
    where
        I: Instrument + Send + 'static + ?Sized,
    {
        let cancel = builder.cancellation_token();
        let handle = thread::spawn(move || {
            let status = builder.calculate_mesh(instrument.as_ref());
            match &status {
                PipelineStatus::Ready => tracing::info!("background mesh calculation finished"),
                PipelineStatus::Aborted => tracing::info!("background mesh calculation aborted"),
                PipelineStatus::Failed(e) => {
                    tracing::error!(error = %e, "background mesh calculation failed");
                }
            }
            (builder, status)
        });
        Self { cancel, handle }
    }

    /// Asks the pipeline to stop at its next progress report.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the pipeline and returns the builder with its outcome.
    ///
    /// A cancellation requested after the pipeline finished is discarded, so
    /// the returned builder can run again right away.
    ///
    /// # Errors
    ///
    /// `PipelineError::TaskPanicked` if the worker thread panicked; the
    /// builder is lost in that case.
    pub fn join(self) -> Result<(PathsBuilder, PipelineStatus)> {
        let outcome = self
            .handle
            .join()
            .map_err(|_| PipelineError::TaskPanicked)?;
        if self.cancel.is_cancelled() {
            tracing::debug!("discarding cancellation of a finished mesh task");
            self.cancel.reset();
        }
        Ok(outcome)
    }
}
