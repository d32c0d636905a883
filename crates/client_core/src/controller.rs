//! Upload orchestration: validation, preview lifecycle, and the
//! classification state machine exposed to the presentation layer.

use std::sync::Arc;

use shared::domain::ClassificationResult;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{preview::PreviewHandle, Classifier, ClassifyError, UploadedFile};

/// Lifecycle of one classification attempt. Transitions are strictly
/// forward; a terminal state returns to `Idle` only through [`UploadController::reset`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Previewing,
    Analyzing,
    Succeeded(ClassificationResult),
    Failed(ErrorKind),
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded(_) | RequestState::Failed(_))
    }
}

/// Error surface carried by [`RequestState::Failed`]. The full diagnostic
/// stays in the log; the view only renders [`ErrorKind::user_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidFileType,
    Network,
    RemoteService { status: u16 },
    MalformedResponse,
}

impl ErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidFileType => "Please upload a valid image file",
            ErrorKind::Network | ErrorKind::RemoteService { .. } | ErrorKind::MalformedResponse => {
                "Failed to analyze the image. Please try again."
            }
        }
    }
}

impl From<&ClassifyError> for ErrorKind {
    fn from(error: &ClassifyError) -> Self {
        match error {
            ClassifyError::InvalidFileType { .. } => ErrorKind::InvalidFileType,
            ClassifyError::Network(_) => ErrorKind::Network,
            ClassifyError::RemoteService { status, .. } => ErrorKind::RemoteService {
                status: *status,
            },
            ClassifyError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

/// Drives the end-to-end flow for one selection at a time. Every
/// selection (and every reset) bumps an internal generation counter; a
/// classification result is applied only if its generation is still
/// current, so a slow response can never overwrite a newer attempt.
pub struct UploadController {
    classifier: Arc<dyn Classifier>,
    inner: Mutex<ControllerInner>,
    states: broadcast::Sender<RequestState>,
}

struct ControllerInner {
    generation: u64,
    state: RequestState,
    preview: Option<PreviewHandle>,
}

impl UploadController {
    pub fn new(classifier: Arc<dyn Classifier>) -> Arc<Self> {
        let (states, _) = broadcast::channel(64);
        Arc::new(Self {
            classifier,
            inner: Mutex::new(ControllerInner {
                generation: 0,
                state: RequestState::Idle,
                preview: None,
            }),
            states,
        })
    }

    /// Starts a classification attempt for the selected file. A non-image
    /// media type fails locally without any network call. Any attempt
    /// still in flight is superseded either way.
    pub async fn select_file(self: &Arc<Self>, file: UploadedFile) {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;

            if !file.is_image() {
                warn!(media_type = %file.media_type, "rejected non-image selection");
                inner.preview = None;
                set_state(
                    &mut inner,
                    &self.states,
                    RequestState::Failed(ErrorKind::InvalidFileType),
                );
                return;
            }

            set_state(&mut inner, &self.states, RequestState::Previewing);
            // Replacing the handle releases the previous preview.
            inner.preview = Some(PreviewHandle::derive(&file));
            set_state(&mut inner, &self.states, RequestState::Analyzing);
            inner.generation
        };

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = controller.classifier.classify(&file).await;
            controller.apply_outcome(generation, outcome).await;
        });
    }

    /// Returns to `Idle` and releases the preview. Also bumps the
    /// generation so a still-in-flight response is discarded on arrival.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.preview = None;
        set_state(&mut inner, &self.states, RequestState::Idle);
    }

    pub async fn current_state(&self) -> RequestState {
        self.inner.lock().await.state.clone()
    }

    pub async fn current_preview(&self) -> Option<PreviewHandle> {
        self.inner.lock().await.preview.clone()
    }

    pub fn subscribe_states(&self) -> broadcast::Receiver<RequestState> {
        self.states.subscribe()
    }

    async fn apply_outcome(
        &self,
        generation: u64,
        outcome: Result<ClassificationResult, ClassifyError>,
    ) {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(
                generation,
                current = inner.generation,
                "discarding superseded classification result"
            );
            return;
        }

        let state = match outcome {
            Ok(result) => RequestState::Succeeded(result),
            Err(error) => {
                warn!(%error, "classification attempt failed");
                RequestState::Failed(ErrorKind::from(&error))
            }
        };
        set_state(&mut inner, &self.states, state);
    }
}

fn set_state(
    inner: &mut ControllerInner,
    states: &broadcast::Sender<RequestState>,
    state: RequestState,
) {
    inner.state = state.clone();
    let _ = states.send(state);
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
