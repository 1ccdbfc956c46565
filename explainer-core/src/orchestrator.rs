//! End-to-end analysis flow: collect input → extract text → call the service → show results.
//!
//! The orchestrator owns its [`FlowState`] and only starts a flow from `Idle`, so a second
//! trigger while one is in flight is rejected instead of sending another request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    client::AnalysisBackend,
    error::{ExplainError, Result},
    extract::TextExtractor,
    models::{AnalysisResult, FileInput, FlowState, InputArtifact, ScreenState, ViewMode},
    view::{InputForm, ViewStateController, ViewSurface},
};

pub struct Orchestrator<V: ViewSurface> {
    extractor: TextExtractor,
    backend: Arc<dyn AnalysisBackend>,
    view: Mutex<ViewStateController<V>>,
    state: Mutex<FlowState>,
}

impl<V: ViewSurface> Orchestrator<V> {
    pub fn new(extractor: TextExtractor, backend: Arc<dyn AnalysisBackend>, surface: V) -> Self {
        Self {
            extractor,
            backend,
            view: Mutex::new(ViewStateController::new(surface)),
            state: Mutex::new(FlowState::Idle),
        }
    }

    pub fn state(&self) -> FlowState {
        *self.lock_state()
    }

    pub fn screen(&self) -> ScreenState {
        self.lock_view().screen()
    }

    pub fn mode(&self) -> ViewMode {
        self.lock_view().mode()
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.lock_view().result().cloned()
    }

    pub fn input(&self) -> InputForm {
        self.lock_view().input().clone()
    }

    /// Run `f` against the view controller while holding its lock.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut ViewStateController<V>) -> R) -> R {
        f(&mut self.lock_view())
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.lock_view().set_text(text);
    }

    pub fn select_file(&self, file: FileInput) {
        info!("Selected file {} ({})", file.name, file.mime_type);
        self.lock_view().select_file(file);
    }

    pub fn set_mode(&self, mode: ViewMode) -> bool {
        self.lock_view().set_mode(mode)
    }

    /// Back to the input screen. Refused while a flow is extracting or requesting.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock_state();
        if matches!(*state, FlowState::Extracting | FlowState::Requesting) {
            return Err(ExplainError::FlowNotIdle(*state));
        }
        self.lock_view().reset();
        *state = FlowState::Idle;
        info!("View reset to input screen");
        Ok(())
    }

    /// Analyze whatever the input screen holds. Pasted text wins over a selected file.
    pub async fn analyze(&self) -> Result<()> {
        let flow_id = Uuid::new_v4();
        let span = info_span!("analysis_flow", flow_id = %flow_id);
        self.run_flow().instrument(span).await
    }

    async fn run_flow(&self) -> Result<()> {
        let artifact = self.begin_flow()?;
        let mut guard = FlowGuard {
            orchestrator: self,
            armed: true,
        };

        let outcome = self.extract_and_request(artifact).await;
        guard.armed = false;

        let mut state = self.lock_state();
        let mut view = self.lock_view();
        match outcome {
            Ok(result) => {
                *state = FlowState::Displaying;
                view.show_results(result);
                view.surface_mut().set_loading(false);
                info!("Analysis flow completed");
                Ok(())
            }
            Err(err) => {
                warn!("Analysis flow failed: {}", err);
                *state = FlowState::Idle;
                view.surface_mut().notify_error(&err.to_string());
                view.surface_mut().set_loading(false);
                Err(err)
            }
        }
    }

    /// Claim the flow and snapshot the input. Nothing is shown when there is no input.
    fn begin_flow(&self) -> Result<InputArtifact> {
        let mut state = self.lock_state();
        if *state != FlowState::Idle {
            warn!("Ignoring analysis request while flow is {}", *state);
            return Err(ExplainError::FlowNotIdle(*state));
        }

        let mut view = self.lock_view();
        let Some(artifact) = artifact_from(view.input()) else {
            let err = ExplainError::NoInputProvided;
            view.surface_mut().notify_error(&err.to_string());
            return Err(err);
        };

        *state = FlowState::Extracting;
        view.surface_mut().set_loading(true);
        info!(
            "Analysis flow started from {}",
            match &artifact {
                InputArtifact::Text(_) => "pasted text".to_string(),
                InputArtifact::File(file) => format!("file {}", file.name),
            }
        );
        Ok(artifact)
    }

    async fn extract_and_request(&self, artifact: InputArtifact) -> Result<AnalysisResult> {
        let text = self.extractor.extract(&artifact).await?;
        drop(artifact);
        info!("Extracted {} characters of report text", text.as_str().len());

        *self.lock_state() = FlowState::Requesting;
        self.backend.analyze(&text).await
    }

    fn lock_state(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewStateController<V>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn artifact_from(input: &InputForm) -> Option<InputArtifact> {
    if !input.text.trim().is_empty() {
        return Some(InputArtifact::Text(input.text.clone()));
    }
    input.file.clone().map(InputArtifact::File)
}

/// Returns the flow to `Idle` if its future is dropped mid-flight.
struct FlowGuard<'a, V: ViewSurface> {
    orchestrator: &'a Orchestrator<V>,
    armed: bool,
}

impl<V: ViewSurface> Drop for FlowGuard<'_, V> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Analysis flow dropped before completion");
            *self.orchestrator.lock_state() = FlowState::Idle;
            self.orchestrator
                .lock_view()
                .surface_mut()
                .set_loading(false);
        }
    }
}
