use tracing::debug;

use crate::{
    markdown::{parse_markdown, render_citations},
    models::{AnalysisResult, FileInput, ScreenState, ViewMode},
};

pub const DEFAULT_DROP_PROMPT: &str = "Drag & drop PDF/TXT or click to browse";

/// Presentation hooks the controller drives. Implemented by whatever front end shows the screens.
pub trait ViewSurface: Send {
    fn set_loading(&mut self, visible: bool);

    /// Blocking notification shown when a flow fails.
    fn notify_error(&mut self, message: &str);

    fn show_screen(&mut self, screen: ScreenState);

    /// Both panels, citations and disclaimer, rendered once per result.
    fn render_results(&mut self, rendered: &RenderedResult);

    fn set_panel_visible(&mut self, mode: ViewMode, visible: bool);

    fn set_mode_selected(&mut self, mode: ViewMode, selected: bool);

    fn set_drop_prompt(&mut self, prompt: &str);

    fn clear_inputs(&mut self);
}

/// Markup produced from an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResult {
    pub patient_html: String,
    pub clinician_html: String,
    pub citations_html: String,
    pub citations: Vec<String>,
    pub disclaimer: String,
}

impl RenderedResult {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            patient_html: parse_markdown(&result.patient_explanation),
            clinician_html: parse_markdown(&result.clinician_explanation),
            citations_html: render_citations(&result.citations),
            citations: result.citations.clone(),
            disclaimer: result.disclaimer.clone(),
        }
    }

    pub fn panel(&self, mode: ViewMode) -> &str {
        match mode {
            ViewMode::Patient => &self.patient_html,
            ViewMode::Clinician => &self.clinician_html,
        }
    }
}

/// What the input screen currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputForm {
    pub text: String,
    pub file: Option<FileInput>,
    pub drop_prompt: String,
}

impl Default for InputForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            file: None,
            drop_prompt: DEFAULT_DROP_PROMPT.to_string(),
        }
    }
}

pub struct ViewStateController<V: ViewSurface> {
    surface: V,
    screen: ScreenState,
    mode: ViewMode,
    result: Option<AnalysisResult>,
    input: InputForm,
}

impl<V: ViewSurface> ViewStateController<V> {
    pub fn new(surface: V) -> Self {
        Self {
            surface,
            screen: ScreenState::Input,
            mode: ViewMode::Patient,
            result: None,
            input: InputForm::default(),
        }
    }

    pub fn screen(&self) -> ScreenState {
        self.screen
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn input(&self) -> &InputForm {
        &self.input
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut V {
        &mut self.surface
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.input.text = text.into();
    }

    pub fn select_file(&mut self, file: FileInput) {
        self.input.drop_prompt = format!("Selected: {}", file.name);
        self.surface.set_drop_prompt(&self.input.drop_prompt);
        self.input.file = Some(file);
    }

    /// Replace whatever was shown with `result`, starting on the patient panel.
    pub fn show_results(&mut self, result: AnalysisResult) {
        let rendered = RenderedResult::from_result(&result);
        self.surface.render_results(&rendered);

        self.result = Some(result);
        self.screen = ScreenState::Results;
        self.surface.show_screen(ScreenState::Results);
        self.apply_mode(ViewMode::Patient);
    }

    /// Switch the visible panel. Ignored unless results are on screen.
    pub fn set_mode(&mut self, mode: ViewMode) -> bool {
        if self.screen != ScreenState::Results {
            debug!("Ignoring switch to {} mode outside the results screen", mode);
            return false;
        }
        self.apply_mode(mode);
        true
    }

    pub fn reset(&mut self) {
        self.screen = ScreenState::Input;
        self.mode = ViewMode::Patient;
        self.result = None;
        self.input = InputForm::default();

        self.surface.show_screen(ScreenState::Input);
        self.surface.clear_inputs();
        self.surface.set_drop_prompt(DEFAULT_DROP_PROMPT);
    }

    fn apply_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        for candidate in ViewMode::ALL {
            let active = candidate == mode;
            self.surface.set_mode_selected(candidate, active);
            self.surface.set_panel_visible(candidate, active);
        }
    }
}
