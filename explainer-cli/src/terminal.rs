use crossterm::style::{Stylize, style};
use explainer_core::{RenderedResult, ScreenState, ViewMode, ViewSurface};
use std::io::{self, IsTerminal, Write};

/// Terminal rendition of the explainer screens.
///
/// Hooks update what the screen holds; [`TerminalView::draw`] paints it. Errors and the
/// loading line go straight to stderr since they are transient.
pub struct TerminalView {
    styled: bool,
    loading: bool,
    screen: ScreenState,
    rendered: Option<RenderedResult>,
    visible: Option<ViewMode>,
    prompt: String,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::with_styling(io::stdout().is_terminal())
    }

    pub fn with_styling(styled: bool) -> Self {
        Self {
            styled,
            loading: false,
            screen: ScreenState::Input,
            rendered: None,
            visible: None,
            prompt: explainer_core::view::DEFAULT_DROP_PROMPT.to_string(),
        }
    }

    pub fn rendered(&self) -> Option<&RenderedResult> {
        self.rendered.as_ref()
    }

    pub fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        match (self.screen, &self.rendered) {
            (ScreenState::Results, Some(rendered)) => self.draw_results(out, rendered),
            _ => self.draw_input(out),
        }
    }

    fn draw_input(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "[ {} ]", self.prompt)?;
        writeln!(out, "Paste report text or pick a file, then analyze.")
    }

    fn draw_results(&self, out: &mut impl Write, rendered: &RenderedResult) -> io::Result<()> {
        let active = self.visible.unwrap_or_default();
        let tabs: Vec<String> = ViewMode::ALL
            .iter()
            .map(|mode| {
                let label = match mode {
                    ViewMode::Patient => "Patient",
                    ViewMode::Clinician => "Clinician",
                };
                if *mode == active {
                    self.emphasize(&format!("[{label}]"))
                } else {
                    format!(" {label} ")
                }
            })
            .collect();
        writeln!(out, "{}", tabs.join(" "))?;
        writeln!(out)?;
        writeln!(out, "{}", self.terminal_text(rendered.panel(active)))?;

        if !rendered.citations.is_empty() {
            writeln!(out)?;
            writeln!(out, "Sources:")?;
            for (i, url) in rendered.citations.iter().enumerate() {
                writeln!(out, "  {}. {}", i + 1, url)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", rendered.disclaimer)
    }

    /// `<br>` becomes a newline and `<strong>` runs become bold.
    fn terminal_text(&self, html: &str) -> String {
        let text = html.replace("<br>", "\n");
        let mut segments = text.split("<strong>");
        let mut out = segments.next().unwrap_or_default().to_string();

        for segment in segments {
            match segment.split_once("</strong>") {
                Some((bold, rest)) => {
                    out.push_str(&self.emphasize(bold));
                    out.push_str(rest);
                }
                None => {
                    out.push_str("<strong>");
                    out.push_str(segment);
                }
            }
        }
        out
    }

    fn emphasize(&self, text: &str) -> String {
        if self.styled {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSurface for TerminalView {
    fn set_loading(&mut self, visible: bool) {
        if visible && !self.loading {
            eprintln!("Analyzing report...");
        }
        self.loading = visible;
    }

    fn notify_error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn show_screen(&mut self, screen: ScreenState) {
        self.screen = screen;
    }

    fn render_results(&mut self, rendered: &RenderedResult) {
        self.rendered = Some(rendered.clone());
    }

    fn set_panel_visible(&mut self, mode: ViewMode, visible: bool) {
        if visible {
            self.visible = Some(mode);
        } else if self.visible == Some(mode) {
            self.visible = None;
        }
    }

    fn set_mode_selected(&mut self, _mode: ViewMode, _selected: bool) {
        // the visible panel doubles as the selection marker in the tab row
    }

    fn set_drop_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    fn clear_inputs(&mut self) {
        self.rendered = None;
        self.visible = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> RenderedResult {
        RenderedResult {
            patient_html: "<strong>Normal</strong> kidney function.<br>See you next year.".into(),
            clinician_html: "Cr 0.9 mg/dL, eGFR &gt;90.".into(),
            citations_html: String::new(),
            citations: vec!["https://kidney.org/".into()],
            disclaimer: "Not medical advice.".into(),
        }
    }

    fn drawn(view: &TerminalView) -> String {
        let mut out = Vec::new();
        view.draw(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn markup_becomes_plain_lines_without_styling() {
        let view = TerminalView::with_styling(false);
        assert_eq!(
            view.terminal_text("<strong>a</strong> b<br>c <strong>unclosed"),
            "a b\nc <strong>unclosed"
        );
    }

    #[test]
    fn styled_bold_uses_escape_codes() {
        let view = TerminalView::with_styling(true);
        let text = view.terminal_text("<strong>a</strong>");
        assert!(text.contains('\u{1b}'));
        assert!(text.contains('a'));
    }

    #[test]
    fn draws_visible_panel_with_sources() {
        let mut view = TerminalView::with_styling(false);
        view.render_results(&rendered());
        view.show_screen(ScreenState::Results);
        view.set_panel_visible(ViewMode::Clinician, true);
        view.set_panel_visible(ViewMode::Patient, false);

        let screen = drawn(&view);
        assert!(screen.starts_with(" Patient  [Clinician]\n"));
        assert!(screen.contains("Cr 0.9 mg/dL"));
        assert!(!screen.contains("kidney function"));
        assert!(screen.contains("  1. https://kidney.org/\n"));
        assert!(screen.ends_with("Not medical advice.\n"));
    }

    #[test]
    fn reset_goes_back_to_prompt() {
        let mut view = TerminalView::with_styling(false);
        view.render_results(&rendered());
        view.show_screen(ScreenState::Results);
        view.set_drop_prompt("Selected: labs.pdf");

        view.show_screen(ScreenState::Input);
        view.clear_inputs();
        view.set_drop_prompt(explainer_core::view::DEFAULT_DROP_PROMPT);

        assert!(view.rendered().is_none());
        assert!(drawn(&view).starts_with("[ Drag & drop PDF/TXT or click to browse ]"));
    }
}
