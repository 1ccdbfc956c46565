use chrono::{DateTime, Utc};
use explainer_core::{RenderedResult, ViewMode};

/// A standalone results page: both panels, the inactive one hidden, citations and disclaimer.
pub fn results_page(rendered: &RenderedResult, active: ViewMode, generated_at: DateTime<Utc>) -> String {
    let panel = |mode: ViewMode| {
        let hidden = if mode == active { "" } else { " hidden" };
        format!(
            r#"<section id="{mode}View" class="view-pane"{hidden}>{}</section>"#,
            rendered.panel(mode)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Medical Report Explanation</title>
</head>
<body>
<p class="generated">Generated {generated}</p>
{patient}
{clinician}
<h2>Sources</h2>
<ol id="citationList">{citations}</ol>
<p id="disclaimerText">{disclaimer}</p>
</body>
</html>
"#,
        generated = generated_at.format("%Y-%m-%d %H:%M UTC"),
        patient = panel(ViewMode::Patient),
        clinician = panel(ViewMode::Clinician),
        citations = rendered.citations_html,
        disclaimer = escape_text(&rendered.disclaimer),
    )
}

/// The disclaimer is plain text, not markup.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use explainer_core::{AnalysisResult, RenderedResult};

    #[test]
    fn page_shows_active_panel_and_escapes_disclaimer() {
        let rendered = RenderedResult::from_result(&AnalysisResult {
            patient_explanation: "**Low** iron.".into(),
            clinician_explanation: "Ferritin 8 ng/mL.".into(),
            citations: vec!["https://example.org/iron".into()],
            disclaimer: "Results <for information> only & not advice".into(),
        });
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

        let page = results_page(&rendered, ViewMode::Clinician, at);

        assert!(page.contains(
            r#"<section id="patientView" class="view-pane" hidden><strong>Low</strong> iron.</section>"#
        ));
        assert!(page.contains(
            r#"<section id="clinicianView" class="view-pane">Ferritin 8 ng/mL.</section>"#
        ));
        assert!(page.contains(r#"<a href="https://example.org/iron" target="_blank">"#));
        assert!(page.contains("Results &lt;for information&gt; only &amp; not advice"));
        assert!(page.contains("Generated 2026-03-01 09:30 UTC"));
    }
}
