use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ExplainError, Result};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// A file picked or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk and declare its type from the extension,
    /// falling back to the `%PDF-` magic when the extension says nothing.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = declared_mime_type(path, &bytes);

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

fn declared_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => MIME_PDF,
        Some("txt" | "text" | "log") => MIME_TEXT,
        _ if bytes.starts_with(b"%PDF-") => MIME_PDF,
        _ => MIME_UNKNOWN,
    }
}

/// The single input consumed by one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputArtifact {
    Text(String),
    File(FileInput),
}

/// Plain text ready to be sent for analysis. Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ExplainError::EmptyExtraction);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ExtractedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub report_text: String,
}

/// Explanation returned by the analysis service. All four fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub patient_explanation: String,
    pub clinician_explanation: String,
    pub citations: Vec<String>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Patient,
    Clinician,
}

impl ViewMode {
    pub const ALL: [ViewMode; 2] = [ViewMode::Patient, ViewMode::Clinician];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Patient => "patient",
            ViewMode::Clinician => "clinician",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(ViewMode::Patient),
            "clinician" => Ok(ViewMode::Clinician),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScreenState {
    #[default]
    Input,
    Results,
}

/// Where the orchestrator is in the collect → extract → request → display flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Idle,
    Extracting,
    Requesting,
    Displaying,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::Extracting => "extracting",
            FlowState::Requesting => "requesting",
            FlowState::Displaying => "displaying",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_text_rejects_whitespace() {
        assert_eq!(
            ExtractedText::new(" \n\t "),
            Err(ExplainError::EmptyExtraction)
        );
        assert_eq!(ExtractedText::new(" a ").unwrap().as_str(), " a ");
    }

    #[test]
    fn mime_type_from_extension_or_magic() {
        assert_eq!(declared_mime_type(Path::new("lab.PDF"), b""), MIME_PDF);
        assert_eq!(declared_mime_type(Path::new("notes.txt"), b"%PDF-"), MIME_TEXT);
        assert_eq!(declared_mime_type(Path::new("scan"), b"%PDF-1.7"), MIME_PDF);
        assert_eq!(declared_mime_type(Path::new("scan.docx"), b"PK"), MIME_UNKNOWN);
    }

    #[test]
    fn analysis_result_requires_every_field() {
        let missing = serde_json::json!({
            "patient_explanation": "p",
            "clinician_explanation": "c",
            "citations": []
        });
        assert!(serde_json::from_value::<AnalysisResult>(missing).is_err());
    }

    #[test]
    fn view_mode_parses_case_insensitively() {
        assert_eq!("Clinician".parse::<ViewMode>(), Ok(ViewMode::Clinician));
        assert!("doctor".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::default(), ViewMode::Patient);
    }
}
