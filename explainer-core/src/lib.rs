pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod markdown;
pub mod models;
pub mod orchestrator;
pub mod pdf;
pub mod view;

// Re-export commonly used types
pub use client::{AnalysisBackend, AnalysisClient};
pub use config::ExplainerConfig;
pub use error::{ExplainError, Result};
pub use extract::{TextExtractor, TextLayer, TextLayerDecoder};
pub use markdown::{parse_markdown, render_citations};
pub use models::{
    AnalysisRequest, AnalysisResult, ExtractedText, FileInput, FlowState, InputArtifact,
    ScreenState, ViewMode,
};
pub use orchestrator::Orchestrator;
pub use pdf::LopdfDecoder;
pub use view::{InputForm, RenderedResult, ViewStateController, ViewSurface};
