use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    error::{ExplainError, Result},
    models::{ExtractedText, FileInput, InputArtifact, MIME_PDF, MIME_TEXT},
    pdf::LopdfDecoder,
};

/// Reads the embedded text layer of a PDF. Pages are opened once, then read one at a time.
#[async_trait]
pub trait TextLayerDecoder: Send + Sync {
    async fn open(&self, bytes: &[u8]) -> Result<Box<dyn TextLayer>>;
}

/// An opened PDF text layer.
#[async_trait]
pub trait TextLayer: Send + Sync {
    fn page_count(&self) -> u32;

    /// Text items of a 1-based page, in the order the document reports them.
    async fn text_items(&self, page_number: u32) -> Result<Vec<String>>;
}

/// Turns an [`InputArtifact`] into a single plain-text string.
#[derive(Clone)]
pub struct TextExtractor {
    decoder: Arc<dyn TextLayerDecoder>,
}

impl TextExtractor {
    pub fn new(decoder: Arc<dyn TextLayerDecoder>) -> Self {
        Self { decoder }
    }

    pub async fn extract(&self, artifact: &InputArtifact) -> Result<ExtractedText> {
        match artifact {
            InputArtifact::Text(text) => ExtractedText::new(text.trim()),
            InputArtifact::File(file) => {
                let text = self.extract_file(file).await?;
                if text.trim().is_empty() {
                    warn!("No text extracted from {}", file.name);
                }
                ExtractedText::new(text)
            }
        }
    }

    async fn extract_file(&self, file: &FileInput) -> Result<String> {
        match file.mime_type.as_str() {
            MIME_PDF => self.extract_pdf(file).await,
            MIME_TEXT => Ok(decode_text_file(&file.bytes)),
            other => Err(ExplainError::UnsupportedFormat(other.to_string())),
        }
    }

    async fn extract_pdf(&self, file: &FileInput) -> Result<String> {
        info!("Extracting text layer from PDF: {}", file.name);

        let layer = self.decoder.open(&file.bytes).await?;
        let page_count = layer.page_count();
        let mut pages = Vec::with_capacity(page_count as usize);

        // One page at a time keeps the output in page order.
        for page_number in 1..=page_count {
            let items = layer.text_items(page_number).await?;
            debug!("Page {} yielded {} text items", page_number, items.len());
            pages.push(items.join(" "));
        }

        let text = pages.join("\n");
        info!(
            "PDF text extraction completed: {} pages, {} characters",
            page_count,
            text.len()
        );
        Ok(text)
    }
}

/// Lossy UTF-8 with a leading byte order mark dropped.
fn decode_text_file(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Arc::new(LopdfDecoder))
    }
}
