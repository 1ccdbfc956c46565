//! Pure Rust text-layer decoding on top of `lopdf`.
//!
//! Only text-showing operators are read; glyph positions and images are ignored. Fonts
//! matter only for their `/Encoding`, which decides how string bytes map to characters.

use async_trait::async_trait;
use lopdf::{Document, Object, content::Content};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    error::{ExplainError, Result},
    extract::{TextLayer, TextLayerDecoder},
};

pub struct LopdfDecoder;

#[async_trait]
impl TextLayerDecoder for LopdfDecoder {
    async fn open(&self, bytes: &[u8]) -> Result<Box<dyn TextLayer>> {
        let bytes = bytes.to_vec();

        let pages = tokio::task::spawn_blocking(move || -> Result<Vec<Arc<PageSource>>> {
            let document = Document::load_mem(&bytes)?;

            // BTreeMap keyed by page number, so iteration is already in page order
            document
                .get_pages()
                .into_values()
                .map(|page_id| {
                    let encodings = document
                        .get_page_fonts(page_id)
                        .into_iter()
                        .map(|(name, font)| (name, font.get_font_encoding().to_string()))
                        .collect();
                    Ok(Arc::new(PageSource {
                        stream: document.get_page_content(page_id)?,
                        encodings,
                    }))
                })
                .collect()
        })
        .await
        .map_err(|e| ExplainError::ExtractionFailed(e.to_string()))??;

        info!("Opened PDF with {} pages", pages.len());
        Ok(Box::new(LopdfTextLayer { pages }))
    }
}

/// Raw content stream of one page plus the encoding of each font resource it can select.
struct PageSource {
    stream: Vec<u8>,
    encodings: BTreeMap<Vec<u8>, String>,
}

impl PageSource {
    fn text_items(&self) -> Result<Vec<String>> {
        let content = Content::decode(&self.stream)?;
        let mut encoding: Option<&str> = None;
        let mut items = Vec::new();

        for op in &content.operations {
            if op.operator == "Tf" {
                let font = op.operands.first().and_then(|name| name.as_name().ok());
                encoding = font.and_then(|name| self.encodings.get(name)).map(String::as_str);
                if encoding.is_none() {
                    debug!("Text font without a known encoding, using StandardEncoding");
                }
                continue;
            }
            items.extend(text_item(&op.operator, &op.operands, encoding));
        }
        Ok(items)
    }
}

struct LopdfTextLayer {
    pages: Vec<Arc<PageSource>>,
}

#[async_trait]
impl TextLayer for LopdfTextLayer {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn text_items(&self, page_number: u32) -> Result<Vec<String>> {
        let page = page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .cloned()
            .ok_or_else(|| {
                ExplainError::ExtractionFailed(format!("page {} out of range", page_number))
            })?;

        tokio::task::spawn_blocking(move || page.text_items())
            .await
            .map_err(|e| ExplainError::ExtractionFailed(e.to_string()))?
    }
}

fn text_item(operator: &str, operands: &[Object], encoding: Option<&str>) -> Option<String> {
    let decode = |object: &Object| string_operand(object, encoding);
    match operator {
        "Tj" | "'" => operands.first().and_then(decode),
        "\"" => operands.get(2).and_then(decode),
        "TJ" => match operands.first()? {
            Object::Array(parts) => Some(parts.iter().filter_map(decode).collect()),
            _ => None,
        },
        _ => None,
    }
}

fn string_operand(object: &Object, encoding: Option<&str>) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes, encoding)),
        _ => None,
    }
}

/// UTF-16BE when the string carries a byte order mark, the font's simple encoding otherwise.
fn decode_pdf_string(bytes: &[u8], encoding: Option<&str>) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => Document::decode_text(encoding, bytes),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::TextExtractor;
    use crate::models::{FileInput, InputArtifact, MIME_PDF};
    use lopdf::content::Operation;
    use lopdf::{Stream, StringFormat, dictionary};
    use std::sync::Arc;

    /// Build an in-memory PDF with one content stream per page.
    pub(crate) fn build_pdf(pages: &[Vec<Operation>]) -> Vec<u8> {
        build_pdf_with_encoding(pages, None)
    }

    fn build_pdf_with_encoding(pages: &[Vec<Operation>], encoding: Option<&str>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        if let Some(encoding) = encoding {
            font.set("Encoding", Object::Name(encoding.as_bytes().to_vec()));
        }
        let font_id = doc.add_object(font);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let mut ops = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            ops.extend(operations.iter().cloned());
            ops.push(Operation::new("ET", vec![]));

            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    pub(crate) fn show(text: &str) -> Operation {
        Operation::new("Tj", vec![Object::string_literal(text)])
    }

    #[tokio::test]
    async fn decodes_text_items_in_stream_order() {
        let pdf = build_pdf(&[
            vec![show("Lipid"), show("Panel")],
            vec![
                show("LDL"),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        Object::string_literal("16"),
                        Object::Integer(-20),
                        Object::string_literal("0 mg/dL"),
                    ])],
                ),
                Operation::new("'", vec![Object::string_literal("HDL")]),
                Operation::new(
                    "\"",
                    vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::string_literal("55 mg/dL"),
                    ],
                ),
            ],
        ]);

        let layer = LopdfDecoder.open(&pdf).await.unwrap();
        assert_eq!(layer.page_count(), 2);
        assert_eq!(layer.text_items(1).await.unwrap(), vec!["Lipid", "Panel"]);
        assert_eq!(
            layer.text_items(2).await.unwrap(),
            vec!["LDL", "160 mg/dL", "HDL", "55 mg/dL"]
        );
        assert!(layer.text_items(0).await.is_err());
        assert!(layer.text_items(3).await.is_err());
    }

    #[tokio::test]
    async fn extractor_joins_generated_pdf_pages() {
        let pdf = build_pdf(&[
            vec![show("Page"), show("one")],
            vec![show("Page"), show("two")],
        ]);
        let extractor = TextExtractor::new(Arc::new(LopdfDecoder));
        let file = FileInput::new("two-pages.pdf", MIME_PDF, pdf);

        let text = extractor.extract(&InputArtifact::File(file)).await.unwrap();
        assert_eq!(text.as_str(), "Page one\nPage two");
    }

    #[tokio::test]
    async fn corrupt_pdf_is_an_extraction_failure() {
        let err = LopdfDecoder.open(b"%PDF-1.4 not really").await.err().unwrap();
        assert!(matches!(err, ExplainError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn strings_follow_the_font_encoding() {
        let range = Operation::new(
            "Tj",
            vec![Object::String(
                b"Range 4\x9610 \x95 normal".to_vec(),
                StringFormat::Literal,
            )],
        );
        let pdf = build_pdf_with_encoding(&[vec![range]], Some("WinAnsiEncoding"));

        let layer = LopdfDecoder.open(&pdf).await.unwrap();
        assert_eq!(
            layer.text_items(1).await.unwrap(),
            vec!["Range 4\u{2013}10 \u{2022} normal"]
        );
    }

    #[test]
    fn utf16_strings_are_decoded() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'b', 0x00, 0xB5];
        assert_eq!(decode_pdf_string(&bytes, Some("WinAnsiEncoding")), "Hbµ");
        assert_eq!(decode_pdf_string(b"mmol/L", None), "mmol/L");
        assert_eq!(decode_pdf_string(b"\x96", Some("WinAnsiEncoding")), "\u{2013}");
    }
}
