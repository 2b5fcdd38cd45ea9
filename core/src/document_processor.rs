use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use tokio::process::Command;

use crate::models::PageText;

/// OCR boundary for pages with no extractable text. The production engine
/// shells out to `pdftoppm` and `tesseract`; tests substitute a recorder.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Rasterizes one page of the PDF and returns the recognized text.
    async fn recognize_page(&self, pdf_bytes: &[u8], page_number: u32) -> Result<String>;
}

/// OCR via the `pdftoppm` and `tesseract` command-line tools.
pub struct TesseractOcr {
    dpi: u32,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self { dpi: 200 }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize_page(&self, pdf_bytes: &[u8], page_number: u32) -> Result<String> {
        let scratch = tempfile::tempdir()?;
        let pdf_path = scratch.path().join("source.pdf");
        tokio::fs::write(&pdf_path, pdf_bytes).await?;

        let prefix = scratch.path().join("page");
        let rasterize = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .await?;
        if !rasterize.status.success() {
            return Err(anyhow!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&rasterize.stderr).trim()
            ));
        }

        // pdftoppm zero-pads the page number in the output name depending on
        // the document's page count, so locate the image instead of guessing.
        let image = find_png(scratch.path()).await?.ok_or_else(|| {
            anyhow!("pdftoppm produced no image for page {}", page_number)
        })?;

        let recognize = Command::new("tesseract")
            .arg(&image)
            .arg("stdout")
            .output()
            .await?;
        if !recognize.status.success() {
            return Err(anyhow!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&recognize.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&recognize.stdout).into_owned())
    }
}

async fn find_png(dir: &std::path::Path) -> Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "png") {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Document ingestion boundary: raw PDF bytes in, ordered page text out,
/// page numbers starting at 1.
#[async_trait]
pub trait DocumentIngestor: Send + Sync {
    async fn process(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>>;
}

/// Extracts text from an uploaded PDF, one entry per page starting at
/// page 1. Pages with no extractable text fall back to OCR; an OCR failure
/// is a per-page warning, never a hard error.
pub struct DocumentProcessor {
    ocr: Box<dyn OcrEngine>,
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self::with_ocr(Box::new(TesseractOcr::new()))
    }

    pub fn with_ocr(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    async fn fill_blank_pages(&self, pdf_bytes: &[u8], raw_pages: Vec<String>) -> Vec<PageText> {
        let mut pages = Vec::with_capacity(raw_pages.len());
        for (i, text) in raw_pages.into_iter().enumerate() {
            let page_number = (i + 1) as u32;
            let text = if text.trim().is_empty() {
                match self.ocr.recognize_page(pdf_bytes, page_number).await {
                    Ok(recognized) => recognized,
                    Err(e) => {
                        log::warn!("OCR failed for page {}: {}", page_number, e);
                        String::new()
                    }
                }
            } else {
                text
            };
            pages.push(PageText {
                page_number,
                text: clean_text(&text),
            });
        }
        pages
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentIngestor for DocumentProcessor {
    async fn process(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>> {
        let raw_pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| anyhow!("failed to read PDF: {}", e))?;
        log::info!("Extracted text from {} pages", raw_pages.len());
        Ok(self.fill_blank_pages(pdf_bytes, raw_pages).await)
    }
}

/// Collapses whitespace runs and drops control characters left behind by
/// PDF extraction.
fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .map(|c| if c.is_control() && !c.is_whitespace() { ' ' } else { c })
        .collect();
    let re_whitespace = Regex::new(r"\s+").unwrap();
    re_whitespace.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct RecordingOcr {
        calls: Arc<Mutex<Vec<u32>>>,
        result: Result<String, String>,
    }

    impl RecordingOcr {
        fn succeeding(text: &str) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                result: Ok(text.to_string()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                result: Err(reason.to_string()),
            }
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OcrEngine for RecordingOcr {
        async fn recognize_page(&self, _pdf_bytes: &[u8], page_number: u32) -> Result<String> {
            self.calls.lock().unwrap().push(page_number);
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(reason) => Err(anyhow!("{}", reason)),
            }
        }
    }

    #[tokio::test]
    async fn extractable_pages_skip_ocr() {
        let ocr = RecordingOcr::succeeding("never used");
        let processor = DocumentProcessor::with_ocr(Box::new(ocr.clone()));
        let pages = processor
            .fill_blank_pages(b"%PDF", vec!["page one".into(), "page two".into()])
            .await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].text, "page two");
        assert!(ocr.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_page_goes_through_ocr_only() {
        let ocr = RecordingOcr::succeeding("scanned text");
        let processor = DocumentProcessor::with_ocr(Box::new(ocr.clone()));
        let pages = processor
            .fill_blank_pages(b"%PDF", vec!["first".into(), "   ".into(), "third".into()])
            .await;
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].text, "scanned text");
        assert_eq!(ocr.calls(), vec![2]);
    }

    #[tokio::test]
    async fn ocr_failure_warns_and_continues() {
        let ocr = RecordingOcr::failing("no tesseract");
        let processor = DocumentProcessor::with_ocr(Box::new(ocr.clone()));
        let pages = processor
            .fill_blank_pages(b"%PDF", vec!["".into(), "still here".into()])
            .await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "");
        assert_eq!(pages[1].text, "still here");
        assert_eq!(ocr.calls(), vec![1]);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("a\n\n  b\t c\u{0} d"), "a b c d");
        assert_eq!(clean_text("   "), "");
        assert_eq!(clean_text("Revenue grew 10%."), "Revenue grew 10%.");
    }
}
