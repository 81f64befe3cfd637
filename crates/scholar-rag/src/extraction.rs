//! Text extraction from uploaded files and web links

use pulldown_cmark::{Event, Parser, TagEnd};
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scholar_core::ocr::{MEDIA_TYPE_JPEG, MEDIA_TYPE_PDF, MEDIA_TYPE_PNG};
use scholar_core::{Error, OcrEngine, Result};

/// File extensions accepted for upload
pub const SUPPORTED_UPLOAD_EXTENSIONS: [&str; 6] = ["pdf", "txt", "md", "png", "jpg", "jpeg"];

const HTML_TEXT_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li";

/// Lower-cased extension of a path, without the dot
pub fn file_extension(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

pub fn is_supported_upload(path: impl AsRef<Path>) -> bool {
    file_extension(path)
        .map(|ext| SUPPORTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Extracts plain text from documents, delegating images and scanned PDFs to OCR
pub struct TextExtractor {
    client: reqwest::Client,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl TextExtractor {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("scholar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, ocr: None })
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract the text of a local file, dispatching on its extension
    pub async fn extract_from_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let extension = file_extension(path).unwrap_or_default();

        tracing::debug!(path = %path.display(), extension = %extension, "extracting text");

        match extension.as_str() {
            "pdf" => {
                let bytes = tokio::fs::read(path).await?;
                self.extract_pdf(bytes).await
            }
            "txt" => Ok(tokio::fs::read_to_string(path).await?),
            "md" => {
                let markdown = tokio::fs::read_to_string(path).await?;
                Ok(markdown_to_text(&markdown))
            }
            "png" => {
                let bytes = tokio::fs::read(path).await?;
                self.recognize(&bytes, MEDIA_TYPE_PNG).await
            }
            "jpg" | "jpeg" => {
                let bytes = tokio::fs::read(path).await?;
                self.recognize(&bytes, MEDIA_TYPE_JPEG).await
            }
            other => Err(Error::UnsupportedFormat(format!(
                ".{} (use PDF, TXT, MD or image files: PNG, JPG, JPEG)",
                other
            ))),
        }
    }

    /// Fetch a link and extract its text, either as a PDF or as an HTML page
    pub async fn extract_from_link(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("{} returned {}", url, status)));
        }

        let is_pdf_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains(MEDIA_TYPE_PDF))
            .unwrap_or(false);

        let text = if is_pdf_type || url.to_lowercase().ends_with(".pdf") {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Network(format!("Failed to read {}: {}", url, e)))?;
            self.extract_pdf(bytes.to_vec()).await?
        } else {
            let body = response
                .text()
                .await
                .map_err(|e| Error::Network(format!("Failed to read {}: {}", url, e)))?;
            html_to_text(&body)
        };

        if text.trim().is_empty() {
            return Err(Error::Extraction(format!("No text extracted from {}", url)));
        }

        Ok(text.trim().to_string())
    }

    /// Text layer of a PDF, falling back to OCR when it has none
    pub async fn extract_pdf(&self, bytes: Vec<u8>) -> Result<String> {
        let ocr_bytes = self.ocr.as_ref().map(|_| bytes.clone());

        // pdf-extract may panic on malformed input; a panic surfaces as a join error
        let extracted = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await;

        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "PDF text layer could not be read");
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "PDF parser aborted");
                String::new()
            }
        };

        if !text.trim().is_empty() {
            return Ok(text.trim().to_string());
        }

        match (&self.ocr, ocr_bytes) {
            (Some(ocr), Some(bytes)) => {
                tracing::info!("PDF has no text layer, running OCR");
                let text = ocr.recognize(&bytes, MEDIA_TYPE_PDF).await?;
                if text.trim().is_empty() {
                    Err(Error::Extraction("No text found in PDF".to_string()))
                } else {
                    Ok(text.trim().to_string())
                }
            }
            _ => Err(Error::Extraction("No text found in PDF".to_string())),
        }
    }

    async fn recognize(&self, bytes: &[u8], media_type: &str) -> Result<String> {
        let ocr = self.ocr.as_ref().ok_or_else(|| {
            Error::Configuration("No OCR engine configured for image files".to_string())
        })?;

        let text = ocr.recognize(bytes, media_type).await?;
        Ok(text.trim().to_string())
    }
}

/// Text of paragraph, heading and list item elements, one per line
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(HTML_TEXT_SELECTOR) else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown stripped to plain text with block elements on separate lines
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => text.push_str("\n\n"),
            _ => {}
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedOcr(&'static str);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _bytes: &[u8], _media_type: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_upload("paper.PDF"));
        assert!(is_supported_upload("notes.md"));
        assert!(is_supported_upload("scan.jpeg"));
        assert!(!is_supported_upload("slides.pptx"));
        assert!(!is_supported_upload("README"));
    }

    #[test]
    fn test_html_to_text_keeps_content_elements() {
        let html = r#"<html><head><script>var x = 1;</script></head><body>
            <h1> Results </h1><div>navigation</div>
            <p>We observe a 3% gain.</p><ul><li>first</li><li>  </li></ul>
        </body></html>"#;

        assert_eq!(html_to_text(html), "Results\nWe observe a 3% gain.\nfirst");
    }

    #[test]
    fn test_markdown_to_text() {
        let markdown = "# Method\n\nWe use **contrastive** learning.\n\n- one\n- two\n";
        let text = markdown_to_text(markdown);

        assert!(text.starts_with("Method\n\nWe use contrastive learning."));
        assert!(text.contains("one"));
        assert!(!text.contains('*'));
        assert!(!text.contains('#'));
    }

    #[tokio::test]
    async fn test_extract_txt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain notes").unwrap();

        let extractor = TextExtractor::new().unwrap();
        assert_eq!(extractor.extract_from_file(&path).await.unwrap(), "plain notes");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "a,b").unwrap();

        let extractor = TextExtractor::new().unwrap();
        let err = extractor.extract_from_file(&path).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_image_requires_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();

        let extractor = TextExtractor::new().unwrap();
        assert!(extractor.extract_from_file(&path).await.is_err());

        let extractor = TextExtractor::new()
            .unwrap()
            .with_ocr(Arc::new(FixedOcr(" recognized text ")));
        assert_eq!(
            extractor.extract_from_file(&path).await.unwrap(),
            "recognized text"
        );
    }

    #[tokio::test]
    async fn test_unreadable_pdf_falls_back_to_ocr() {
        let extractor = TextExtractor::new()
            .unwrap()
            .with_ocr(Arc::new(FixedOcr("scanned page")));
        let text = extractor.extract_pdf(b"not a pdf".to_vec()).await.unwrap();
        assert_eq!(text, "scanned page");

        let extractor = TextExtractor::new().unwrap();
        let err = extractor.extract_pdf(b"not a pdf".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
