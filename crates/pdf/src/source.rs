use std::path::Path;

use pdfmark_core::error::DecodeError;
use pdfmark_core::glyph::RawGlyph;
use pdfmark_core::pipeline::{PageSource, RawPage};

use crate::parser::backend::{LopdfBackend, PageId, PdfBackend};
use crate::parser::spans::{extract_page_spans, TextSpan};
use crate::PdfError;

/// Serves a PDF's pages to the conversion pipeline, one at a time.
pub struct LopdfSource<B: PdfBackend = LopdfBackend> {
    backend: B,
    /// Page object ids in page order.
    pages: Vec<PageId>,
}

impl LopdfSource<LopdfBackend> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(Self::new(LopdfBackend::load_bytes(bytes)?))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl<B: PdfBackend> LopdfSource<B> {
    pub fn new(backend: B) -> Self {
        let pages = backend.pages().into_values().collect();
        Self { backend, pages }
    }

    /// Glyph runs and annotations of a 1-based page.
    pub fn read_page(&self, number: usize) -> Result<RawPage, PdfError> {
        let page = number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .copied()
            .ok_or(PdfError::PageNotFound(number))?;

        let glyphs: Vec<RawGlyph> = extract_page_spans(&self.backend, page)?
            .into_iter()
            .map(TextSpan::into_raw_glyph)
            .collect();
        let annotations = self.backend.page_annotations(page)?;

        log::debug!(
            "page {number}: {} spans, {} annotations",
            glyphs.len(),
            annotations.len()
        );

        Ok(RawPage {
            glyphs,
            annotations,
        })
    }
}

impl<B: PdfBackend> PageSource for LopdfSource<B> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn load_page(&mut self, number: usize) -> Result<RawPage, DecodeError> {
        Ok(self.read_page(number)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use pdfmark_core::links::Annotation;
    use pdfmark_core::pipeline::convert_document;
    use pdfmark_core::LayoutConfig;

    use super::*;
    use crate::parser::spans::tests::{cm, op, tf, tj, tm, MockBackend};

    fn report_backend() -> MockBackend {
        MockBackend {
            page_ids: BTreeMap::from([(1, (3, 0))]),
            ops: vec![
                op("BT", vec![]),
                tf(12.0),
                tm(50.0, 780.0),
                tj("2024.10.18.(금)"),
                tm(50.0, 750.0),
                tj("【시황】"),
                tm(50.0, 720.0),
                tj("삼성전자"),
                tm(106.0, 720.0),
                tj("목표가 상향"),
                op("ET", vec![]),
            ],
            annotations: vec![Annotation::link([50.0, 718.0, 98.0, 732.0], "https://ex.com")],
        }
    }

    #[test]
    fn test_read_page_converts_spans() {
        let source = LopdfSource::new(report_backend());
        let page = source.read_page(1).unwrap();

        assert_eq!(page.glyphs.len(), 4);
        assert_eq!(page.glyphs[2].text, "삼성전자");
        assert_eq!(page.glyphs[2].x, 50.0);
        assert_eq!(page.glyphs[2].height, 12.0);
        assert_eq!(page.glyphs[2].width, 48.0);
        assert_eq!(page.annotations.len(), 1);
    }

    #[test]
    fn test_missing_page() {
        let source = LopdfSource::new(report_backend());
        assert!(matches!(source.read_page(0), Err(PdfError::PageNotFound(0))));
        assert!(matches!(source.read_page(2), Err(PdfError::PageNotFound(2))));
    }

    #[test]
    fn test_decode_error_carries_message() {
        let mut source = LopdfSource::new(report_backend());
        let err = source.load_page(5).unwrap_err();
        assert_eq!(err.message, "Page not found: 5");
    }

    #[test]
    fn test_converts_through_pipeline() {
        let mut source = LopdfSource::new(report_backend());
        let today = NaiveDate::from_ymd_opt(2024, 10, 20).unwrap();
        let doc = convert_document(
            &mut source,
            "241018(금) 저녁시그널.pdf",
            today,
            &LayoutConfig::default(),
            &mut |_| {},
        )
        .unwrap();

        assert_eq!(
            doc.markup.content,
            "# 2024.10.18.(금)\n\n## 【시황】\n\n[삼성전자](https://ex.com) 목표가 상향"
        );
        assert_eq!(doc.filename, "2024.10.18.(금) - 저녁시그널");
    }

    fn convert(backend: MockBackend) -> pdfmark_core::pipeline::ConvertedDocument {
        let mut source = LopdfSource::new(backend);
        convert_document(
            &mut source,
            "report.pdf",
            NaiveDate::from_ymd_opt(2024, 10, 20).unwrap(),
            &LayoutConfig::default(),
            &mut |_| {},
        )
        .unwrap()
    }

    #[test]
    fn test_scaled_page_links_in_page_space() {
        let doc = convert(MockBackend {
            page_ids: BTreeMap::from([(1, (3, 0))]),
            ops: vec![
                cm([0.5, 0.0, 0.0, 0.5, 0.0, 0.0]),
                op("BT", vec![]),
                tf(20.0),
                tm(200.0, 1400.0),
                tj("Linked"),
                op("ET", vec![]),
            ],
            annotations: vec![Annotation::link([100.0, 698.0, 140.0, 708.0], "https://ex.com/a")],
        });

        assert_eq!(doc.link_count, 1);
        assert!(doc.markup.content.contains("[Linked](https://ex.com/a)"));
    }

    #[test]
    fn test_flipped_page_keeps_reading_order() {
        let doc = convert(MockBackend {
            page_ids: BTreeMap::from([(1, (3, 0))]),
            ops: vec![
                cm([1.0, 0.0, 0.0, -1.0, 0.0, 800.0]),
                op("BT", vec![]),
                tf(12.0),
                tm(50.0, 100.0),
                tj("Top"),
                tm(50.0, 200.0),
                tj("Bottom"),
                op("ET", vec![]),
            ],
            annotations: vec![],
        });

        assert_eq!(doc.markup.content, "Top\nBottom");
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        assert!(matches!(
            LopdfSource::open("/nonexistent/report.pdf"),
            Err(PdfError::Io(_))
        ));
    }
}
