//! Glyph-run extraction from page content streams.
//!
//! A simplified text-rendering state machine walks the content operators and
//! emits one [`TextSpan`] per shown string, positioned in page space with the
//! origin at the bottom-left. Glyph widths are estimated from the font size:
//! the backend does not expose per-glyph metrics.

use pdfmark_core::glyph::RawGlyph;

use super::backend::{decode_text_simple, get_number_from_value, PageId, PdfBackend, PdfValue};
use crate::text::normalize_glyph_text;
use crate::PdfError;

/// Advance of a narrow (Latin) glyph, as a fraction of the font size.
const NARROW_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Advance of a full-width glyph (Hangul, CJK, full-width forms).
const WIDE_CHAR_WIDTH_RATIO: f32 = 1.0;

/// A `TJ` kerning step wider than this fraction of a narrow glyph becomes a space.
const TJ_SPACE_FACTOR: f32 = 0.3;

/// The identity matrix `[a, b, c, d, e, f]`.
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m × n` for PDF row-vector matrices: apply `m` first, then `n`.
fn concat(m: &[f32; 6], n: &[f32; 6]) -> [f32; 6] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

/// A run of text at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// Rendered size, also used as the run height.
    pub font_size: f32,
}

impl TextSpan {
    /// Convert to the core's glyph input, normalizing the text.
    pub fn into_raw_glyph(self) -> RawGlyph {
        RawGlyph::new(
            normalize_glyph_text(&self.text),
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.font_size as f64,
        )
    }
}

/// True for characters rendered at full width: Hangul, CJK ideographs,
/// kana and full-width forms.
pub fn is_wide_char(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x11FF
            | 0x3000..=0x303F
            | 0x3040..=0x30FF
            | 0x3130..=0x318F
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    )
}

fn char_advance_ratio(c: char) -> f32 {
    if is_wide_char(c) {
        WIDE_CHAR_WIDTH_RATIO
    } else {
        NARROW_CHAR_WIDTH_RATIO
    }
}

#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource key, e.g. `b"F1"`.
    font_key: Vec<u8>,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Tz / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Text space to page space: `Tm × CTM`.
    fn rendering_matrix(&self, ctm: &[f32; 6]) -> [f32; 6] {
        concat(&self.text_matrix, ctm)
    }

    /// Page-space position of the current text origin, rise included.
    fn origin(&self, ctm: &[f32; 6]) -> (f32, f32) {
        let m = self.rendering_matrix(ctm);
        (
            self.text_rise * m[2] + m[4],
            self.text_rise * m[3] + m[5],
        )
    }

    /// `font_size * sqrt(b^2 + d^2)` of the rendering matrix.
    fn effective_font_size(&self, ctm: &[f32; 6]) -> f32 {
        let m = self.rendering_matrix(ctm);
        (self.font_size * (m[1].powi(2) + m[3].powi(2)).sqrt()).abs()
    }

    /// Horizontal scale of the rendering matrix, applied to widths.
    fn matrix_scale_x(&self, ctm: &[f32; 6]) -> f32 {
        let m = self.rendering_matrix(ctm);
        (m[0].powi(2) + m[1].powi(2)).sqrt()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    /// Unscaled advance of `text` in text space, spacing included.
    fn text_advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| {
                let glyph = self.font_size * char_advance_ratio(ch) * self.horiz_scale;
                let word = if ch == ' ' { self.word_spacing } else { 0.0 };
                glyph + self.char_spacing + word
            })
            .sum()
    }

    /// Width of `text` in page space.
    fn rendered_width(&self, text: &str, ctm: &[f32; 6]) -> f32 {
        let glyphs: f32 = text
            .chars()
            .map(|ch| self.font_size * char_advance_ratio(ch) * self.horiz_scale)
            .sum();
        glyphs * self.matrix_scale_x(ctm)
    }
}

fn decode_string(val: &PdfValue, backend: &dyn PdfBackend, page: PageId, font_key: &[u8]) -> String {
    match val {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(page, font_key, bytes);
            if decoded.is_empty() {
                decode_text_simple(bytes)
            } else {
                decoded
            }
        }
        _ => String::new(),
    }
}

fn number_at(operands: &[PdfValue], i: usize) -> Option<f32> {
    operands.get(i).and_then(get_number_from_value)
}

struct SpanCollector<'a> {
    backend: &'a dyn PdfBackend,
    page: PageId,
    state: TextState,
    /// Current transformation matrix.
    ctm: [f32; 6],
    /// Saved by `q`, restored by `Q`.
    saved: Vec<([f32; 6], TextState)>,
    spans: Vec<TextSpan>,
}

impl SpanCollector<'_> {
    fn push(&mut self, text: &str, x: f32, y: f32) {
        let text = text.trim_end();
        if text.is_empty() {
            return;
        }
        self.spans.push(TextSpan {
            text: text.to_string(),
            x,
            y,
            width: self.state.rendered_width(text, &self.ctm),
            font_size: self.state.effective_font_size(&self.ctm),
        });
    }

    /// Tj, ' and ".
    fn show(&mut self, operand: &PdfValue) {
        let text = decode_string(operand, self.backend, self.page, &self.state.font_key);
        let (x, y) = self.state.origin(&self.ctm);
        self.push(&text, x, y);
        let dx = self.state.text_advance(&text);
        self.state.advance_x(dx);
    }

    /// TJ: strings and kerning steps in thousandths of text space. Large
    /// steps are word gaps; the whole array becomes one span.
    fn show_array(&mut self, elements: &[PdfValue]) {
        let mut buf = String::new();
        let (mut x, mut y) = self.state.origin(&self.ctm);

        for elem in elements {
            if let PdfValue::Str(_) = elem {
                let fragment = decode_string(elem, self.backend, self.page, &self.state.font_key);
                if buf.is_empty() {
                    (x, y) = self.state.origin(&self.ctm);
                }
                buf.push_str(&fragment);
                let dx = self.state.text_advance(&fragment);
                self.state.advance_x(dx);
            } else if let Some(adj) = get_number_from_value(elem) {
                let dx = -adj / 1000.0 * self.state.font_size * self.state.horiz_scale;
                let threshold =
                    self.state.font_size * NARROW_CHAR_WIDTH_RATIO * self.state.horiz_scale * TJ_SPACE_FACTOR;
                if dx > threshold && !buf.is_empty() && !buf.ends_with(' ') {
                    buf.push(' ');
                }
                self.state.advance_x(dx);
            }
        }

        self.push(&buf, x, y);
    }

    fn apply(&mut self, operator: &str, operands: &[PdfValue]) {
        match operator {
            "q" => self.saved.push((self.ctm, self.state.clone())),
            "Q" => {
                if let Some((ctm, state)) = self.saved.pop() {
                    self.ctm = ctm;
                    // Text matrices are not part of the saved graphics state.
                    self.state = TextState {
                        text_matrix: self.state.text_matrix,
                        line_matrix: self.state.line_matrix,
                        ..state
                    };
                }
            }
            "cm" => {
                let vals: Vec<f32> = operands.iter().take(6).filter_map(get_number_from_value).collect();
                if let Ok(m) = <[f32; 6]>::try_from(vals) {
                    self.ctm = concat(&m, &self.ctm);
                }
            }
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => {
                let key = match operands.first() {
                    Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.clone(),
                    _ => return,
                };
                self.state.font_key = key;
                self.state.font_size = number_at(operands, 1).unwrap_or(0.0);
            }
            "Tm" => {
                let vals: Vec<f32> = operands.iter().take(6).filter_map(get_number_from_value).collect();
                if let Ok(m) = <[f32; 6]>::try_from(vals) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number_at(operands, 0), number_at(operands, 1)) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number_at(operands, 0), number_at(operands, 1)) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = number_at(operands, 0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = number_at(operands, 0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = number_at(operands, 0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = number_at(operands, 0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = number_at(operands, 0) {
                    self.state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(s) = operands.first() {
                    self.show(s);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = operands.first() {
                    self.show_array(arr);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(s) = operands.first() {
                    self.show(s);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    if let Some(aw) = number_at(operands, 0) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = number_at(operands, 1) {
                        self.state.char_spacing = ac;
                    }
                    self.state.next_line();
                    self.show(&operands[2]);
                }
            }
            // ET keeps the font: some producers set it once for many objects.
            _ => {}
        }
    }
}

/// Walk one page's content stream and collect its text spans, in stream order.
///
/// | Operator | Effect |
/// |----------|--------|
/// | `q` / `Q` / `cm` | save, restore and transform the CTM |
/// | `BT` | reset text and line matrices |
/// | `Tf` | font and size |
/// | `Tm` / `Td` / `TD` / `T*` / `TL` | positioning and leading |
/// | `Tc` / `Tw` / `Tz` / `Ts` | spacing, scaling and rise |
/// | `Tj` / `TJ` / `'` / `"` | show text |
pub fn extract_page_spans(backend: &dyn PdfBackend, page: PageId) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page)?;
    let ops = backend.decode_content(&raw_content)?;

    let mut collector = SpanCollector {
        backend,
        page,
        state: TextState::default(),
        ctm: IDENTITY_MATRIX,
        saved: Vec::new(),
        spans: Vec::new(),
    };

    for op in &ops {
        collector.apply(&op.operator, &op.operands);
    }

    Ok(collector.spans)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use pdfmark_core::links::Annotation;

    use super::super::backend::ContentOp;
    use super::*;

    /// Backend that serves pre-decoded operators for every page.
    pub(crate) struct MockBackend {
        pub page_ids: BTreeMap<u32, PageId>,
        pub ops: Vec<ContentOp>,
        pub annotations: Vec<Annotation>,
    }

    impl MockBackend {
        pub fn single_page(ops: Vec<ContentOp>) -> Self {
            Self {
                page_ids: BTreeMap::from([(1, (1, 0))]),
                ops,
                annotations: Vec::new(),
            }
        }
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            self.page_ids.clone()
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>, PdfError> {
            Ok(Vec::new())
        }

        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _page: PageId, _font_name: &[u8], data: &[u8]) -> String {
            decode_text_simple(data)
        }

        fn page_annotations(&self, _page: PageId) -> Result<Vec<Annotation>, PdfError> {
            Ok(self.annotations.clone())
        }
    }

    pub(crate) fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    pub(crate) fn tf(size: f32) -> ContentOp {
        op("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Real(size)])
    }

    pub(crate) fn tm(tx: f32, ty: f32) -> ContentOp {
        op(
            "Tm",
            [1.0, 0.0, 0.0, 1.0, tx, ty].into_iter().map(PdfValue::Real).collect(),
        )
    }

    pub(crate) fn cm(m: [f32; 6]) -> ContentOp {
        op("cm", m.into_iter().map(PdfValue::Real).collect())
    }

    pub(crate) fn td(tx: f32, ty: f32) -> ContentOp {
        op("Td", vec![PdfValue::Real(tx), PdfValue::Real(ty)])
    }

    pub(crate) fn tj(text: &str) -> ContentOp {
        op("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())])
    }

    fn spans(ops: Vec<ContentOp>) -> Vec<TextSpan> {
        extract_page_spans(&MockBackend::single_page(ops), (1, 0)).unwrap()
    }

    #[test]
    fn test_simple_tj() {
        let spans = spans(vec![op("BT", vec![]), tf(12.0), tm(72.0, 700.0), tj("Hello"), op("ET", vec![])]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Hello");
        assert_eq!((spans[0].x, spans[0].y), (72.0, 700.0));
        assert_eq!(spans[0].font_size, 12.0);
        // 5 narrow glyphs at 12pt.
        assert!((spans[0].width - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_hangul_is_full_width() {
        let spans = spans(vec![op("BT", vec![]), tf(10.0), tm(0.0, 0.0), tj("삼성전자")]);
        assert!((spans[0].width - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_consecutive_tj_advance_x() {
        let spans = spans(vec![op("BT", vec![]), tf(10.0), tm(50.0, 700.0), tj("ab"), tj("cd")]);
        assert_eq!(spans.len(), 2);
        assert!((spans[1].x - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_scaled_text_matrix() {
        let spans = spans(vec![
            op("BT", vec![]),
            tf(1.0),
            op(
                "Tm",
                [9.0, 0.0, 0.0, 9.0, 100.0, 500.0].into_iter().map(PdfValue::Real).collect(),
            ),
            tj("AB"),
        ]);
        assert_eq!(spans[0].font_size, 9.0);
        assert!((spans[0].width - 9.0).abs() < 0.01);
    }

    #[test]
    fn test_cm_scale_maps_to_page_space() {
        let spans = spans(vec![
            cm([0.5, 0.0, 0.0, 0.5, 0.0, 0.0]),
            op("BT", vec![]),
            tf(20.0),
            tm(200.0, 1400.0),
            tj("Linked"),
            op("ET", vec![]),
        ]);
        assert_eq!((spans[0].x, spans[0].y), (100.0, 700.0));
        assert_eq!(spans[0].font_size, 10.0);
        assert!((spans[0].width - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_cm_flip_keeps_bottom_left_origin() {
        let spans = spans(vec![
            cm([1.0, 0.0, 0.0, -1.0, 0.0, 800.0]),
            op("BT", vec![]),
            tf(12.0),
            tm(50.0, 100.0),
            tj("Top"),
            tm(50.0, 200.0),
            tj("Bottom"),
            op("ET", vec![]),
        ]);
        assert_eq!(spans[0].y, 700.0);
        assert_eq!(spans[1].y, 600.0);
        assert_eq!(spans[0].font_size, 12.0);
    }

    #[test]
    fn test_q_restores_ctm() {
        let spans = spans(vec![
            tf(12.0),
            op("q", vec![]),
            cm([1.0, 0.0, 0.0, 1.0, 100.0, 50.0]),
            op("BT", vec![]),
            tf(24.0),
            tm(10.0, 10.0),
            tj("inner"),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            tm(10.0, 10.0),
            tj("outer"),
            op("ET", vec![]),
        ]);
        assert_eq!((spans[0].x, spans[0].y), (110.0, 60.0));
        assert_eq!((spans[1].x, spans[1].y), (10.0, 10.0));
        assert_eq!(spans[1].font_size, 12.0);
    }

    #[test]
    fn test_unbalanced_restore_is_ignored() {
        let spans = spans(vec![op("Q", vec![]), op("BT", vec![]), tf(12.0), tm(5.0, 5.0), tj("x")]);
        assert_eq!((spans[0].x, spans[0].y), (5.0, 5.0));
    }

    #[test]
    fn test_tj_array_large_kerning_inserts_space() {
        let spans = spans(vec![
            op("BT", vec![]),
            tf(12.0),
            tm(72.0, 700.0),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    PdfValue::Str(b"Hello".to_vec()),
                    PdfValue::Integer(-500),
                    PdfValue::Str(b"World".to_vec()),
                    PdfValue::Integer(-10),
                    PdfValue::Str(b"!".to_vec()),
                ])],
            ),
        ]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Hello World!");
    }

    #[test]
    fn test_td_and_leading() {
        let spans = spans(vec![
            op("BT", vec![]),
            tf(12.0),
            op("TL", vec![PdfValue::Real(14.0)]),
            td(72.0, 700.0),
            tj("Line 1"),
            op("T*", vec![]),
            tj("Line 2"),
            op("'", vec![PdfValue::Str(b"Line 3".to_vec())]),
        ]);
        let ys: Vec<f32> = spans.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![700.0, 686.0, 672.0]);
        assert!(spans.iter().all(|s| s.x == 72.0));
    }

    #[test]
    fn test_capital_td_sets_leading() {
        let spans = spans(vec![
            op("BT", vec![]),
            tf(12.0),
            op("TD", vec![PdfValue::Real(72.0), PdfValue::Real(-14.0)]),
            tj("a"),
            op("T*", vec![]),
            tj("b"),
        ]);
        assert_eq!(spans[1].y, -28.0);
    }

    #[test]
    fn test_double_quote_operator() {
        let spans = spans(vec![
            op("BT", vec![]),
            tf(12.0),
            op("TL", vec![PdfValue::Real(14.0)]),
            td(72.0, 700.0),
            op(
                "\"",
                vec![PdfValue::Real(0.0), PdfValue::Real(0.0), PdfValue::Str(b"x".to_vec())],
            ),
        ]);
        assert_eq!(spans[0].text, "x");
        assert_eq!(spans[0].y, 686.0);
    }

    #[test]
    fn test_text_rise() {
        let spans = spans(vec![op("BT", vec![]), tf(12.0), tm(0.0, 100.0), op("Ts", vec![PdfValue::Real(3.0)]), tj("sup")]);
        assert_eq!(spans[0].y, 103.0);
    }

    #[test]
    fn test_bt_resets_matrix() {
        let spans = spans(vec![
            op("BT", vec![]),
            tf(12.0),
            td(72.0, 700.0),
            tj("first"),
            op("ET", vec![]),
            op("BT", vec![]),
            td(72.0, 600.0),
            tj("second"),
        ]);
        assert_eq!(spans[1].y, 600.0);
        assert_eq!(spans[1].font_size, 12.0);
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let spans = spans(vec![op("BT", vec![]), tf(12.0), tj(""), tj("   "), tj("visible")]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "visible");
    }

    #[test]
    fn test_into_raw_glyph_normalizes_text() {
        let span = TextSpan {
            text: "\u{FB01}nd\u{FFFD}".into(),
            x: 1.0,
            y: 2.0,
            width: 3.0,
            font_size: 11.0,
        };
        let glyph = span.into_raw_glyph();
        assert_eq!(glyph, RawGlyph::new("find", 1.0, 2.0, 3.0, 11.0));
    }
}
