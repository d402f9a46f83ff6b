use std::collections::BTreeMap;

use lopdf::content::Content;
use pdfmark_core::links::Annotation;

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// A lopdf-independent PDF value, so the span extractor can be tested
/// without building real documents.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`]. Stream bodies are dropped.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => PdfValue::Dict(
            dict.iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect(),
        ),
        lopdf::Object::Stream(stream) => PdfValue::Dict(
            stream
                .dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect(),
        ),
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

/// Best-effort decoding of raw PDF string bytes.
///
/// UTF-16BE with a BOM first, then UTF-8, then Latin-1 byte-for-byte.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Abstraction over the PDF parser so the span extractor and annotation
/// handling can run against mocks.
pub trait PdfBackend {
    /// Mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Raw (possibly compressed) content stream bytes.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode string bytes from a text-showing operator using whatever
    /// encoding the page's font declares.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Every annotation in the page's `/Annots` array.
    fn page_annotations(&self, page: PageId) -> Result<Vec<Annotation>, PdfError>;
}

/// [`PdfBackend`] backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from memory. Encrypted documents are rejected.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: lopdf::Document) -> Result<Self, PdfError> {
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Follow one level of indirection.
    fn resolve<'a>(&'a self, obj: &'a lopdf::Object) -> Option<&'a lopdf::Object> {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn number(&self, obj: &lopdf::Object) -> Option<f64> {
        match self.resolve(obj)? {
            lopdf::Object::Integer(i) => Some(*i as f64),
            lopdf::Object::Real(f) => Some(*f as f64),
            _ => None,
        }
    }

    fn font_encoding_name(&self, page: PageId, font_name: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font_dict = fonts.get(font_name)?;
        match font_dict.get(b"Encoding").ok()? {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }

    /// `/A << /S /URI /URI (...) >>`. Other action types carry no URL.
    fn link_uri(&self, annot: &lopdf::Dictionary) -> Option<String> {
        let action = self.resolve(annot.get(b"A").ok()?)?.as_dict().ok()?;
        match action.get(b"S").ok()? {
            lopdf::Object::Name(kind) if kind == b"URI" => {}
            _ => return None,
        }
        match self.resolve(action.get(b"URI").ok()?)? {
            lopdf::Object::String(bytes, _) => Some(decode_text_simple(bytes)),
            _ => None,
        }
    }

    fn annotation(&self, annot: &lopdf::Dictionary) -> Option<Annotation> {
        let subtype = match annot.get(b"Subtype").ok()? {
            lopdf::Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            _ => return None,
        };

        let rect = annot
            .get(b"Rect")
            .ok()
            .and_then(|obj| self.resolve(obj))
            .and_then(|obj| obj.as_array().ok())
            .map(|arr| arr.iter().filter_map(|v| self.number(v)).collect())
            .unwrap_or_default();

        Some(Annotation {
            subtype,
            rect,
            url: self.link_uri(annot),
        })
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {e}")))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {e}")))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        // Identity-H/V fonts use 2-byte codes; try them as UTF-16BE first.
        let identity = self
            .font_encoding_name(page, font_name)
            .is_some_and(|enc| enc.contains("Identity"));

        if identity && bytes.len() >= 2 && bytes.len().is_multiple_of(2) {
            let code_units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            let decoded = String::from_utf16_lossy(&code_units);
            if !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                return decoded;
            }
        }

        decode_text_simple(bytes)
    }

    fn page_annotations(&self, page: PageId) -> Result<Vec<Annotation>, PdfError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(|o| o.as_dict())
            .map_err(|e| PdfError::Parse(format!("cannot get page dictionary: {e}")))?;

        let Ok(annots) = page_dict.get(b"Annots") else {
            return Ok(Vec::new());
        };

        let annots = self
            .resolve(annots)
            .and_then(|o| o.as_array().ok())
            .ok_or_else(|| PdfError::Parse("/Annots is not an array".into()))?;

        Ok(annots
            .iter()
            .filter_map(|entry| self.resolve(entry))
            .filter_map(|obj| obj.as_dict().ok())
            .filter_map(|dict| self.annotation(dict))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Dictionary, Document, Object, StringFormat};

    use super::*;

    #[test]
    fn decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("삼성전자".as_bytes()), "삼성전자");
    }

    #[test]
    fn decode_text_simple_latin1() {
        // 0xE9 is U+00E9 in Latin-1 but not valid standalone UTF-8.
        assert_eq!(decode_text_simple(&[0x63, 0x61, 0x66, 0xE9]), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be() {
        // BOM + U+C0BC U+C131 ("삼성").
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0xC0, 0xBC, 0xC1, 0x31]), "삼성");
    }

    #[test]
    fn decode_text_simple_utf16be_odd_trailing_byte() {
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41, 0x00]), "A");
    }

    #[test]
    fn decode_text_simple_empty() {
        assert_eq!(decode_text_simple(&[]), "");
    }

    #[test]
    fn get_number_accepts_integer_and_real() {
        assert_eq!(get_number_from_value(&PdfValue::Integer(42)), Some(42.0));
        assert_eq!(get_number_from_value(&PdfValue::Real(2.5)), Some(2.5));
        assert_eq!(get_number_from_value(&PdfValue::Name(b"F1".to_vec())), None);
    }

    #[test]
    fn convert_nested_objects() {
        let obj = Object::Array(vec![
            Object::Integer(1),
            Object::String(b"hi".to_vec(), StringFormat::Literal),
            Object::Reference((7, 0)),
        ]);
        assert_eq!(
            convert_object(&obj),
            PdfValue::Array(vec![
                PdfValue::Integer(1),
                PdfValue::Str(b"hi".to_vec()),
                PdfValue::Reference((7, 0)),
            ])
        );
    }

    fn rect(values: [i64; 4]) -> Object {
        Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
    }

    fn uri_action(url: &str) -> Object {
        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set("URI", Object::String(url.as_bytes().to_vec(), StringFormat::Literal));
        Object::Dictionary(action)
    }

    fn annotation_dict(subtype: &str, rect_obj: Object, action: Option<Object>) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Annot".to_vec()));
        dict.set("Subtype", Object::Name(subtype.as_bytes().to_vec()));
        dict.set("Rect", rect_obj);
        if let Some(action) = action {
            dict.set("A", action);
        }
        dict
    }

    /// A document holding one page dictionary with the given annotations.
    fn page_with_annotations(annots: Vec<Dictionary>) -> (LopdfBackend, PageId) {
        let mut doc = Document::with_version("1.5");
        let refs: Vec<Object> = annots
            .into_iter()
            .map(|a| Object::Reference(doc.add_object(Object::Dictionary(a))))
            .collect();

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Annots", Object::Array(refs));
        let page_id = doc.add_object(Object::Dictionary(page));

        (LopdfBackend::from_document(doc).unwrap(), page_id)
    }

    #[test]
    fn page_annotations_reads_uri_links() {
        let (backend, page) = page_with_annotations(vec![annotation_dict(
            "Link",
            rect([50, 718, 98, 732]),
            Some(uri_action("https://ex.com")),
        )]);

        let annots = backend.page_annotations(page).unwrap();
        assert_eq!(
            annots,
            vec![Annotation {
                subtype: "Link".into(),
                rect: vec![50.0, 718.0, 98.0, 732.0],
                url: Some("https://ex.com".into()),
            }]
        );
    }

    #[test]
    fn page_annotations_keeps_non_uri_annotations_without_url() {
        let mut goto = Dictionary::new();
        goto.set("S", Object::Name(b"GoTo".to_vec()));
        let (backend, page) = page_with_annotations(vec![
            annotation_dict("Text", rect([0, 0, 10, 10]), None),
            annotation_dict("Link", rect([0, 0, 10, 10]), Some(Object::Dictionary(goto))),
        ]);

        let annots = backend.page_annotations(page).unwrap();
        assert_eq!(annots.len(), 2);
        assert_eq!(annots[0].subtype, "Text");
        assert!(annots.iter().all(|a| a.url.is_none()));
    }

    #[test]
    fn page_annotations_resolves_indirect_action() {
        let mut doc = Document::with_version("1.5");
        let action_id = doc.add_object(uri_action("https://indirect.example"));
        let annot = annotation_dict("Link", rect([1, 2, 3, 4]), Some(Object::Reference(action_id)));
        let annot_id = doc.add_object(Object::Dictionary(annot));

        let mut page = Dictionary::new();
        page.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        let page_id = doc.add_object(Object::Dictionary(page));

        let backend = LopdfBackend::from_document(doc).unwrap();
        let annots = backend.page_annotations(page_id).unwrap();
        assert_eq!(annots[0].url.as_deref(), Some("https://indirect.example"));
    }

    #[test]
    fn page_without_annots_is_empty() {
        let (backend, page) = page_with_annotations(vec![]);
        assert!(backend.page_annotations(page).unwrap().is_empty());
    }

    #[test]
    fn load_bytes_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
