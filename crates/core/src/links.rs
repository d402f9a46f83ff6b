//! Hyperlink association.
//!
//! A PDF link annotation carries a rectangle and a URL but no text. We recover
//! the anchor text by collecting the glyph runs that sit inside the
//! (padded) rectangle.

use serde::{Deserialize, Serialize};

use crate::glyph::{GlyphIndex, GlyphRun};

/// Annotation subtype that carries a hyperlink.
pub const LINK_SUBTYPE: &str = "Link";

/// A page annotation as reported by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub subtype: String,
    pub rect: Vec<f64>,
    pub url: Option<String>,
}

impl Annotation {
    pub fn link(rect: [f64; 4], url: impl Into<String>) -> Self {
        Self {
            subtype: LINK_SUBTYPE.to_string(),
            rect: rect.to_vec(),
            url: Some(url.into()),
        }
    }

    /// The URL, when this is a usable hyperlink annotation.
    fn link_target(&self) -> Option<&str> {
        if self.subtype != LINK_SUBTYPE || self.rect.len() < 4 {
            return None;
        }
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// A link annotation paired with the text it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub text: String,
    pub url: String,
    pub rect: [f64; 4],
}

#[derive(Debug, Clone, Copy)]
struct SearchBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl SearchBox {
    fn new(rect: &[f64], padding: f64) -> Self {
        let (x1, y1, x2, y2) = (rect[0], rect[1], rect[2], rect[3]);
        Self {
            min_x: x1.min(x2) - padding,
            min_y: y1.min(y2) - padding,
            max_x: x1.max(x2) + padding,
            max_y: y1.max(y2) + padding,
        }
    }

    /// The run's vertical center must fall inside the box. Horizontally a run
    /// may start up to one run-width before the box.
    fn contains(&self, run: &GlyphRun) -> bool {
        let center = run.center_y();
        center >= self.min_y
            && center <= self.max_y
            && run.x >= self.min_x - run.width
            && run.x <= self.max_x
    }
}

/// Resolve one annotation against a page's runs.
///
/// Returns `None` for non-link annotations, missing URLs, short rectangles,
/// and rectangles with no text underneath.
pub fn resolve(annotation: &Annotation, index: &GlyphIndex, padding: f64) -> Option<ResolvedLink> {
    let url = annotation.link_target()?;
    let search = SearchBox::new(&annotation.rect, padding);

    let mut covered: Vec<&GlyphRun> = index.runs().iter().filter(|r| search.contains(r)).collect();
    covered.sort_by(|a, b| a.x.total_cmp(&b.x));

    let text: String = covered.iter().map(|r| r.text.as_str()).collect();
    let text = text.trim();

    if text.is_empty() {
        log::debug!("link annotation for {url} covers no text, dropping");
        return None;
    }

    Some(ResolvedLink {
        text: text.to_string(),
        url: url.to_string(),
        rect: [
            annotation.rect[0],
            annotation.rect[1],
            annotation.rect[2],
            annotation.rect[3],
        ],
    })
}

/// Resolve every usable link annotation on a page, in annotation order.
pub fn associate(annotations: &[Annotation], index: &GlyphIndex, padding: f64) -> Vec<ResolvedLink> {
    annotations
        .iter()
        .filter_map(|a| resolve(a, index, padding))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f64, y: f64, width: f64) -> GlyphRun {
        GlyphRun {
            text: text.to_string(),
            x,
            y,
            width,
            height: 10.0,
        }
    }

    fn page() -> GlyphIndex {
        GlyphIndex::from_runs(vec![
            run("전자", 140.0, 700.0, 40.0),
            run("삼성", 100.0, 700.0, 40.0),
            run("목표가", 200.0, 700.0, 60.0),
            run("아래줄", 100.0, 650.0, 60.0),
        ])
    }

    #[test]
    fn test_collects_covered_runs_in_x_order() {
        let link = Annotation::link([100.0, 700.0, 180.0, 710.0], "https://ex.com");
        let resolved = resolve(&link, &page(), 5.0).unwrap();
        assert_eq!(resolved.text, "삼성전자");
        assert_eq!(resolved.url, "https://ex.com");
        assert_eq!(resolved.rect, [100.0, 700.0, 180.0, 710.0]);
    }

    #[test]
    fn test_inverted_rectangle_is_normalized() {
        let link = Annotation::link([180.0, 710.0, 100.0, 700.0], "https://ex.com");
        let resolved = resolve(&link, &page(), 5.0).unwrap();
        assert_eq!(resolved.text, "삼성전자");
    }

    #[test]
    fn test_run_starting_one_width_before_box_matches() {
        let index = GlyphIndex::from_runs(vec![run("ab", 80.0, 700.0, 20.0)]);
        // min_x = 100 - 5 = 95; run may start at 95 - 20 = 75.
        let link = Annotation::link([100.0, 700.0, 150.0, 710.0], "https://x");
        assert_eq!(resolve(&link, &index, 5.0).unwrap().text, "ab");
    }

    #[test]
    fn test_non_link_annotation_is_ignored() {
        let mut note = Annotation::link([100.0, 700.0, 180.0, 710.0], "https://ex.com");
        note.subtype = "Text".into();
        assert!(resolve(&note, &page(), 5.0).is_none());
    }

    #[test]
    fn test_missing_or_empty_url_is_ignored() {
        let mut link = Annotation::link([100.0, 700.0, 180.0, 710.0], "");
        assert!(resolve(&link, &page(), 5.0).is_none());
        link.url = None;
        assert!(resolve(&link, &page(), 5.0).is_none());
    }

    #[test]
    fn test_short_rect_is_ignored() {
        let link = Annotation {
            subtype: LINK_SUBTYPE.into(),
            rect: vec![1.0, 2.0, 3.0],
            url: Some("https://x".into()),
        };
        assert!(resolve(&link, &page(), 5.0).is_none());
    }

    #[test]
    fn test_rect_over_empty_area_is_dropped() {
        let link = Annotation::link([400.0, 100.0, 450.0, 110.0], "https://x");
        assert!(resolve(&link, &page(), 5.0).is_none());
    }

    #[test]
    fn test_whitespace_only_match_is_dropped() {
        let index = GlyphIndex::from_runs(vec![run("   ", 100.0, 700.0, 10.0)]);
        let link = Annotation::link([100.0, 700.0, 110.0, 710.0], "https://x");
        assert!(resolve(&link, &index, 5.0).is_none());
    }

    #[test]
    fn test_associate_keeps_annotation_order() {
        let links = vec![
            Annotation::link([200.0, 700.0, 260.0, 710.0], "https://b"),
            Annotation::link([400.0, 100.0, 450.0, 110.0], "https://missing"),
            Annotation::link([100.0, 650.0, 160.0, 660.0], "https://c"),
        ];
        let resolved = associate(&links, &page(), 5.0);
        let urls: Vec<&str> = resolved.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b", "https://c"]);
        assert_eq!(resolved[0].text, "목표가");
        assert_eq!(resolved[1].text, "아래줄");
    }
}
