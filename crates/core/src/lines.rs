//! Line reconstruction.
//!
//! Runs are read top-to-bottom, then left-to-right. A new line starts when the
//! rounded y coordinate jumps by more than [`LayoutConfig::line_gap`]; inside a
//! line a space is inserted when the horizontal gap exceeds
//! [`LayoutConfig::word_gap`].

use crate::config::LayoutConfig;
use crate::glyph::{GlyphIndex, GlyphRun};

/// Runs believed to share one visual line, plus the assembled string.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub runs: Vec<GlyphRun>,
    pub text: String,
}

/// Sorted view of a page's runs: descending `y`, then ascending `x`.
pub fn reading_order(index: &GlyphIndex) -> Vec<&GlyphRun> {
    let mut sorted: Vec<&GlyphRun> = index.runs().iter().collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
    sorted
}

/// Group a page's runs into ordered lines.
pub fn group_lines(index: &GlyphIndex, config: &LayoutConfig) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut last_y: Option<f64> = None;
    let mut last_x: Option<f64> = None;

    for run in reading_order(index) {
        let current_y = run.y.round();

        let starts_line = match last_y {
            None => true,
            Some(prev) => (current_y - prev).abs() > config.line_gap,
        };

        if starts_line {
            lines.push(Line {
                runs: Vec::new(),
                text: String::new(),
            });
        } else if let (Some(prev_right), Some(line)) = (last_x, lines.last_mut()) {
            let gap = run.x - prev_right;
            if gap > config.word_gap && !line.text.ends_with(char::is_whitespace) {
                line.text.push(' ');
            }
        }

        if let Some(line) = lines.last_mut() {
            line.text.push_str(&run.text);
            line.runs.push(run.clone());
        }

        last_y = Some(current_y);
        last_x = Some(run.right());
    }

    lines
}

/// Join lines with `\n` and trim the result.
pub fn page_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Reconstruct one page: ordered lines and their joined text.
pub fn reconstruct(index: &GlyphIndex, config: &LayoutConfig) -> (Vec<Line>, String) {
    let lines = group_lines(index, config);
    let text = page_text(&lines);
    (lines, text)
}
