use serde::{Deserialize, Serialize};

/// Fixed spatial thresholds, in page units.
///
/// These are not scaled by font size. Pages set in very large or very small
/// type may over- or under-segment lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// A vertical jump strictly larger than this starts a new line.
    pub line_gap: f64,
    /// A horizontal gap strictly larger than this inserts a space.
    pub word_gap: f64,
    /// Padding added on every side of a link annotation's rectangle.
    pub link_padding: f64,
}

impl LayoutConfig {
    pub const DEFAULT_LINE_GAP: f64 = 5.0;
    pub const DEFAULT_WORD_GAP: f64 = 5.0;
    pub const DEFAULT_LINK_PADDING: f64 = 5.0;
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_gap: Self::DEFAULT_LINE_GAP,
            word_gap: Self::DEFAULT_WORD_GAP,
            link_padding: Self::DEFAULT_LINK_PADDING,
        }
    }
}
