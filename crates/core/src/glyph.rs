//! Glyph-run normalization.
//!
//! Decoders hand us loosely shaped runs (zero widths, missing heights, empty
//! strings). [`GlyphIndex::build`] turns them into [`GlyphRun`]s with a
//! bounding box in page coordinates: origin bottom-left, y increasing upward.
//! Nothing downstream flips that convention.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Height assumed for runs whose decoder did not report one.
pub const DEFAULT_GLYPH_HEIGHT: f64 = 12.0;

/// A glyph run exactly as the external decoder reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGlyph {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RawGlyph {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }
}

/// Axis-aligned rectangle `[x1, y1, x2, y2]` in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    pub fn as_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// A normalized glyph run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GlyphRun {
    pub fn bbox(&self) -> BBox {
        BBox {
            x1: self.x,
            y1: self.y,
            x2: self.x + self.width,
            y2: self.y + self.height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Vertical center of the run.
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// The normalized runs of a single page, in decoder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphIndex {
    runs: Vec<GlyphRun>,
}

impl GlyphIndex {
    /// Normalize the decoder's runs for `page`.
    ///
    /// Runs with empty text are dropped. Widths that are negative or not
    /// finite become `0.0`; heights that are not positive become
    /// [`DEFAULT_GLYPH_HEIGHT`]. A run whose origin is not finite cannot be
    /// placed at all and fails the page.
    pub fn build(page: usize, raw: Vec<RawGlyph>) -> Result<Self, ConvertError> {
        let mut runs = Vec::with_capacity(raw.len());

        for glyph in raw {
            if glyph.text.is_empty() {
                continue;
            }
            if !glyph.x.is_finite() || !glyph.y.is_finite() {
                return Err(ConvertError::MalformedGlyph {
                    page,
                    reason: format!(
                        "run {:?} has a non-finite origin ({}, {})",
                        glyph.text, glyph.x, glyph.y
                    ),
                });
            }

            let width = if glyph.width.is_finite() && glyph.width > 0.0 {
                glyph.width
            } else {
                0.0
            };
            let height = if glyph.height.is_finite() && glyph.height > 0.0 {
                glyph.height
            } else {
                DEFAULT_GLYPH_HEIGHT
            };

            runs.push(GlyphRun {
                text: glyph.text,
                x: glyph.x,
                y: glyph.y,
                width,
                height,
            });
        }

        Ok(Self { runs })
    }

    pub fn from_runs(runs: Vec<GlyphRun>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[GlyphRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
