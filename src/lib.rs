//! TrueType glyph outline extraction library
//!
//! This library decodes glyph outlines straight from a font file's binary
//! tables into contours of points in design units, handling simple and
//! composite glyphs, character-to-glyph lookup, and horizontal metrics.

mod charmap;
mod directory;
mod error;
mod extract;
mod glyf;
mod metrics;
mod outline;
mod reader;
mod types;

// Re-export error type
pub use error::FontError;

// Re-export extraction API
pub use extract::{
    DEFAULT_COMPOSITE_DEPTH_LIMIT, Font, FontExtractor, FontExtractorBuilder, from_bytes,
    from_path, from_reader,
};

// Re-export public types
pub use types::{Bounds, Contour, GlyphOutline, HMetric, OutlineOutput, Point};
