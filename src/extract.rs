use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::charmap::{self, Charmap};
use crate::directory::{self, FontDirectory};
use crate::error::FontError;
use crate::glyf::GlyphSource;
use crate::metrics::{self, HorizontalMetrics, KernTable};
use crate::outline::OutlineBuilder;
use crate::reader::Reader;
use crate::types::{Bounds, GlyphOutline, HMetric, OutlineOutput};

/// Default limit on nested composite glyph references.
pub const DEFAULT_COMPOSITE_DEPTH_LIMIT: u32 = 8;

/// Builder for configuring outline extraction options.
///
/// # Examples
///
/// ```no_run
/// use glyph_points::FontExtractor;
///
/// // With a tighter composite nesting limit
/// let output = FontExtractor::builder()
///     .composite_depth_limit(4)
///     .build()
///     .from_path("font.ttf")?;
/// # Ok::<(), glyph_points::FontError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FontExtractorBuilder {
    composite_depth_limit: u32,
}

impl FontExtractorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum depth of nested composite glyph references.
    pub fn composite_depth_limit(mut self, limit: u32) -> Self {
        self.composite_depth_limit = limit;
        self
    }

    /// Build the extractor configuration.
    pub fn build(self) -> FontExtractor {
        FontExtractor {
            composite_depth_limit: self.composite_depth_limit,
        }
    }
}

impl Default for FontExtractorBuilder {
    fn default() -> Self {
        FontExtractorBuilder {
            composite_depth_limit: DEFAULT_COMPOSITE_DEPTH_LIMIT,
        }
    }
}

/// Whole-font outline extractor with configuration options.
///
/// # Examples
///
/// ```no_run
/// use glyph_points::FontExtractor;
///
/// // Simple extraction
/// let output = FontExtractor::default().from_path("font.ttf")?;
/// println!("{}", output);
///
/// // Pretty formatted output
/// println!("{}", output.to_string_pretty());
///
/// // Access structured data
/// for (index, glyph) in output.glyphs().iter().enumerate() {
///     println!("glyph {}: {} points in {:?}", index, glyph.point_count(), glyph.bounds());
/// }
/// # Ok::<(), glyph_points::FontError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FontExtractor {
    composite_depth_limit: u32,
}

impl Default for FontExtractor {
    fn default() -> Self {
        FontExtractorBuilder::default().build()
    }
}

impl FontExtractor {
    /// Create a builder for configuring extraction options.
    pub fn builder() -> FontExtractorBuilder {
        FontExtractorBuilder::new()
    }

    /// Extract every glyph outline from a font file at the given path.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<OutlineOutput, FontError> {
        let bytes = fs::read(path)?;
        self.from_bytes(&bytes)
    }

    /// Extract every glyph outline from a font in memory.
    pub fn from_bytes(self, bytes: &[u8]) -> Result<OutlineOutput, FontError> {
        let font = Font::with_composite_depth_limit(bytes, self.composite_depth_limit)?;
        let mut glyphs = Vec::with_capacity(font.num_glyphs() as usize);
        for index in 0..font.num_glyphs() {
            glyphs.push(font.extract_glyph(index)?);
        }
        Ok(OutlineOutput::from(glyphs))
    }

    /// Extract every glyph outline from a font reader.
    pub fn from_reader<R: Read>(self, mut reader: R) -> Result<OutlineOutput, FontError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.from_bytes(&bytes)
    }
}

/// A loaded TrueType font.
///
/// Borrows the font buffer for its whole lifetime and never mutates after
/// construction, so a `Font` can be shared freely for concurrent read-only
/// extraction.
#[derive(Debug, Clone)]
pub struct Font<'a> {
    reader: Reader<'a>,
    directory: FontDirectory,
    charmap: Option<Charmap>,
    hmetrics: Option<HorizontalMetrics>,
    kern: Option<KernTable>,
    composite_depth_limit: u32,
}

impl<'a> Font<'a> {
    /// Parse the table directory of an in-memory font and fail fast on any
    /// structural problem with the required tables.
    pub fn new(buffer: &'a [u8]) -> Result<Font<'a>, FontError> {
        Self::with_composite_depth_limit(buffer, DEFAULT_COMPOSITE_DEPTH_LIMIT)
    }

    pub fn with_composite_depth_limit(
        buffer: &'a [u8],
        composite_depth_limit: u32,
    ) -> Result<Font<'a>, FontError> {
        let reader = Reader::new(buffer);
        let directory = directory::parse(reader)?;

        // Only head/maxp/loca/glyf gate loading; a broken optional table
        // disables its accessor instead of failing the font.
        let charmap = match &directory.cmap {
            Some(range) => match charmap::parse(reader, range) {
                Ok(charmap) => Some(charmap),
                Err(e) => {
                    warn!("ignoring cmap table: {}", e);
                    None
                }
            },
            None => None,
        };
        let hmetrics = match (&directory.hhea, &directory.hmtx) {
            (Some(hhea), Some(hmtx)) => {
                match metrics::parse_hmetrics(reader, hhea, hmtx, directory.num_glyphs) {
                    Ok(hmetrics) => Some(hmetrics),
                    Err(e) => {
                        warn!("ignoring horizontal metrics: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };
        let kern = match &directory.kern {
            Some(range) => match metrics::parse_kern(reader, range) {
                Ok(kern) => Some(kern),
                Err(e) => {
                    warn!("ignoring kern table: {}", e);
                    None
                }
            },
            None => None,
        };

        debug!(
            "font loaded: {} glyphs, cmap: {}, hmtx: {}, kern: {}",
            directory.num_glyphs,
            charmap.is_some(),
            hmetrics.is_some(),
            kern.is_some()
        );

        Ok(Font {
            reader,
            directory,
            charmap,
            hmetrics,
            kern,
            composite_depth_limit,
        })
    }

    /// Number of glyphs in the font.
    pub fn num_glyphs(&self) -> u16 {
        self.directory.num_glyphs
    }

    /// Number of design units in the font's em square.
    pub fn units_per_em(&self) -> u16 {
        self.directory.units_per_em
    }

    /// Union of all glyph bounding boxes, as recorded in the font header.
    pub fn bounds(&self) -> Bounds {
        self.directory.bounds
    }

    /// Glyph index for a character, 0 (.notdef) when the character is
    /// unmapped or the font has no usable character map.
    pub fn glyph_index(&self, c: char) -> u16 {
        match &self.charmap {
            Some(charmap) => charmap.glyph_index(self.reader, c),
            None => 0,
        }
    }

    /// Horizontal metrics for a glyph, `None` when the font carries no
    /// usable metrics tables or the index is out of range.
    pub fn h_metric(&self, index: u16) -> Option<HMetric> {
        self.hmetrics
            .as_ref()
            .and_then(|m| m.h_metric(self.reader, index))
    }

    /// Horizontal kerning adjustment for a glyph pair, 0 when the font has
    /// no usable kern table or the pair is not listed.
    pub fn kerning(&self, left: u16, right: u16) -> i16 {
        match &self.kern {
            Some(kern) => kern.kerning(self.reader, left, right),
            None => 0,
        }
    }

    /// Extract one glyph's outline: locate its record, decode it, and
    /// flatten any composite structure into plain contours.
    pub fn extract_glyph(&self, index: u16) -> Result<GlyphOutline, FontError> {
        let source = GlyphSource::new(self.reader, &self.directory);
        OutlineBuilder::new(source, self.composite_depth_limit).build(index)
    }
}

/// Extract every glyph outline from a font file using default settings.
///
/// This is a convenience function equivalent to
/// `FontExtractor::default().from_path(path)`.
///
/// # Examples
///
/// ```no_run
/// let output = glyph_points::from_path("font.ttf")?;
/// println!("{}", output);
/// # Ok::<(), glyph_points::FontError>(())
/// ```
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<OutlineOutput, FontError> {
    FontExtractor::default().from_path(path)
}

/// Extract every glyph outline from a font in memory using default
/// settings.
///
/// This is a convenience function equivalent to
/// `FontExtractor::default().from_bytes(bytes)`.
///
/// # Examples
///
/// ```no_run
/// let bytes = std::fs::read("font.ttf")?;
/// let output = glyph_points::from_bytes(&bytes)?;
/// println!("{}", output);
/// # Ok::<(), glyph_points::FontError>(())
/// ```
pub fn from_bytes(bytes: &[u8]) -> Result<OutlineOutput, FontError> {
    FontExtractor::default().from_bytes(bytes)
}

/// Extract every glyph outline from a font reader using default settings.
///
/// This is a convenience function equivalent to
/// `FontExtractor::default().from_reader(reader)`.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
///
/// let file = File::open("font.ttf")?;
/// let output = glyph_points::from_reader(file)?;
/// println!("{}", output);
/// # Ok::<(), glyph_points::FontError>(())
/// ```
pub fn from_reader<R: Read>(reader: R) -> Result<OutlineOutput, FontError> {
    FontExtractor::default().from_reader(reader)
}
