use std::fmt;

use euclid::Transform2D;

pub struct FontUnits;
pub type Transform = Transform2D<f64, FontUnits, FontUnits>;

/// One outline point in font design units.
///
/// On-curve points lie on the rendered curve; off-curve points are quadratic
/// control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.on_curve as u8)
    }
}

/// One closed loop of points. The last point connects back to the first.
pub type Contour = Vec<Point>;

/// Coordinate range of one or more glyphs, endpoints inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// Horizontal metrics of a single glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HMetric {
    pub advance_width: u16,
    pub left_side_bearing: i16,
}

/// One glyph's full shape: its contours plus the bounding box recorded in
/// the glyph header. Glyphs without an outline (e.g. space) have zero
/// contours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphOutline {
    bounds: Bounds,
    contours: Vec<Contour>,
}

impl GlyphOutline {
    pub(crate) fn new(bounds: Bounds, contours: Vec<Contour>) -> GlyphOutline {
        GlyphOutline { bounds, contours }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Get a reference to the contours of this glyph.
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Consume self and return the contours.
    pub fn into_contours(self) -> Vec<Contour> {
        self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Total number of points across all contours.
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.len()).sum()
    }
}

impl fmt::Display for GlyphOutline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for contour in &self.contours {
            for point in contour {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}", point)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Output of whole-font outline extraction.
/// Contains one `GlyphOutline` per glyph index and can be rendered as the
/// classic one-line-per-glyph point dump or as a per-contour breakdown.
#[derive(Debug, Clone)]
pub struct OutlineOutput {
    glyphs: Vec<GlyphOutline>,
}

impl OutlineOutput {
    /// Get a reference to the extracted glyph outlines, indexed by glyph.
    pub fn glyphs(&self) -> &[GlyphOutline] {
        &self.glyphs
    }

    /// Consume self and return the glyph outlines.
    pub fn into_glyphs(self) -> Vec<GlyphOutline> {
        self.glyphs
    }

    /// Convert to a formatted string with one glyph per block and one
    /// contour per line, with glyph headers.
    pub fn to_string_pretty(&self) -> String {
        let mut output = String::new();

        for (index, glyph) in self.glyphs.iter().enumerate() {
            if glyph.is_empty() {
                output.push_str(&format!("glyph {}: (no outline)\n", index));
                continue;
            }

            output.push_str(&format!(
                "glyph {} ({} contours, {} points):\n",
                index,
                glyph.contours().len(),
                glyph.point_count()
            ));
            for contour in glyph.contours() {
                let mut line = String::new();
                for (i, point) in contour.iter().enumerate() {
                    if i > 0 {
                        line.push_str(", ");
                    }
                    line.push_str(&point.to_string());
                }
                output.push_str("  ");
                output.push_str(&line);
                output.push('\n');
            }
        }

        output
    }
}

impl fmt::Display for OutlineOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for glyph in &self.glyphs {
            writeln!(f, "{}", glyph)?;
        }
        Ok(())
    }
}

impl From<Vec<GlyphOutline>> for OutlineOutput {
    fn from(glyphs: Vec<GlyphOutline>) -> Self {
        OutlineOutput { glyphs }
    }
}
