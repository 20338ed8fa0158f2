use euclid::point2;
use tracing::trace;

use crate::error::FontError;
use crate::glyf::{GlyphRecord, GlyphSource};
use crate::types::{Bounds, Contour, GlyphOutline, Point, Transform};

/// Flattens glyph records into final outlines, resolving composite glyphs
/// through depth-limited recursion.
#[derive(Debug)]
pub(crate) struct OutlineBuilder<'a> {
    source: GlyphSource<'a>,
    depth_limit: u32,
}

impl<'a> OutlineBuilder<'a> {
    pub(crate) fn new(source: GlyphSource<'a>, depth_limit: u32) -> OutlineBuilder<'a> {
        OutlineBuilder {
            source,
            depth_limit,
        }
    }

    pub(crate) fn build(&self, index: u16) -> Result<GlyphOutline, FontError> {
        let (bounds, contours) = self.resolve(index, 0)?;
        Ok(GlyphOutline::new(bounds, contours))
    }

    /// Resolve one glyph to flat contours. The explicit depth counter caps
    /// cyclic or pathological component chains.
    fn resolve(&self, index: u16, depth: u32) -> Result<(Bounds, Vec<Contour>), FontError> {
        if depth >= self.depth_limit {
            return Err(FontError::CompositeRecursionTooDeep(self.depth_limit));
        }
        match self.source.record(index)? {
            None => Ok((Bounds::default(), Vec::new())),
            Some(GlyphRecord::Simple { bounds, contours }) => Ok((bounds, contours)),
            Some(GlyphRecord::Composite { bounds, components }) => {
                let mut flattened = Vec::new();
                for component in &components {
                    let (_, contours) = self.resolve(component.glyph_index, depth + 1)?;
                    trace!(
                        "flattening component {} of glyph {}: {} contours",
                        component.glyph_index,
                        index,
                        contours.len()
                    );
                    flattened.extend(
                        contours
                            .into_iter()
                            .map(|c| transform_contour(&component.transform, c)),
                    );
                }
                Ok((bounds, flattened))
            }
        }
    }
}

fn transform_contour(transform: &Transform, contour: Contour) -> Contour {
    contour
        .into_iter()
        .map(|p| transform_point(transform, p))
        .collect()
}

/// Map one point through a component transform, rounding back to design
/// units. Translation-only transforms stay exact.
fn transform_point(transform: &Transform, point: Point) -> Point {
    let mapped = transform.transform_point(point2(point.x as f64, point.y as f64));
    Point {
        x: mapped.x.round() as i16,
        y: mapped.y.round() as i16,
        on_curve: point.on_curve,
    }
}
