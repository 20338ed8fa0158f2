use std::ops::Range;

use tracing::trace;

use crate::directory::{FontDirectory, LocaFormat};
use crate::error::FontError;
use crate::reader::{Cursor, Reader};
use crate::types::{Bounds, Contour, Point, Transform};

// Simple glyph flag bits.
const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT_FLAG: u8 = 0x08;
// 0x10 and 0x20 carry two meanings: the delta sign when the matching
// short-vector bit is set, same-as-previous when it is not.
const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

// Composite component flag bits.
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// F2Dot14 fixed point: sign and one integer bit, then 14 fraction bits.
fn f2dot14(raw: i16) -> f64 {
    raw as f64 / 16384.0
}

/// One reference from a composite glyph to a component glyph.
#[derive(Debug, Clone)]
pub(crate) struct Component {
    pub(crate) glyph_index: u16,
    pub(crate) transform: Transform,
}

/// A decoded glyph record. The signed contour count in the wire format is
/// the variant tag: non-negative means simple, -1 means composite.
#[derive(Debug, Clone)]
pub(crate) enum GlyphRecord {
    Simple {
        bounds: Bounds,
        contours: Vec<Contour>,
    },
    Composite {
        bounds: Bounds,
        components: Vec<Component>,
    },
}

/// Read access to the `glyf` table, addressed through `loca`.
#[derive(Debug, Clone)]
pub(crate) struct GlyphSource<'a> {
    reader: Reader<'a>,
    glyf: Range<usize>,
    loca: Range<usize>,
    loca_format: LocaFormat,
    num_glyphs: u16,
}

impl<'a> GlyphSource<'a> {
    pub(crate) fn new(reader: Reader<'a>, directory: &FontDirectory) -> GlyphSource<'a> {
        GlyphSource {
            reader,
            glyf: directory.glyf.clone(),
            loca: directory.loca.clone(),
            loca_format: directory.loca_format,
            num_glyphs: directory.num_glyphs,
        }
    }

    /// Byte range of one glyph's record within the font buffer. An empty
    /// range is valid and means the glyph has no outline.
    pub(crate) fn glyph_range(&self, index: u16) -> Result<Range<usize>, FontError> {
        if index >= self.num_glyphs {
            return Err(FontError::InvalidGlyphIndex(index));
        }
        let (start, end) = match self.loca_format {
            LocaFormat::Short => {
                let entry = self.loca.start + 2 * index as usize;
                (
                    2 * self.reader.read_u16(entry)? as usize,
                    2 * self.reader.read_u16(entry + 2)? as usize,
                )
            }
            LocaFormat::Long => {
                let entry = self.loca.start + 4 * index as usize;
                (
                    self.reader.read_u32(entry)? as usize,
                    self.reader.read_u32(entry + 4)? as usize,
                )
            }
        };
        if start > end || end > self.glyf.len() {
            return Err(FontError::MalformedDirectory(format!(
                "loca entries for glyph {} are inconsistent: {}..{} in a {} byte glyf table",
                index,
                start,
                end,
                self.glyf.len()
            )));
        }
        Ok(self.glyf.start + start..self.glyf.start + end)
    }

    /// Decode one glyph's record, or `None` for glyphs without an outline.
    pub(crate) fn record(&self, index: u16) -> Result<Option<GlyphRecord>, FontError> {
        let range = self.glyph_range(index)?;
        if range.is_empty() {
            return Ok(None);
        }
        let bytes = self.reader.slice(range.start, range.len())?;
        decode_record(Reader::new(bytes)).map(Some)
    }
}

pub(crate) fn decode_record(record: Reader) -> Result<GlyphRecord, FontError> {
    let mut cursor = Cursor::new(record);
    let contour_count = cursor.take_i16()?;
    let bounds = Bounds {
        x_min: cursor.take_i16()?,
        y_min: cursor.take_i16()?,
        x_max: cursor.take_i16()?,
        y_max: cursor.take_i16()?,
    };
    if contour_count >= 0 {
        decode_simple(cursor, contour_count as usize, bounds)
    } else if contour_count == -1 {
        decode_composite(cursor, bounds)
    } else {
        // -2 and below are reserved.
        Err(FontError::MalformedGlyphRecord(format!(
            "negative contour count {}",
            contour_count
        )))
    }
}

fn decode_simple(
    mut cursor: Cursor,
    contour_count: usize,
    bounds: Bounds,
) -> Result<GlyphRecord, FontError> {
    let mut end_points = Vec::with_capacity(contour_count);
    let mut previous: Option<u16> = None;
    for _ in 0..contour_count {
        let end = cursor.take_u16()?;
        if previous.is_some_and(|p| end < p) {
            return Err(FontError::MalformedGlyphRecord(format!(
                "contour end points are not non-decreasing: {} after {}",
                end,
                previous.unwrap_or(0)
            )));
        }
        previous = Some(end);
        end_points.push(end);
    }
    let point_count = end_points.last().map_or(0, |&e| e as usize + 1);

    // Hinting instructions are length-read and skipped; this engine only
    // produces unhinted geometry.
    let instruction_len = cursor.take_u16()? as usize;
    cursor.skip(instruction_len)?;

    let flags = decode_flags(&mut cursor, point_count)?;
    let xs = decode_deltas(&mut cursor, &flags, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE)?;
    let ys = decode_deltas(&mut cursor, &flags, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE)?;

    let mut contours = Vec::with_capacity(contour_count);
    let mut start = 0;
    for &end in &end_points {
        let end = end as usize + 1;
        let contour = (start..end)
            .map(|i| Point {
                x: xs[i],
                y: ys[i],
                on_curve: flags[i] & ON_CURVE_POINT != 0,
            })
            .collect();
        contours.push(contour);
        start = end;
    }
    trace!(
        "simple glyph: {} contours, {} points",
        contours.len(),
        point_count
    );
    Ok(GlyphRecord::Simple { bounds, contours })
}

/// Expand the run-length encoded flags array to one byte per point.
fn decode_flags(cursor: &mut Cursor, point_count: usize) -> Result<Vec<u8>, FontError> {
    let mut flags = Vec::with_capacity(point_count);
    while flags.len() < point_count {
        let flag = cursor.take_u8()?;
        flags.push(flag);
        if flag & REPEAT_FLAG != 0 {
            let count = cursor.take_u8()? as usize;
            if flags.len() + count > point_count {
                return Err(FontError::MalformedGlyphRecord(format!(
                    "flag repeat run of {} spills past {} points",
                    count, point_count
                )));
            }
            for _ in 0..count {
                flags.push(flag);
            }
        }
    }
    Ok(flags)
}

/// Decode one axis of delta-encoded coordinates. Each flag selects a 0, 1
/// or 2 byte delta; absolute values accumulate from 0 with wrapping 16-bit
/// arithmetic.
fn decode_deltas(
    cursor: &mut Cursor,
    flags: &[u8],
    short_bit: u8,
    same_or_positive_bit: u8,
) -> Result<Vec<i16>, FontError> {
    let mut coords = Vec::with_capacity(flags.len());
    let mut value: i16 = 0;
    for &flag in flags {
        if flag & short_bit != 0 {
            let delta = cursor.take_u8()? as i16;
            value = if flag & same_or_positive_bit != 0 {
                value.wrapping_add(delta)
            } else {
                value.wrapping_sub(delta)
            };
        } else if flag & same_or_positive_bit == 0 {
            value = value.wrapping_add(cursor.take_i16()?);
        }
        coords.push(value);
    }
    Ok(coords)
}

fn decode_composite(mut cursor: Cursor, bounds: Bounds) -> Result<GlyphRecord, FontError> {
    let mut components = Vec::new();
    loop {
        let flags = cursor.take_u16()?;
        let glyph_index = cursor.take_u16()?;
        let (dx, dy) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            (cursor.take_i16()?, cursor.take_i16()?)
        } else {
            (cursor.take_i8()? as i16, cursor.take_i8()? as i16)
        };
        if flags & ARGS_ARE_XY_VALUES == 0 {
            // The args are point numbers to align, not offsets.
            return Err(FontError::UnsupportedComponentMatching(glyph_index));
        }
        let (a, b, c, d) = if flags & WE_HAVE_A_SCALE != 0 {
            let scale = f2dot14(cursor.take_i16()?);
            (scale, 0.0, 0.0, scale)
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            let x_scale = f2dot14(cursor.take_i16()?);
            let y_scale = f2dot14(cursor.take_i16()?);
            (x_scale, 0.0, 0.0, y_scale)
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            // File order: xscale, scale01, scale10, yscale.
            let a = f2dot14(cursor.take_i16()?);
            let b = f2dot14(cursor.take_i16()?);
            let c = f2dot14(cursor.take_i16()?);
            let d = f2dot14(cursor.take_i16()?);
            (a, b, c, d)
        } else {
            (1.0, 0.0, 0.0, 1.0)
        };
        trace!(
            "component {}: offset ({}, {}), matrix [{} {} {} {}]",
            glyph_index, dx, dy, a, b, c, d
        );
        components.push(Component {
            glyph_index,
            transform: Transform::new(a, b, c, d, dx as f64, dy as f64),
        });
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    trace!(
        "composite glyph: {} components in {} bytes",
        components.len(),
        cursor.pos()
    );
    Ok(GlyphRecord::Composite { bounds, components })
}
