use std::ops::Range;

use tracing::debug;

use crate::error::FontError;
use crate::reader::Reader;

// A 32-bit encoding ID: most-significant 16 bits are the platform ID, the
// least-significant 16 the platform-specific ID.
const UNICODE_ENCODING: u32 = 0x0000_0003; // PID 0 (Unicode), PSID 3 (Unicode 2.0)
const MICROSOFT_ENCODING: u32 = 0x0003_0001; // PID 3 (Microsoft), PSID 1 (UCS-2)

const FORMAT_4: u16 = 4;

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: u16,
    end: u16,
    delta: u16,
    offset: u16,
}

/// Character-to-glyph mapping from a format 4 `cmap` subtable.
#[derive(Debug, Clone)]
pub(crate) struct Charmap {
    segments: Vec<Segment>,
    /// Absolute range of the glyph index array that follows the segment
    /// arrays.
    indexes: Range<usize>,
}

fn malformed(msg: impl Into<String>) -> FontError {
    FontError::MalformedDirectory(format!("cmap: {}", msg.into()))
}

pub(crate) fn parse(reader: Reader, cmap: &Range<usize>) -> Result<Charmap, FontError> {
    let n_subtables = reader.read_u16(cmap.start + 2)? as usize;

    // Prefer the Unicode encoding; keep scanning so it can override an
    // earlier Microsoft match.
    let mut chosen = None;
    for i in 0..n_subtables {
        let record = cmap.start + 4 + 8 * i;
        let pid_psid = reader.read_u32(record)?;
        let offset = reader.read_u32(record + 4)?;
        if pid_psid == UNICODE_ENCODING {
            chosen = Some(offset);
            break;
        } else if pid_psid == MICROSOFT_ENCODING {
            chosen = Some(offset);
        }
    }
    let offset = chosen.ok_or_else(|| malformed("no supported encoding"))? as usize;
    if offset == 0 || offset > cmap.len() {
        return Err(malformed(format!("bad subtable offset {}", offset)));
    }

    let sub = cmap.start + offset;
    let format = reader.read_u16(sub)?;
    if format != FORMAT_4 {
        return Err(malformed(format!("unsupported subtable format {}", format)));
    }
    let language = reader.read_u16(sub + 4)?;
    if language != 0 {
        return Err(malformed(format!("unsupported language {}", language)));
    }
    let seg_count_x2 = reader.read_u16(sub + 6)? as usize;
    if seg_count_x2 % 2 == 1 {
        return Err(malformed(format!("bad segCountX2 {}", seg_count_x2)));
    }
    let seg_count = seg_count_x2 / 2;

    // Four parallel segment arrays, with a reserved pad word after the end
    // codes; the glyph index array takes the rest of the table.
    let end_base = sub + 14;
    let start_base = end_base + seg_count_x2 + 2;
    let delta_base = start_base + seg_count_x2;
    let offset_base = delta_base + seg_count_x2;
    let indexes_start = offset_base + seg_count_x2;
    if indexes_start > cmap.end {
        return Err(malformed("segment arrays exceed table length"));
    }

    let mut segments = Vec::with_capacity(seg_count);
    for i in 0..seg_count {
        segments.push(Segment {
            end: reader.read_u16(end_base + 2 * i)?,
            start: reader.read_u16(start_base + 2 * i)?,
            delta: reader.read_u16(delta_base + 2 * i)?,
            offset: reader.read_u16(offset_base + 2 * i)?,
        });
    }
    debug!("cmap: format 4, {} segments", seg_count);

    Ok(Charmap {
        segments,
        indexes: indexes_start..cmap.end,
    })
}

impl Charmap {
    /// Glyph index for a character, 0 (.notdef) when unmapped. Format 4
    /// only covers the basic multilingual plane.
    pub(crate) fn glyph_index(&self, reader: Reader, c: char) -> u16 {
        let Ok(c) = u16::try_from(c as u32) else {
            return 0;
        };
        let n = self.segments.len();
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.start <= c && c <= segment.end {
                if segment.offset == 0 {
                    return c.wrapping_add(segment.delta);
                }
                // The offset is relative to its own position in the range
                // offset array, which sits 2 * (n - i) bytes before the
                // glyph index array.
                let relative = segment.offset as isize
                    + 2 * (i as isize - n as isize + (c - segment.start) as isize);
                if relative < 0 {
                    return 0;
                }
                let position = self.indexes.start + relative as usize;
                if position + 2 > self.indexes.end {
                    return 0;
                }
                let Ok(glyph) = reader.read_u16(position) else {
                    return 0;
                };
                if glyph == 0 {
                    return 0;
                }
                return glyph.wrapping_add(segment.delta);
            }
        }
        0
    }
}
