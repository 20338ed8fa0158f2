use std::ops::Range;

use tracing::debug;

use crate::error::FontError;
use crate::reader::Reader;
use crate::types::Bounds;

/// sfnt version tag for TrueType outlines. CFF-flavored fonts (`OTTO`) and
/// the legacy Apple tags carry no `glyf` table and are rejected up front.
const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;

const HEAD_LENGTH: usize = 54;
const MAXP_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocaFormat {
    Short,
    Long,
}

impl LocaFormat {
    pub(crate) fn entry_width(self) -> usize {
        match self {
            LocaFormat::Short => 2,
            LocaFormat::Long => 4,
        }
    }
}

/// Table locations and the load-time values derived from `head` and `maxp`.
/// Built once per font; immutable afterwards.
#[derive(Debug, Clone)]
pub(crate) struct FontDirectory {
    pub(crate) glyf: Range<usize>,
    pub(crate) loca: Range<usize>,
    pub(crate) cmap: Option<Range<usize>>,
    pub(crate) hhea: Option<Range<usize>>,
    pub(crate) hmtx: Option<Range<usize>>,
    pub(crate) kern: Option<Range<usize>>,
    pub(crate) loca_format: LocaFormat,
    pub(crate) num_glyphs: u16,
    pub(crate) units_per_em: u16,
    pub(crate) bounds: Bounds,
}

fn missing(table: &str) -> FontError {
    FontError::MalformedDirectory(format!("required table '{}' is missing", table))
}

pub(crate) fn parse(reader: Reader) -> Result<FontDirectory, FontError> {
    let version = reader.read_u32(0)?;
    if version != SFNT_VERSION_TRUETYPE {
        return Err(FontError::UnsupportedFormat(version));
    }
    let num_tables = reader.read_u16(4)? as usize;

    let mut glyf = None;
    let mut loca = None;
    let mut head = None;
    let mut maxp = None;
    let mut cmap = None;
    let mut hhea = None;
    let mut hmtx = None;
    let mut kern = None;

    for i in 0..num_tables {
        let record = 12 + 16 * i;
        let tag = reader.read_tag(record)?;
        let offset = reader.read_u32(record + 8)? as usize;
        let length = reader.read_u32(record + 12)? as usize;
        let end = offset.checked_add(length).filter(|&end| end <= reader.len());
        let Some(end) = end else {
            return Err(FontError::MalformedDirectory(format!(
                "table '{}' range {}+{} exceeds buffer length {}",
                String::from_utf8_lossy(&tag),
                offset,
                length,
                reader.len()
            )));
        };
        let range = offset..end;
        debug!(
            "table '{}' at {}..{}",
            String::from_utf8_lossy(&tag),
            range.start,
            range.end
        );
        match &tag {
            b"glyf" => glyf = Some(range),
            b"loca" => loca = Some(range),
            b"head" => head = Some(range),
            b"maxp" => maxp = Some(range),
            b"cmap" => cmap = Some(range),
            b"hhea" => hhea = Some(range),
            b"hmtx" => hmtx = Some(range),
            b"kern" => kern = Some(range),
            _ => {}
        }
    }

    let glyf = glyf.ok_or_else(|| missing("glyf"))?;
    let loca = loca.ok_or_else(|| missing("loca"))?;
    let head = head.ok_or_else(|| missing("head"))?;
    let maxp = maxp.ok_or_else(|| missing("maxp"))?;

    if head.len() != HEAD_LENGTH {
        return Err(FontError::MalformedDirectory(format!(
            "bad head length: {}",
            head.len()
        )));
    }
    let units_per_em = reader.read_u16(head.start + 18)?;
    let bounds = Bounds {
        x_min: reader.read_i16(head.start + 36)?,
        y_min: reader.read_i16(head.start + 38)?,
        x_max: reader.read_i16(head.start + 40)?,
        y_max: reader.read_i16(head.start + 42)?,
    };
    let loca_format = match reader.read_u16(head.start + 50)? {
        0 => LocaFormat::Short,
        1 => LocaFormat::Long,
        other => {
            return Err(FontError::MalformedDirectory(format!(
                "bad indexToLocFormat: {}",
                other
            )));
        }
    };

    if maxp.len() != MAXP_LENGTH {
        return Err(FontError::MalformedDirectory(format!(
            "bad maxp length: {}",
            maxp.len()
        )));
    }
    let num_glyphs = reader.read_u16(maxp.start + 4)?;

    // loca must hold numGlyphs + 1 entries so every glyph has a closing
    // offset.
    let needed = (num_glyphs as usize + 1) * loca_format.entry_width();
    if loca.len() < needed {
        return Err(FontError::MalformedDirectory(format!(
            "bad loca length: {} (need {} for {} glyphs)",
            loca.len(),
            needed,
            num_glyphs
        )));
    }

    debug!(
        "directory parsed: {} glyphs, {} units per em, {:?} loca",
        num_glyphs, units_per_em, loca_format
    );

    Ok(FontDirectory {
        glyf,
        loca,
        cmap,
        hhea,
        hmtx,
        kern,
        loca_format,
        num_glyphs,
        units_per_em,
        bounds,
    })
}
