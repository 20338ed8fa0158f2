use std::ops::Range;

use crate::error::FontError;
use crate::reader::Reader;
use crate::types::HMetric;

const HHEA_LENGTH: usize = 36;
const KERN_HEADER_LENGTH: usize = 18;

/// Horizontal metrics from `hhea`/`hmtx`. Glyphs past `numberOfHMetrics`
/// share the last recorded advance width and store only a side bearing.
#[derive(Debug, Clone)]
pub(crate) struct HorizontalMetrics {
    hmtx_start: usize,
    n_metrics: u16,
    num_glyphs: u16,
}

pub(crate) fn parse_hmetrics(
    reader: Reader,
    hhea: &Range<usize>,
    hmtx: &Range<usize>,
    num_glyphs: u16,
) -> Result<HorizontalMetrics, FontError> {
    if hhea.len() != HHEA_LENGTH {
        return Err(FontError::MalformedDirectory(format!(
            "bad hhea length: {}",
            hhea.len()
        )));
    }
    let n_metrics = reader.read_u16(hhea.start + 34)?;
    if n_metrics == 0 {
        return Err(FontError::MalformedDirectory(
            "hhea reports no long metrics".to_string(),
        ));
    }
    let short_entries = (num_glyphs as usize)
        .checked_sub(n_metrics as usize)
        .ok_or_else(|| {
            FontError::MalformedDirectory(format!(
                "hhea reports {} long metrics for {} glyphs",
                n_metrics, num_glyphs
            ))
        })?;
    let expected = 4 * n_metrics as usize + 2 * short_entries;
    if hmtx.len() != expected {
        return Err(FontError::MalformedDirectory(format!(
            "bad hmtx length: {} (expected {})",
            hmtx.len(),
            expected
        )));
    }
    Ok(HorizontalMetrics {
        hmtx_start: hmtx.start,
        n_metrics,
        num_glyphs,
    })
}

impl HorizontalMetrics {
    pub(crate) fn h_metric(&self, reader: Reader, index: u16) -> Option<HMetric> {
        if index >= self.num_glyphs {
            return None;
        }
        if index >= self.n_metrics {
            let last = self.hmtx_start + 4 * (self.n_metrics as usize - 1);
            let bearing =
                self.hmtx_start + 4 * self.n_metrics as usize + 2 * (index - self.n_metrics) as usize;
            return Some(HMetric {
                advance_width: reader.read_u16(last).ok()?,
                left_side_bearing: reader.read_i16(bearing).ok()?,
            });
        }
        let entry = self.hmtx_start + 4 * index as usize;
        Some(HMetric {
            advance_width: reader.read_u16(entry).ok()?,
            left_side_bearing: reader.read_i16(entry + 2).ok()?,
        })
    }
}

/// Horizontal kerning pairs from a version 0 `kern` table. Only the single
/// subtable, coverage 0x0001 layout that Windows-compatible fonts carry is
/// recognized.
#[derive(Debug, Clone)]
pub(crate) struct KernTable {
    pairs_start: usize,
    n_pairs: usize,
}

pub(crate) fn parse_kern(reader: Reader, kern: &Range<usize>) -> Result<KernTable, FontError> {
    if kern.len() < KERN_HEADER_LENGTH {
        return Err(FontError::MalformedDirectory(
            "kern table too short".to_string(),
        ));
    }
    let version = reader.read_u16(kern.start)?;
    if version != 0 {
        return Err(FontError::MalformedDirectory(format!(
            "unsupported kern version {}",
            version
        )));
    }
    let n_tables = reader.read_u16(kern.start + 2)?;
    if n_tables != 1 {
        return Err(FontError::MalformedDirectory(format!(
            "unsupported kern table count {}",
            n_tables
        )));
    }
    let length = reader.read_u16(kern.start + 6)? as usize;
    let coverage = reader.read_u16(kern.start + 8)?;
    if coverage != 0x0001 {
        // Horizontal kerning only.
        return Err(FontError::MalformedDirectory(format!(
            "unsupported kern coverage 0x{:04x}",
            coverage
        )));
    }
    let n_pairs = reader.read_u16(kern.start + 10)? as usize;
    if length.checked_sub(14) != Some(6 * n_pairs)
        || KERN_HEADER_LENGTH + 6 * n_pairs > kern.len()
    {
        return Err(FontError::MalformedDirectory(format!(
            "bad kern table length {} for {} pairs",
            length, n_pairs
        )));
    }
    Ok(KernTable {
        pairs_start: kern.start + KERN_HEADER_LENGTH,
        n_pairs,
    })
}

impl KernTable {
    /// Kerning adjustment for a glyph pair; 0 when the pair is not listed.
    pub(crate) fn kerning(&self, reader: Reader, left: u16, right: u16) -> i16 {
        let key = (left as u32) << 16 | right as u32;
        let mut lo = 0;
        let mut hi = self.n_pairs;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let entry = self.pairs_start + 6 * mid;
            let Ok(pair) = reader.read_u32(entry) else {
                return 0;
            };
            if pair < key {
                lo = mid + 1;
            } else if pair > key {
                hi = mid;
            } else {
                return reader.read_i16(entry + 4).unwrap_or(0);
            }
        }
        0
    }
}
