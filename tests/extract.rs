//! End-to-end extraction tests against synthetic fonts assembled
//! byte-by-byte: a table directory plus head/maxp/loca/glyf, and optional
//! cmap/hhea/hmtx/kern tables.

use glyph_points::{Font, FontError, FontExtractor, Point};

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

// Simple glyph flag: bit 0 is on-curve. Deltas are always emitted as
// words, so no short-vector bits are needed.
const ON_CURVE: u8 = 0x01;

// Composite component flags.
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;

fn simple_glyph(contours: &[&[(i16, i16, bool)]]) -> Vec<u8> {
    let points: Vec<(i16, i16, bool)> = contours.concat();
    let mut rec = Vec::new();
    push_i16(&mut rec, contours.len() as i16);
    push_i16(&mut rec, points.iter().map(|p| p.0).min().unwrap_or(0));
    push_i16(&mut rec, points.iter().map(|p| p.1).min().unwrap_or(0));
    push_i16(&mut rec, points.iter().map(|p| p.0).max().unwrap_or(0));
    push_i16(&mut rec, points.iter().map(|p| p.1).max().unwrap_or(0));
    let mut end = 0u16;
    for contour in contours {
        end += contour.len() as u16;
        push_u16(&mut rec, end - 1);
    }
    push_u16(&mut rec, 0); // no instructions
    for &(_, _, on_curve) in &points {
        rec.push(if on_curve { ON_CURVE } else { 0 });
    }
    let mut x = 0i16;
    for &(px, _, _) in &points {
        push_i16(&mut rec, px - x);
        x = px;
    }
    let mut y = 0i16;
    for &(_, py, _) in &points {
        push_i16(&mut rec, py - y);
        y = py;
    }
    rec
}

/// Composite record from (component index, dx, dy, optional raw F2Dot14
/// uniform scale) triples.
fn composite_glyph(components: &[(u16, i16, i16, Option<i16>)]) -> Vec<u8> {
    let mut rec = Vec::new();
    push_i16(&mut rec, -1);
    for _ in 0..4 {
        push_i16(&mut rec, 0);
    }
    for (i, &(glyph, dx, dy, scale)) in components.iter().enumerate() {
        let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
        if scale.is_some() {
            flags |= WE_HAVE_A_SCALE;
        }
        if i + 1 < components.len() {
            flags |= MORE_COMPONENTS;
        }
        push_u16(&mut rec, flags);
        push_u16(&mut rec, glyph);
        push_i16(&mut rec, dx);
        push_i16(&mut rec, dy);
        if let Some(scale) = scale {
            push_i16(&mut rec, scale);
        }
    }
    rec
}

fn head_table(long_loca: bool) -> Vec<u8> {
    let mut head = vec![0u8; 54];
    head[18..20].copy_from_slice(&1000u16.to_be_bytes()); // unitsPerEm
    head[40..42].copy_from_slice(&1000i16.to_be_bytes()); // xMax
    head[42..44].copy_from_slice(&1000i16.to_be_bytes()); // yMax
    head[50..52].copy_from_slice(&(long_loca as u16).to_be_bytes());
    head
}

fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut maxp = vec![0u8; 32];
    maxp[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    maxp[4..6].copy_from_slice(&num_glyphs.to_be_bytes());
    maxp
}

/// Concatenate glyph records into a glyf table (records padded to even
/// offsets) and the matching loca table.
fn glyf_and_loca(glyphs: &[Vec<u8>], long_loca: bool) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut offsets = vec![0usize];
    for rec in glyphs {
        glyf.extend_from_slice(rec);
        if glyf.len() % 2 == 1 {
            glyf.push(0);
        }
        offsets.push(glyf.len());
    }
    let mut loca = Vec::new();
    for &offset in &offsets {
        if long_loca {
            push_u32(&mut loca, offset as u32);
        } else {
            push_u16(&mut loca, (offset / 2) as u16);
        }
    }
    (glyf, loca)
}

fn build_font_from_tables(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let base = 12 + 16 * tables.len();
    let mut font = Vec::new();
    push_u32(&mut font, 0x0001_0000);
    push_u16(&mut font, tables.len() as u16);
    for _ in 0..3 {
        push_u16(&mut font, 0); // binary search fields, unused here
    }
    let mut data = Vec::new();
    for (tag, bytes) in tables {
        font.extend_from_slice(tag);
        push_u32(&mut font, 0); // checksum
        push_u32(&mut font, (base + data.len()) as u32);
        push_u32(&mut font, bytes.len() as u32);
        data.extend_from_slice(bytes);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }
    font.extend_from_slice(&data);
    font
}

fn build_font(glyphs: &[Vec<u8>], long_loca: bool) -> Vec<u8> {
    let (glyf, loca) = glyf_and_loca(glyphs, long_loca);
    build_font_from_tables(&[
        (*b"head", head_table(long_loca)),
        (*b"maxp", maxp_table(glyphs.len() as u16)),
        (*b"loca", loca),
        (*b"glyf", glyf),
    ])
}

fn triangle() -> Vec<u8> {
    simple_glyph(&[&[(0, 0, true), (100, 0, true), (50, 100, true)]])
}

fn points(contour: &[Point]) -> Vec<(i16, i16, bool)> {
    contour.iter().map(|p| (p.x, p.y, p.on_curve)).collect()
}

#[test_log::test]
fn triangle_extracts_in_order() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let font = Font::new(&font_data).unwrap();
    let outline = font.extract_glyph(1).unwrap();

    assert_eq!(outline.contours().len(), 1);
    assert_eq!(
        points(&outline.contours()[0]),
        vec![(0, 0, true), (100, 0, true), (50, 100, true)]
    );
    assert_eq!(outline.to_string(), "0 0 1, 100 0 1, 50 100 1");
    let bounds = outline.bounds();
    assert_eq!(
        (bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max),
        (0, 0, 100, 100)
    );
}

#[test_log::test]
fn contour_point_counts_follow_end_points() {
    let glyph = simple_glyph(&[
        &[(0, 0, true), (100, 0, true), (50, 100, false)],
        &[(10, 10, true), (20, 10, true), (20, 20, true), (10, 20, true)],
    ]);
    let font_data = build_font(&[Vec::new(), glyph], false);
    let font = Font::new(&font_data).unwrap();
    let outline = font.extract_glyph(1).unwrap();

    let lens: Vec<usize> = outline.contours().iter().map(|c| c.len()).collect();
    assert_eq!(lens, vec![3, 4]);
    assert_eq!(outline.point_count(), 7);
    assert!(!outline.contours()[0][2].on_curve);
}

#[test_log::test]
fn empty_loca_range_is_an_empty_outline() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let font = Font::new(&font_data).unwrap();
    let outline = font.extract_glyph(0).unwrap();
    assert!(outline.is_empty());
    assert_eq!(outline.point_count(), 0);
}

#[test_log::test]
fn index_at_num_glyphs_is_invalid() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.num_glyphs(), 2);
    assert!(matches!(
        font.extract_glyph(2),
        Err(FontError::InvalidGlyphIndex(2))
    ));
}

#[test_log::test]
fn repeated_extraction_is_deterministic() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let font = Font::new(&font_data).unwrap();
    let first = font.extract_glyph(1).unwrap();
    let second = font.extract_glyph(1).unwrap();
    assert_eq!(first, second);
}

#[test_log::test]
fn short_and_long_loca_agree() {
    let glyphs = vec![Vec::new(), triangle(), composite_glyph(&[(1, 10, 20, None)])];
    let short = build_font(&glyphs, false);
    let long = build_font(&glyphs, true);
    let short_font = Font::new(&short).unwrap();
    let long_font = Font::new(&long).unwrap();
    for index in 0..3 {
        assert_eq!(
            short_font.extract_glyph(index).unwrap(),
            long_font.extract_glyph(index).unwrap()
        );
    }
}

#[test_log::test]
fn composite_translation_shifts_component() {
    let glyphs = vec![Vec::new(), triangle(), composite_glyph(&[(1, 10, 20, None)])];
    let font_data = build_font(&glyphs, false);
    let font = Font::new(&font_data).unwrap();

    let base = font.extract_glyph(1).unwrap();
    let composite = font.extract_glyph(2).unwrap();
    assert_eq!(composite.contours().len(), base.contours().len());
    for (flat, original) in composite.contours()[0].iter().zip(&base.contours()[0]) {
        assert_eq!(flat.x, original.x + 10);
        assert_eq!(flat.y, original.y + 20);
        assert_eq!(flat.on_curve, original.on_curve);
    }
}

#[test_log::test]
fn composite_scale_applies_f2dot14() {
    // 0x2000 is 0.5 in F2Dot14.
    let glyphs = vec![Vec::new(), triangle(), composite_glyph(&[(1, 0, 0, Some(0x2000))])];
    let font_data = build_font(&glyphs, false);
    let font = Font::new(&font_data).unwrap();

    let outline = font.extract_glyph(2).unwrap();
    assert_eq!(
        points(&outline.contours()[0]),
        vec![(0, 0, true), (50, 0, true), (25, 50, true)]
    );
}

#[test_log::test]
fn composite_concatenates_components_in_order() {
    let glyphs = vec![
        Vec::new(),
        triangle(),
        composite_glyph(&[(1, 0, 0, None), (1, 200, 0, None)]),
    ];
    let font_data = build_font(&glyphs, false);
    let font = Font::new(&font_data).unwrap();

    let outline = font.extract_glyph(2).unwrap();
    assert_eq!(outline.contours().len(), 2);
    assert_eq!(outline.contours()[0][0], Point { x: 0, y: 0, on_curve: true });
    assert_eq!(outline.contours()[1][0], Point { x: 200, y: 0, on_curve: true });
}

#[test_log::test]
fn self_referencing_composite_hits_depth_limit() {
    let glyphs = vec![Vec::new(), composite_glyph(&[(1, 0, 0, None)])];
    let font_data = build_font(&glyphs, false);
    let font = Font::new(&font_data).unwrap();
    assert!(matches!(
        font.extract_glyph(1),
        Err(FontError::CompositeRecursionTooDeep(8))
    ));
}

#[test_log::test]
fn depth_limit_is_configurable() {
    // Glyph 3 -> glyph 2 -> glyph 1 (simple): three levels of resolution.
    let glyphs = vec![
        Vec::new(),
        triangle(),
        composite_glyph(&[(1, 0, 0, None)]),
        composite_glyph(&[(2, 0, 0, None)]),
    ];
    let font_data = build_font(&glyphs, false);

    let shallow = Font::with_composite_depth_limit(&font_data, 2).unwrap();
    assert!(matches!(
        shallow.extract_glyph(3),
        Err(FontError::CompositeRecursionTooDeep(2))
    ));

    let deep = Font::with_composite_depth_limit(&font_data, 3).unwrap();
    assert_eq!(deep.extract_glyph(3).unwrap().point_count(), 3);
}

#[test_log::test]
fn point_matching_placement_is_unsupported() {
    let mut rec = Vec::new();
    push_i16(&mut rec, -1);
    for _ in 0..4 {
        push_i16(&mut rec, 0);
    }
    push_u16(&mut rec, 0); // ARGS_ARE_XY_VALUES clear: point numbers
    push_u16(&mut rec, 1);
    rec.extend_from_slice(&[0, 1]);
    let glyphs = vec![Vec::new(), triangle(), rec];
    let font_data = build_font(&glyphs, false);
    let font = Font::new(&font_data).unwrap();
    assert!(matches!(
        font.extract_glyph(2),
        Err(FontError::UnsupportedComponentMatching(1))
    ));
}

#[test_log::test]
fn whole_font_extraction_renders_one_line_per_glyph() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let output = FontExtractor::default().from_bytes(&font_data).unwrap();

    assert_eq!(output.glyphs().len(), 2);
    assert_eq!(output.to_string(), "\n0 0 1, 100 0 1, 50 100 1\n");
    assert!(output.to_string_pretty().contains("glyph 0: (no outline)"));
}

#[test_log::test]
fn builder_depth_limit_reaches_extraction() {
    let glyphs = vec![Vec::new(), composite_glyph(&[(1, 0, 0, None)])];
    let font_data = build_font(&glyphs, false);
    let result = FontExtractor::builder()
        .composite_depth_limit(3)
        .build()
        .from_bytes(&font_data);
    assert!(matches!(
        result,
        Err(FontError::CompositeRecursionTooDeep(3))
    ));
}

#[test_log::test]
fn bad_version_tag_is_unsupported() {
    let mut font_data = build_font(&[Vec::new()], false);
    font_data[0..4].copy_from_slice(b"OTTO");
    assert!(matches!(
        Font::new(&font_data),
        Err(FontError::UnsupportedFormat(0x4f54_544f))
    ));
}

#[test_log::test]
fn missing_required_table_is_malformed() {
    let (glyf, loca) = glyf_and_loca(&[Vec::new()], false);
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"loca", loca),
        (*b"glyf", glyf),
    ]);
    assert!(matches!(
        Font::new(&font_data),
        Err(FontError::MalformedDirectory(_))
    ));
}

#[test_log::test]
fn table_range_past_buffer_is_malformed() {
    let mut font_data = build_font(&[Vec::new()], false);
    // Inflate the first table record's length field past the buffer.
    let length_field = 12 + 12;
    font_data[length_field..length_field + 4].copy_from_slice(&0xffff_0000u32.to_be_bytes());
    assert!(matches!(
        Font::new(&font_data),
        Err(FontError::MalformedDirectory(_))
    ));
}

#[test_log::test]
fn truncated_buffer_is_out_of_bounds() {
    let font_data = build_font(&[Vec::new()], false);
    assert!(matches!(
        Font::new(&font_data[..8]),
        Err(FontError::OutOfBounds { .. })
    ));
}

#[test_log::test]
fn decreasing_loca_entries_are_malformed() {
    let (glyf, _) = glyf_and_loca(&[triangle(), Vec::new()], false);
    let mut loca = Vec::new();
    push_u16(&mut loca, (glyf.len() / 2) as u16);
    push_u16(&mut loca, 0);
    push_u16(&mut loca, 0);
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"maxp", maxp_table(2)),
        (*b"loca", loca),
        (*b"glyf", glyf),
    ]);
    let font = Font::new(&font_data).unwrap();
    assert!(matches!(
        font.extract_glyph(0),
        Err(FontError::MalformedDirectory(_))
    ));
}

#[test_log::test]
fn font_header_values_are_cached() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.units_per_em(), 1000);
    let bounds = font.bounds();
    assert_eq!((bounds.x_max, bounds.y_max), (1000, 1000));
}

// --- Optional table supplements ---

fn cmap_table(segments: &[(u16, u16, u16)]) -> Vec<u8> {
    // One Microsoft UCS-2 subtable, format 4, offset-0 segments only.
    let mut cmap = Vec::new();
    push_u16(&mut cmap, 0); // version
    push_u16(&mut cmap, 1); // one subtable
    push_u32(&mut cmap, 0x0003_0001);
    push_u32(&mut cmap, 12); // subtable offset
    let seg_count = segments.len() as u16;
    push_u16(&mut cmap, 4); // format
    push_u16(&mut cmap, 16 + 8 * seg_count); // length
    push_u16(&mut cmap, 0); // language
    push_u16(&mut cmap, seg_count * 2);
    for _ in 0..3 {
        push_u16(&mut cmap, 0); // search fields
    }
    for &(_, end, _) in segments {
        push_u16(&mut cmap, end);
    }
    push_u16(&mut cmap, 0); // reserved pad
    for &(start, _, _) in segments {
        push_u16(&mut cmap, start);
    }
    for &(_, _, delta) in segments {
        push_u16(&mut cmap, delta);
    }
    for _ in segments {
        push_u16(&mut cmap, 0); // idRangeOffset
    }
    cmap
}

#[test_log::test]
fn charmap_maps_characters_to_glyphs() {
    let (glyf, loca) = glyf_and_loca(&[Vec::new(), triangle(), triangle()], false);
    // 'A'..='B' map to glyphs 1..=2.
    let segments = [
        (0x41, 0x42, 1u16.wrapping_sub(0x41)),
        (0xffff, 0xffff, 1),
    ];
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"maxp", maxp_table(3)),
        (*b"loca", loca),
        (*b"glyf", glyf),
        (*b"cmap", cmap_table(&segments)),
    ]);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.glyph_index('A'), 1);
    assert_eq!(font.glyph_index('B'), 2);
    assert_eq!(font.glyph_index('Z'), 0);
    assert_eq!(font.glyph_index('€'), 0);
}

#[test_log::test]
fn charmap_resolves_range_offsets_into_index_array() {
    let (glyf, loca) = glyf_and_loca(&[Vec::new()], false);
    // Hand-encoded subtable: '0'..='1' resolve through idRangeOffset into
    // the glyph index array instead of a delta.
    let mut cmap = Vec::new();
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 1);
    push_u32(&mut cmap, 0x0003_0001);
    push_u32(&mut cmap, 12);
    push_u16(&mut cmap, 4); // format
    push_u16(&mut cmap, 36); // length
    push_u16(&mut cmap, 0); // language
    push_u16(&mut cmap, 4); // segCountX2
    for _ in 0..3 {
        push_u16(&mut cmap, 0); // search fields
    }
    push_u16(&mut cmap, 0x31); // end codes
    push_u16(&mut cmap, 0xffff);
    push_u16(&mut cmap, 0); // reserved pad
    push_u16(&mut cmap, 0x30); // start codes
    push_u16(&mut cmap, 0xffff);
    push_u16(&mut cmap, 0); // deltas
    push_u16(&mut cmap, 1);
    push_u16(&mut cmap, 4); // idRangeOffset for segment 0
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 5); // glyph index array
    push_u16(&mut cmap, 7);
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"maxp", maxp_table(1)),
        (*b"loca", loca),
        (*b"glyf", glyf),
        (*b"cmap", cmap),
    ]);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.glyph_index('0'), 5);
    assert_eq!(font.glyph_index('1'), 7);
    assert_eq!(font.glyph_index('2'), 0);
}

#[test_log::test]
fn broken_charmap_degrades_to_notdef() {
    let (glyf, loca) = glyf_and_loca(&[Vec::new()], false);
    let mut cmap = cmap_table(&[(0xffff, 0xffff, 1)]);
    cmap[12] = 0xff; // clobber the subtable format
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"maxp", maxp_table(1)),
        (*b"loca", loca),
        (*b"glyf", glyf),
        (*b"cmap", cmap),
    ]);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.glyph_index('A'), 0);
}

fn hhea_table(n_metrics: u16) -> Vec<u8> {
    let mut hhea = vec![0u8; 36];
    hhea[34..36].copy_from_slice(&n_metrics.to_be_bytes());
    hhea
}

#[test_log::test]
fn h_metrics_apply_trailing_run_rule() {
    let (glyf, loca) = glyf_and_loca(&[Vec::new(), triangle(), triangle()], false);
    // Two long metrics, one trailing side bearing.
    let mut hmtx = Vec::new();
    push_u16(&mut hmtx, 500);
    push_i16(&mut hmtx, 10);
    push_u16(&mut hmtx, 600);
    push_i16(&mut hmtx, 20);
    push_i16(&mut hmtx, 30);
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"maxp", maxp_table(3)),
        (*b"loca", loca),
        (*b"glyf", glyf),
        (*b"hhea", hhea_table(2)),
        (*b"hmtx", hmtx),
    ]);
    let font = Font::new(&font_data).unwrap();

    let m0 = font.h_metric(0).unwrap();
    assert_eq!((m0.advance_width, m0.left_side_bearing), (500, 10));
    let m1 = font.h_metric(1).unwrap();
    assert_eq!((m1.advance_width, m1.left_side_bearing), (600, 20));
    // Past numberOfHMetrics: the last advance width carries over.
    let m2 = font.h_metric(2).unwrap();
    assert_eq!((m2.advance_width, m2.left_side_bearing), (600, 30));
    assert!(font.h_metric(3).is_none());
}

fn kern_table(pairs: &[(u16, u16, i16)]) -> Vec<u8> {
    let mut kern = Vec::new();
    push_u16(&mut kern, 0); // version
    push_u16(&mut kern, 1); // one subtable
    push_u16(&mut kern, 0); // subtable version
    push_u16(&mut kern, 14 + 6 * pairs.len() as u16); // subtable length
    push_u16(&mut kern, 0x0001); // horizontal coverage
    push_u16(&mut kern, pairs.len() as u16);
    for _ in 0..3 {
        push_u16(&mut kern, 0); // search fields
    }
    for &(left, right, value) in pairs {
        push_u16(&mut kern, left);
        push_u16(&mut kern, right);
        push_i16(&mut kern, value);
    }
    kern
}

#[test_log::test]
fn kerning_finds_listed_pairs() {
    let (glyf, loca) = glyf_and_loca(&[Vec::new(), triangle(), triangle()], false);
    // Pairs sorted by (left << 16 | right).
    let font_data = build_font_from_tables(&[
        (*b"head", head_table(false)),
        (*b"maxp", maxp_table(3)),
        (*b"loca", loca),
        (*b"glyf", glyf),
        (*b"kern", kern_table(&[(1, 2, -30), (2, 1, 15)])),
    ]);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.kerning(1, 2), -30);
    assert_eq!(font.kerning(2, 1), 15);
    assert_eq!(font.kerning(1, 1), 0);
}

#[test_log::test]
fn fonts_without_optional_tables_still_extract() {
    let font_data = build_font(&[Vec::new(), triangle()], false);
    let font = Font::new(&font_data).unwrap();
    assert_eq!(font.glyph_index('A'), 0);
    assert!(font.h_metric(1).is_none());
    assert_eq!(font.kerning(1, 2), 0);
    assert_eq!(font.extract_glyph(1).unwrap().point_count(), 3);
}
