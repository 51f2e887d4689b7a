//! Serializers: encoded ranges → "ftbw" blob, Rust source module, "case" container.
//!
//! Blob layout (little-endian):
//!   "ftbw", u8 typecase version=2, u8 font version=4,
//!   u8 width, u8 height, u8 min/max x advance, u8 baseline x/y, u8 line height,
//!   u8 flags, u16 fallback, pascal full name, pascal short name,
//!   u8 range_count,
//!   range_count × { u16 first, u16 count, u8 offset_x, u8 offset_y,
//!                   u8 height_bytes, u8 height_pixels, u8 width,
//!                   u32 widths_off, u32 offsets_off, u32 glyphs_off },
//!   per range: widths (u8 each), offsets (u16 each), glyph data.

use std::fmt::Write as _;

use anyhow::{bail, Context};
use bitfont::{
  CharRange, FontFlags, KerningPair, Span, BWFONT_VERSION, BW_MAGIC, RANGE_RECORD_LEN, TYPECASE_MAGIC, TYPECASE_VERSION,
};
use log::debug;

use crate::crop::{crop_box, crop_glyph, CropBox};
use crate::pack::encode_glyph;
use crate::ranges::{compute_char_ranges, Limits, RangePlan};
use crate::source::{GlyphEntry, SourceFont};

/// Fixed header bytes before the names.
const HDR_PREFIX_LEN: usize = 4 + 2 + 8 + 2;

// ──────────────────────────────────────────────────────────────────────────────
// encoded model
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRange {
  pub first_char: u16,
  pub char_count: u16,
  pub crop: CropBox,
  /// Shared advance, or 0 when `widths`/`offsets` carry per-glyph values.
  pub width: u8,
  pub widths: Vec<u8>,
  pub offsets: Vec<u16>,
  pub data: Vec<u8>,
}

impl EncodedRange {
  #[inline]
  fn height_bytes(&self) -> u8 {
    bitfont::ceil_div_u8(self.crop.height as u8, 8)
  }

  /// Size of this range's tables in the data block.
  #[inline]
  fn table_len(&self) -> usize {
    self.widths.len() + self.offsets.len() * 2 + self.data.len()
  }
}

#[derive(Debug, Clone)]
pub struct EncodedFont {
  pub full_name: String,
  pub short_name: String,
  pub width: u8,
  pub height: u8,
  pub min_x_advance: u8,
  pub max_x_advance: u8,
  pub baseline_x: u8,
  pub baseline_y: u8,
  pub line_height: u8,
  pub flags: FontFlags,
  pub fallback: u16,
  pub ranges: Vec<EncodedRange>,
  pub kerning: Vec<KerningPair>,
}

impl EncodedFont {
  /// Range records addressing a data block that starts at byte `base`, and the block.
  pub fn layout(&self, base: u32) -> (Vec<CharRange>, Vec<u8>) {
    let mut records = Vec::with_capacity(self.ranges.len());
    let mut data = Vec::with_capacity(self.ranges.iter().map(EncodedRange::table_len).sum());
    for r in &self.ranges {
      let at = |data: &Vec<u8>| base + data.len() as u32;
      let (glyph_widths, glyph_offsets) = if r.width != 0 {
        (Span::EMPTY, Span::EMPTY)
      } else {
        let widths = Span::new(at(&data), r.widths.len() as u32);
        data.extend_from_slice(&r.widths);
        let offsets = Span::new(at(&data), r.offsets.len() as u32 * 2);
        for off in &r.offsets {
          data.extend_from_slice(&off.to_le_bytes());
        }
        (widths, offsets)
      };
      let glyph_data = Span::new(at(&data), r.data.len() as u32);
      data.extend_from_slice(&r.data);
      records.push(CharRange {
        first_char: r.first_char,
        char_count: r.char_count,
        offset_x: r.crop.offset_x as u8,
        offset_y: r.crop.offset_y as u8,
        height_bytes: r.height_bytes(),
        height_pixels: r.crop.height as u8,
        width: r.width,
        glyph_widths,
        glyph_offsets,
        glyph_data,
      });
    }
    (records, data)
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// encoding
// ──────────────────────────────────────────────────────────────────────────────

/// Crops and packs the glyphs of one planned range.
pub fn encode_range(font: &SourceFont, plan: &RangePlan) -> anyhow::Result<EncodedRange> {
  let (mw, mh) = (font.header.max_width, font.header.max_height);
  let glyphs: Vec<Option<&GlyphEntry>> = plan.glyphs.iter().map(|g| g.map(|i| &font.glyphs[i])).collect();
  let first = glyphs.iter().flatten().next().context("range without glyphs")?;

  // Holes need a zero entry in a width table.
  let mut width = first.width;
  let mut constant = !plan.has_placeholders() && glyphs.iter().flatten().all(|g| g.width == width);

  let crop = crop_box(glyphs.iter().map(|g| g.map(|g| g.data.as_slice())), mw, mh);
  if crop.width != width as usize {
    constant = false;
  }
  if !constant {
    width = 0;
  }

  let stride = bitfont::ceil_div_u8(crop.height as u8, 8).max(1) as usize;
  let mut widths = Vec::with_capacity(glyphs.len());
  let mut offsets = Vec::with_capacity(glyphs.len() + 1);
  let mut data = Vec::new();
  let push_offset = |data: &Vec<u8>, offsets: &mut Vec<u16>| -> anyhow::Result<()> {
    let cols = data.len() / stride;
    let cols = u16::try_from(cols).map_err(|_| anyhow::anyhow!("range U+{:04X}: {} columns exceed u16", plan.first_char, cols))?;
    offsets.push(cols);
    Ok(())
  };
  for g in &glyphs {
    push_offset(&data, &mut offsets)?;
    widths.push(g.map_or(0, |g| g.width));
    if let Some(g) = g {
      let cropped = crop_glyph(&g.data, mw, &crop);
      encode_glyph(&cropped, crop.width, crop.height, width as usize, &mut data);
    }
  }
  push_offset(&data, &mut offsets)?;

  debug!(
    "range U+{:04X}+{}: crop {:?}, {}, {} data bytes",
    plan.first_char,
    plan.char_count(),
    crop,
    if width != 0 { "constant width" } else { "width table" },
    data.len()
  );

  let (widths, offsets) = if width != 0 { (Vec::new(), Vec::new()) } else { (widths, offsets) };
  Ok(EncodedRange { first_char: plan.first_char, char_count: plan.char_count() as u16, crop, width, widths, offsets, data })
}

/// Splits, crops and packs a whole source font.
pub fn encode_font(font: &SourceFont, short_name: &str, limits: Limits) -> anyhow::Result<EncodedFont> {
  let h = &font.header;
  if h.max_width == 0 || h.max_height == 0 || h.max_width > 255 || h.max_height > 255 {
    bail!("glyph cell {}x{} outside 1..=255", h.max_width, h.max_height);
  }
  let glyph_size = h.max_width * bitfont::ceil_div_u8(h.max_height as u8, 8) as usize;
  let plans = compute_char_ranges(&font.char_to_glyph(), |_| glyph_size, limits);
  if plans.len() > u8::MAX as usize {
    bail!("{} character ranges exceed 255; raise --max-gap", plans.len());
  }
  let ranges = plans.iter().map(|p| encode_range(font, p)).collect::<anyhow::Result<Vec<_>>>()?;

  let mut kerning = font.kerning.clone();
  kerning.sort_by_key(|p| (p.left, p.right));
  kerning.dedup_by_key(|p| (p.left, p.right));

  Ok(EncodedFont {
    full_name: if h.name.is_empty() { short_name.to_string() } else { h.name.clone() },
    short_name: short_name.to_string(),
    width: h.max_width as u8,
    height: h.max_height as u8,
    min_x_advance: font.min_x_advance(),
    max_x_advance: font.max_x_advance(),
    baseline_x: h.baseline_x.min(255) as u8,
    baseline_y: h.baseline_y.min(255) as u8,
    line_height: h.line_height,
    // Black-and-white by construction.
    flags: h.flags | FontFlags::BW,
    fallback: font.fallback_char(),
    ranges,
    kerning,
  })
}

// ──────────────────────────────────────────────────────────────────────────────
// writers
// ──────────────────────────────────────────────────────────────────────────────

fn push_pascal(out: &mut Vec<u8>, s: &str, label: &str) -> anyhow::Result<()> {
  let len = u8::try_from(s.len()).map_err(|_| anyhow::anyhow!("{label} longer than 255 bytes"))?;
  out.push(len);
  out.extend_from_slice(s.as_bytes());
  Ok(())
}

/// Serializes `font` as a loadable "ftbw" blob. Kerning is not part of the blob.
pub fn write_blob(font: &EncodedFont) -> anyhow::Result<Vec<u8>> {
  let header_len = HDR_PREFIX_LEN
    + 1
    + font.full_name.len()
    + 1
    + font.short_name.len()
    + 1
    + RANGE_RECORD_LEN * font.ranges.len();
  let (records, data) = font.layout(header_len as u32);

  let mut out = Vec::with_capacity(header_len + data.len());
  out.extend_from_slice(BW_MAGIC);
  out.push(TYPECASE_VERSION);
  out.push(BWFONT_VERSION);
  out.extend_from_slice(&[
    font.width,
    font.height,
    font.min_x_advance,
    font.max_x_advance,
    font.baseline_x,
    font.baseline_y,
    font.line_height,
    font.flags.bits(),
  ]);
  out.extend_from_slice(&font.fallback.to_le_bytes());
  push_pascal(&mut out, &font.full_name, "full name")?;
  push_pascal(&mut out, &font.short_name, "short name")?;
  out.push(records.len() as u8);

  for r in &records {
    out.extend_from_slice(&r.first_char.to_le_bytes());
    out.extend_from_slice(&r.char_count.to_le_bytes());
    out.extend_from_slice(&[r.offset_x, r.offset_y, r.height_bytes, r.height_pixels, r.width]);
    out.extend_from_slice(&r.glyph_widths.start.to_le_bytes());
    out.extend_from_slice(&r.glyph_offsets.start.to_le_bytes());
    out.extend_from_slice(&r.glyph_data.start.to_le_bytes());
  }
  debug_assert_eq!(out.len(), header_len);
  out.extend_from_slice(&data);
  Ok(out)
}

fn write_span(out: &mut String, field: &str, span: Span) -> std::fmt::Result {
  if span == Span::EMPTY {
    writeln!(out, "    {field}: Span::EMPTY,")
  } else {
    writeln!(out, "    {field}: Span::new({}, {}),", span.start, span.len)
  }
}

/// Emits a Rust module defining `pub static FONT` (and its kerning pairs) for
/// linking into a firmware image.
pub fn write_rust_source(font: &EncodedFont) -> anyhow::Result<String> {
  let (records, data) = font.layout(0);
  let mut out = String::new();
  render_source(&mut out, font, &records, &data)?;
  Ok(out)
}

fn render_source(out: &mut String, font: &EncodedFont, records: &[CharRange], data: &[u8]) -> std::fmt::Result {
  writeln!(out, "//! {}, generated by `bitfont build --format rust`.", font.full_name)?;
  writeln!(out)?;
  writeln!(out, "extern crate alloc;")?;
  writeln!(out)?;
  writeln!(out, "use alloc::borrow::Cow;")?;
  writeln!(out)?;
  writeln!(
    out,
    "use bitfont::{{BwFont, CharRange, Font, FontFlags, FontInfo, FontKind, KerningPair, KerningTable, Span}};"
  )?;
  writeln!(out)?;

  writeln!(out, "static DATA: [u8; {}] = [", data.len())?;
  for chunk in data.chunks(16) {
    let line: Vec<String> = chunk.iter().map(|b| format!("0x{b:02x},")).collect();
    writeln!(out, "  {}", line.join(" "))?;
  }
  writeln!(out, "];")?;
  writeln!(out)?;

  writeln!(out, "static RANGES: [CharRange; {}] = [", records.len())?;
  for r in records {
    writeln!(out, "  CharRange {{")?;
    writeln!(out, "    first_char: {},", r.first_char)?;
    writeln!(out, "    char_count: {},", r.char_count)?;
    writeln!(out, "    offset_x: {},", r.offset_x)?;
    writeln!(out, "    offset_y: {},", r.offset_y)?;
    writeln!(out, "    height_bytes: {},", r.height_bytes)?;
    writeln!(out, "    height_pixels: {},", r.height_pixels)?;
    writeln!(out, "    width: {},", r.width)?;
    let mut span_out = String::new();
    write_span(&mut span_out, "glyph_widths", r.glyph_widths)?;
    write_span(&mut span_out, "glyph_offsets", r.glyph_offsets)?;
    write_span(&mut span_out, "glyph_data", r.glyph_data)?;
    for line in span_out.lines() {
      writeln!(out, "  {line}")?;
    }
    writeln!(out, "  }},")?;
  }
  writeln!(out, "];")?;
  writeln!(out)?;

  writeln!(out, "static KERNING: [KerningPair; {}] = [", font.kerning.len())?;
  for k in &font.kerning {
    writeln!(out, "  KerningPair {{ left: {}, right: {}, adjust: {} }},", k.left, k.right, k.adjust)?;
  }
  writeln!(out, "];")?;
  writeln!(out)?;

  let flags = match (font.flags.contains(FontFlags::MONOSPACE), font.flags.contains(FontFlags::BW)) {
    (true, true) => "FontFlags::MONOSPACE.union(FontFlags::BW)".to_string(),
    (false, true) => "FontFlags::BW".to_string(),
    _ => format!("FontFlags::from_bits_retain({})", font.flags.bits()),
  };
  writeln!(out, "pub static FONT: Font<'static> = Font {{")?;
  writeln!(out, "  info: FontInfo {{")?;
  writeln!(out, "    full_name: Cow::Borrowed({:?}),", font.full_name)?;
  writeln!(out, "    short_name: Cow::Borrowed({:?}),", font.short_name)?;
  writeln!(out, "    width: {},", font.width)?;
  writeln!(out, "    height: {},", font.height)?;
  writeln!(out, "    min_x_advance: {},", font.min_x_advance)?;
  writeln!(out, "    max_x_advance: {},", font.max_x_advance)?;
  writeln!(out, "    baseline_x: {},", font.baseline_x)?;
  writeln!(out, "    baseline_y: {},", font.baseline_y)?;
  writeln!(out, "    line_height: {},", font.line_height)?;
  writeln!(out, "    flags: {flags},")?;
  writeln!(out, "    fallback_character: {},", font.fallback)?;
  writeln!(out, "  }},")?;
  writeln!(
    out,
    "  kind: FontKind::Bitmap(BwFont {{ version: {BWFONT_VERSION}, data: Cow::Borrowed(&DATA), ranges: Cow::Borrowed(&RANGES) }}),"
  )?;
  writeln!(out, "  kerning: KerningTable::from_static(&KERNING),")?;
  writeln!(out, "}};")
}

/// Packs encoded blobs into a "case" container: `(name, pixel size, blob)` per face.
pub fn write_case(faces: &[(String, u8, Vec<u8>)]) -> anyhow::Result<Vec<u8>> {
  let count = u16::try_from(faces.len()).map_err(|_| anyhow::anyhow!("too many faces"))?;
  let dir_len: usize = faces.iter().map(|(name, _, _)| 1 + name.len() + 1 + 8).sum();
  let mut offset = 4 + 1 + 2 + dir_len;

  let mut out = Vec::with_capacity(offset + faces.iter().map(|(_, _, b)| b.len()).sum::<usize>());
  out.extend_from_slice(TYPECASE_MAGIC);
  out.push(TYPECASE_VERSION);
  out.extend_from_slice(&count.to_le_bytes());
  for (name, size, blob) in faces {
    push_pascal(&mut out, name, "face name")?;
    out.push(*size);
    let next = offset + blob.len();
    let (start, end) = (u32::try_from(offset)?, u32::try_from(next)?);
    out.extend_from_slice(&start.to_le_bytes());
    out.extend_from_slice(&end.to_le_bytes());
    offset = next;
  }
  for (_, _, blob) in faces {
    out.extend_from_slice(blob);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::FontHeader;
  use bitfont::{Face, PixelRun};

  fn cell(rows: &[&str], width: usize, height: usize) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    for (y, row) in rows.iter().enumerate() {
      for (x, ch) in row.chars().enumerate() {
        if ch == '#' {
          data[y * width + x] = 15;
        }
      }
    }
    data
  }

  fn font(width: usize, height: usize, glyphs: &[(u8, u8, &[&str])]) -> SourceFont {
    SourceFont {
      header: FontHeader {
        name: String::new(),
        max_width: width,
        max_height: height,
        baseline_x: 0,
        baseline_y: height,
        line_height: height as u8 + 1,
        flags: FontFlags::empty(),
      },
      glyphs: glyphs
        .iter()
        .map(|&(c, advance, rows)| GlyphEntry { chars: vec![c as u16], width: advance, data: cell(rows, width, height) })
        .collect(),
      kerning: Vec::new(),
    }
  }

  /// Renders `c` into a `width × height` ink grid.
  fn grid<F: Face>(face: &F, c: u16, width: usize, height: usize) -> Vec<bool> {
    let mut runs: Vec<PixelRun> = Vec::new();
    face.render_character(0, 0, c, &mut runs).unwrap();
    let mut out = vec![false; width * height];
    for r in runs {
      for x in r.x..r.x + r.count as i16 {
        out[r.y as usize * width + x as usize] = true;
      }
    }
    out
  }

  #[rustfmt::skip]
  fn pico_source() -> SourceFont {
    let mut f = font(4, 5, &[
      (b' ', 4, &[]),
      (b'0', 4, &["###", "#.#", "#.#", "#.#", "###"]),
      (b'1', 4, &[".#.", "##.", ".#.", ".#.", "###"]),
      (b'2', 4, &["###", "..#", "###", "#..", "###"]),
      (b'3', 4, &["###", "..#", "###", "..#", "###"]),
      (b'4', 4, &["#.#", "#.#", "###", "..#", "..#"]),
      (b'5', 4, &["###", "#..", "###", "..#", "###"]),
      (b'6', 4, &["###", "#..", "###", "#.#", "###"]),
      (b'7', 4, &["###", "..#", "..#", "..#", "..#"]),
      (b'8', 4, &["###", "#.#", "###", "#.#", "###"]),
      (b'9', 4, &["###", "#.#", "###", "..#", "###"]),
      (b':', 4, &["...", ".#.", "...", ".#.", "..."]),
      (b'?', 4, &["###", "..#", ".##", "...", ".#."]),
    ]);
    f.header.name = "Pico 3x5".into();
    f.header.line_height = 6;
    f.header.flags = FontFlags::MONOSPACE;
    f
  }

  #[test]
  fn reproduces_the_builtin_pico_tables() {
    let encoded = encode_font(&pico_source(), "pico", Limits::default()).unwrap();
    let blob = write_blob(&encoded).unwrap();
    let loaded = bitfont::load(&blob).unwrap();
    let builtin = &bitfont::fonts::pico::FONT;
    assert_eq!(loaded.info, builtin.info);

    let (records, data) = encoded.layout(0);
    let bw = builtin.bitmap().unwrap();
    assert_eq!(&data[..], &bw.data[..]);
    assert_eq!(&records[..], &bw.ranges[..]);

    let source = write_rust_source(&encoded).unwrap();
    assert!(source.contains("static DATA: [u8; 89] = ["));
    assert!(source.contains("    glyph_offsets: Span::new(20, 34),"));
    assert!(source.contains("flags: FontFlags::MONOSPACE.union(FontFlags::BW),"));
    assert!(source.contains("static KERNING: [KerningPair; 0] = ["));
  }

  #[test]
  fn packed_glyphs_decode_to_the_thresholded_source() {
    // Variable advances, a hole at 'C' and a crop of one row and column.
    #[rustfmt::skip]
    let src = font(5, 6, &[
      (b'?', 4, &["", ".###", "...#", "..##", "", "..#"]),
      (b'A', 5, &["", ".###", ".#.#", ".###", ".#.#", ".#.#"]),
      (b'B', 4, &["", ".##", ".###", ".#.#", ".###", ""]),
      (b'D', 5, &["", ".####", ".#..#", ".#..#", ".####", ""]),
    ]);
    let encoded = encode_font(&src, "probe", Limits::default()).unwrap();
    assert_eq!(encoded.ranges.len(), 1);
    let range = &encoded.ranges[0];
    assert_eq!((range.first_char, range.char_count, range.width), (b'?' as u16, 6, 0));
    assert_eq!((range.crop.offset_x, range.crop.offset_y, range.crop.height), (1, 1, 5));

    let blob = write_blob(&encoded).unwrap();
    let loaded = bitfont::load(&blob).unwrap();
    for g in &src.glyphs {
      let c = g.chars[0];
      let expected: Vec<bool> = g.data.iter().map(|&a| a >= crate::pack::THRESHOLD).collect();
      assert_eq!(grid(&loaded, c, 5, 6), expected, "glyph {:?}", c as u8 as char);
      assert_eq!(loaded.character_width(c), g.width);
    }
    // Holes and unmapped characters fall back to '?'.
    assert_eq!(loaded.info.fallback_character, b'?' as u16);
    assert_eq!(loaded.character_width(b'C' as u16), 4);
    assert_eq!(grid(&loaded, b'C' as u16, 5, 6), grid(&loaded, b'?' as u16, 5, 6));
    assert_eq!((loaded.info.min_x_advance, loaded.info.max_x_advance), (4, 5));
  }

  #[test]
  fn uniform_ranges_store_one_width() {
    #[rustfmt::skip]
    let src = font(2, 2, &[
      (b'a', 2, &["##", "#."]),
      (b'b', 2, &[".#", "##"]),
    ]);
    let encoded = encode_font(&src, "duo", Limits::default()).unwrap();
    let range = &encoded.ranges[0];
    assert_eq!(range.width, 2);
    assert!(range.widths.is_empty() && range.offsets.is_empty());
    assert_eq!(range.data, [0b11, 0b01, 0b10, 0b11]);
    let (records, _) = encoded.layout(100);
    assert_eq!(records[0].glyph_widths, Span::EMPTY);
    assert_eq!(records[0].glyph_data, Span::new(100, 4));
  }

  #[test]
  fn kerning_is_sorted_into_the_source_output() {
    let mut src = pico_source();
    src.kerning = vec![
      KerningPair { left: b'7' as u16, right: b'1' as u16, adjust: -1 },
      KerningPair { left: b'1' as u16, right: b'1' as u16, adjust: -2 },
    ];
    let encoded = encode_font(&src, "pico", Limits::default()).unwrap();
    let source = write_rust_source(&encoded).unwrap();
    let first = source.find("KerningPair { left: 49, right: 49, adjust: -2 }").unwrap();
    let second = source.find("KerningPair { left: 55, right: 49, adjust: -1 }").unwrap();
    assert!(first < second);
    // The blob carries no kerning section.
    assert_eq!(write_blob(&encoded).unwrap(), write_blob(&encode_font(&pico_source(), "pico", Limits::default()).unwrap()).unwrap());
  }

  #[test]
  fn case_container_round_trip() {
    let encoded = encode_font(&pico_source(), "pico", Limits::default()).unwrap();
    let blob = write_blob(&encoded).unwrap();
    let case = write_case(&[("pico".into(), 5, blob.clone()), ("copy".into(), 10, blob.clone())]).unwrap();
    let parsed = bitfont::TypeCase::parse(&case).unwrap();
    assert_eq!(parsed.faces().len(), 2);
    let copy = parsed.find("copy").unwrap();
    assert_eq!(copy.size, 10);
    assert_eq!(parsed.font_bytes(copy).unwrap(), &blob[..]);
    assert_eq!(parsed.load_face(copy).unwrap().info.short_name, "pico");
  }
}
