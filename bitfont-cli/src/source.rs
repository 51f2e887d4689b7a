//! Source glyph set the encoder works from.
//!
//! Fonts arrive as a single-row atlas image plus JSON metadata (hand-made or written
//! by the TTF importer). Each glyph is placed into a fixed `max_width × max_height`
//! cell with 4-bit coverage (0..=15), row-major, the baseline at `baseline_y`.

use anyhow::{anyhow, bail, Context};
use image::GenericImageView;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

// ──────────────────────────────────────────────────────────────────────────────
// metadata types
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Metadata {
  /// Display name; the short name comes from the output file name.
  #[serde(default)]
  pub name: String,
  pub line_height: u16,
  /// Rows from the atlas top to the baseline.
  pub ascent: i16,
  pub descent: i16,
  #[serde(default)]
  pub monospace: bool,
  pub glyphs: Vec<Glyph>,
  #[serde(default)]
  pub kerning: Vec<Kerning>,
  pub charset: Vec<CharsetRange>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Glyph {
  /// Left column of the glyph strip inside the atlas.
  pub x: u16,
  pub w: u8,
  #[serde(default)]
  pub advance: Option<u8>,
  #[serde(default)]
  pub left: Option<i8>,
}

impl Glyph {
  pub fn new(x: u16, w: u8, advance: Option<u8>, left: Option<i8>) -> Self {
    Self { x, w, advance, left }
  }

  #[inline]
  fn advance_or_width(&self) -> u8 {
    // Default advance = strip width (common for pixel fonts).
    self.advance.unwrap_or(self.w)
  }

  #[inline]
  fn bearing(&self) -> i32 {
    self.left.unwrap_or(0) as i32
  }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Kerning {
  pub left: String,
  pub right: String,
  pub adj: i8,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CharsetRange {
  pub start: String,
  pub end: String,
}

impl CharsetRange {
  #[inline]
  fn span(&self) -> anyhow::Result<(u16, u16)> {
    let s = one_codepoint(&self.start, "charset.start")?;
    let e = one_codepoint(&self.end, "charset.end")?;
    if e < s {
      bail!("range end {:#X} < start {:#X}", e, s);
    }
    Ok((s, e))
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// atlas
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Atlas {
  pub width: u16,
  pub height: u16,
  pub pixels: Vec<u8>, // L8 source
}

impl Atlas {
  #[inline]
  pub fn new(width: u16, height: u16, pixels: Vec<u8>) -> anyhow::Result<Self> {
    let need = width as usize * height as usize;
    if pixels.len() != need {
      bail!("atlas len {} != {}*{}", pixels.len(), width, height);
    }
    Ok(Self { width, height, pixels })
  }

  #[inline]
  fn at(&self, x: usize, y: usize) -> u8 {
    self.pixels[y * self.width as usize + x]
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// glyph set
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontHeader {
  pub name: String,
  pub max_width: usize,
  pub max_height: usize,
  pub baseline_x: usize,
  pub baseline_y: usize,
  pub line_height: u8,
  pub flags: bitfont::FontFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphEntry {
  /// Codepoints drawn with this glyph.
  pub chars: Vec<u16>,
  /// Advance in pixels.
  pub width: u8,
  /// `max_width × max_height` coverage values, row-major; empty for a missing glyph.
  pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SourceFont {
  pub header: FontHeader,
  pub glyphs: Vec<GlyphEntry>,
  pub kerning: Vec<bitfont::KerningPair>,
}

impl SourceFont {
  /// Codepoint → glyph index, in ascending codepoint order.
  pub fn char_to_glyph(&self) -> BTreeMap<u16, usize> {
    let mut map = BTreeMap::new();
    for (i, g) in self.glyphs.iter().enumerate() {
      for &c in &g.chars {
        map.entry(c).or_insert(i);
      }
    }
    map
  }

  pub fn min_x_advance(&self) -> u8 {
    self.glyphs.iter().map(|g| g.width).min().unwrap_or(0)
  }

  pub fn max_x_advance(&self) -> u8 {
    self.glyphs.iter().map(|g| g.width).max().unwrap_or(0)
  }

  /// U+FFFD if present, else '?', else ' ', else the lowest codepoint.
  pub fn fallback_char(&self) -> u16 {
    let map = self.char_to_glyph();
    [0xFFFD, b'?' as u16, b' ' as u16]
      .into_iter()
      .find(|c| map.contains_key(c))
      .or_else(|| map.keys().next().copied())
      .unwrap_or(0)
  }

  /// Builds the glyph set from an atlas strip and its metadata.
  pub fn from_atlas(meta: &Metadata, atlas: &Atlas) -> anyhow::Result<Self> {
    if meta.line_height == 0 {
      bail!("line_height must be non-zero");
    }
    let codepoints = expand_charset(&meta.charset)?;
    if codepoints.len() != meta.glyphs.len() {
      bail!("charset codepoints {} != glyphs {}", codepoints.len(), meta.glyphs.len());
    }

    let max_height = atlas.height as usize;
    // Left overhangs move every glyph right; the origin column becomes `shift`.
    let shift = meta.glyphs.iter().map(|g| -g.bearing()).max().unwrap_or(0).max(0);
    let column = |g: &Glyph| (shift + g.bearing()) as usize;
    let max_width = meta
      .glyphs
      .iter()
      .map(|g| (column(g) + g.w as usize).max(g.advance_or_width() as usize))
      .max()
      .unwrap_or(0)
      .max(1);
    if max_width > u8::MAX as usize || max_height > u8::MAX as usize {
      bail!("glyph cell {}x{} exceeds 255 pixels", max_width, max_height);
    }

    let mut glyphs = Vec::with_capacity(meta.glyphs.len());
    for (i, (g, &c)) in meta.glyphs.iter().zip(&codepoints).enumerate() {
      let x_end = g.x as usize + g.w as usize;
      if x_end > atlas.width as usize {
        bail!("glyph[{i}] strip {}..{} outside atlas width {}", g.x, x_end, atlas.width);
      }
      let mut data = vec![0u8; max_width * max_height];
      let left = column(g);
      for y in 0..max_height {
        for dx in 0..g.w as usize {
          data[y * max_width + left + dx] = atlas.at(g.x as usize + dx, y) >> 4;
        }
      }
      glyphs.push(GlyphEntry { chars: vec![c], width: g.advance_or_width(), data });
    }

    let lookup: BTreeSet<u16> = codepoints.iter().copied().collect();
    let mut kerning = Vec::with_capacity(meta.kerning.len());
    for k in &meta.kerning {
      let left = one_codepoint(&k.left, "kerning.left")?;
      let right = one_codepoint(&k.right, "kerning.right")?;
      if !lookup.contains(&left) || !lookup.contains(&right) {
        debug!("dropping kerning pair {:?}/{:?}: not in charset", k.left, k.right);
        continue;
      }
      kerning.push(bitfont::KerningPair { left, right, adjust: k.adj });
    }

    let mut flags = bitfont::FontFlags::empty();
    if meta.monospace {
      flags |= bitfont::FontFlags::MONOSPACE;
    }
    let header = FontHeader {
      name: meta.name.clone(),
      max_width,
      max_height,
      baseline_x: shift as usize,
      baseline_y: meta.ascent.clamp(0, max_height as i16) as usize,
      line_height: meta.line_height.min(u8::MAX as u16) as u8,
      flags,
    };
    Ok(SourceFont { header, glyphs, kerning })
  }
}

fn expand_charset(charset: &[CharsetRange]) -> anyhow::Result<Vec<u16>> {
  if charset.is_empty() {
    bail!("charset is required");
  }
  let mut out = Vec::new();
  for (i, r) in charset.iter().enumerate() {
    let (s, e) = r.span().with_context(|| format!("charset[{i}]"))?;
    out.extend(s..=e);
  }
  Ok(out)
}

/// Exactly one Unicode scalar inside the 16-bit codepoint space.
#[inline]
pub fn one_codepoint(s: &str, label: &str) -> anyhow::Result<u16> {
  let mut it = s.chars();
  let c = it.next().ok_or_else(|| anyhow!("{label} is empty"))?;
  if it.next().is_some() {
    bail!("{label} must be one scalar");
  }
  u16::try_from(c as u32).map_err(|_| anyhow!("{label} U+{:X} outside the 16-bit range", c as u32))
}

// ──────────────────────────────────────────────────────────────────────────────
// image helpers
// ──────────────────────────────────────────────────────────────────────────────

/// Decode a PNG (or any supported format) into 8-bit grayscale, using alpha as
/// coverage when present.
pub fn decode_png_to_l8(bytes: &[u8]) -> anyhow::Result<(u16, u16, Vec<u8>)> {
  use image::DynamicImage;
  use image::ImageReader;
  use std::io::Cursor;

  let img = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?.decode()?;

  let (w, h) = img.dimensions();
  let w16: u16 = w.try_into().map_err(|_| anyhow!("atlas width too large"))?;
  let h16: u16 = h.try_into().map_err(|_| anyhow!("atlas height too large"))?;

  let l8: Vec<u8> = match img {
    DynamicImage::ImageLuma8(l) => l.into_vec(),
    DynamicImage::ImageLumaA8(la) => la.into_vec().chunks_exact(2).map(|c| c[1]).collect(),
    DynamicImage::ImageRgb8(rgb) => rgb
      .into_vec()
      .chunks_exact(3)
      .map(|c| {
        // BT.709 luma.
        let y = 0.2126 * c[0] as f32 + 0.7152 * c[1] as f32 + 0.0722 * c[2] as f32;
        y.round().clamp(0.0, 255.0) as u8
      })
      .collect(),
    other => other.to_rgba8().into_vec().chunks_exact(4).map(|c| c[3]).collect(),
  };

  Ok((w16, h16, l8))
}

/// Encode an L8 grayscale image to PNG bytes.
pub fn encode_l8_png(pixels: &[u8], w: u16, h: u16) -> anyhow::Result<Vec<u8>> {
  use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder as _};
  let mut out = Vec::new();
  PngEncoder::new(&mut out).write_image(pixels, w as u32, h as u32, ExtendedColorType::L8)?;
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn meta(glyphs: Vec<Glyph>, start: &str, end: &str) -> Metadata {
    Metadata {
      name: "Strip".into(),
      line_height: 4,
      ascent: 3,
      descent: 0,
      monospace: false,
      glyphs,
      kerning: vec![
        Kerning { left: "a".into(), right: "b".into(), adj: -1 },
        Kerning { left: "a".into(), right: "z".into(), adj: -1 },
      ],
      charset: vec![CharsetRange { start: start.into(), end: end.into() }],
    }
  }

  #[test]
  fn glyphs_land_in_cells() {
    // 3x3 atlas: 'a' is column 0, 'b' columns 1..3 shifted right by one.
    #[rustfmt::skip]
    let atlas = Atlas::new(3, 3, vec![
      0xff, 0x00, 0x80,
      0x00, 0xff, 0x00,
      0x10, 0x00, 0x00,
    ]).unwrap();
    let m = meta(vec![Glyph::new(0, 1, Some(2), None), Glyph::new(1, 2, None, Some(1))], "a", "b");
    let font = SourceFont::from_atlas(&m, &atlas).unwrap();
    assert_eq!((font.header.max_width, font.header.max_height, font.header.baseline_y), (3, 3, 3));
    assert_eq!(font.glyphs[0].chars, [b'a' as u16]);
    assert_eq!(font.glyphs[0].width, 2);
    assert_eq!(font.glyphs[0].data, [15, 0, 0, 0, 0, 0, 1, 0, 0]);
    assert_eq!(font.glyphs[1].data, [0, 0, 8, 0, 15, 0, 0, 0, 0]);
    assert_eq!(font.kerning.len(), 1);
    assert_eq!((font.min_x_advance(), font.max_x_advance()), (2, 2));
  }

  #[test]
  fn left_overhangs_shift_the_origin() {
    // 'b' reaches one column left of its origin.
    let atlas = Atlas::new(2, 1, vec![0xff, 0xff]).unwrap();
    let m = meta(vec![Glyph::new(0, 1, Some(2), None), Glyph::new(1, 1, Some(2), Some(-1))], "a", "b");
    let font = SourceFont::from_atlas(&m, &atlas).unwrap();
    assert_eq!((font.header.max_width, font.header.baseline_x), (2, 1));
    assert_eq!(font.glyphs[0].data, [0, 15]);
    assert_eq!(font.glyphs[1].data, [15, 0]);
  }

  #[test]
  fn charset_and_glyph_counts_must_match() {
    let atlas = Atlas::new(1, 1, vec![0]).unwrap();
    let m = meta(vec![Glyph::new(0, 1, None, None)], "a", "c");
    assert!(SourceFont::from_atlas(&m, &atlas).is_err());
    assert!(Atlas::new(2, 2, vec![0; 3]).is_err());
  }

  #[test]
  fn fallback_prefers_question_mark_then_space() {
    let glyph = |c: u8| GlyphEntry { chars: vec![c as u16], width: 1, data: vec![] };
    let header = FontHeader {
      name: String::new(),
      max_width: 1,
      max_height: 1,
      baseline_x: 0,
      baseline_y: 1,
      line_height: 1,
      flags: bitfont::FontFlags::empty(),
    };
    let mut font = SourceFont { header, glyphs: vec![glyph(b'a'), glyph(b' ')], kerning: vec![] };
    assert_eq!(font.fallback_char(), b' ' as u16);
    font.glyphs.push(glyph(b'?'));
    assert_eq!(font.fallback_char(), b'?' as u16);
    font.glyphs.retain(|g| g.chars[0] == b'a' as u16);
    assert_eq!(font.fallback_char(), b'a' as u16);
  }

  #[test]
  fn codepoints_outside_16_bits_are_rejected() {
    assert_eq!(one_codepoint("€", "x").unwrap(), 0x20AC);
    assert!(one_codepoint("😀", "x").is_err());
    assert!(one_codepoint("ab", "x").is_err());
  }
}
