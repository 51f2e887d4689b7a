// ============================
// TTF → atlas + metadata, ready for the encoder
// ============================

use crate::source::{Atlas, CharsetRange, Glyph, Metadata};
use anyhow::anyhow;
use log::debug;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::{Format, Vector};
use swash::{FontRef, NormalizedCoord, StringId};

/// Rasterizes `ranges` of a TrueType/OpenType font at `px` pixels into a single-row
/// L8 atlas and the metadata describing it.
pub fn import_ttf(ttf: &[u8], px: f32, ranges: &[(char, char)]) -> anyhow::Result<(Metadata, Atlas)> {
  if !(px > 0.0) {
    return Err(anyhow!("pixel size must be positive, got {px}"));
  }
  let font = FontRef::from_index(ttf, 0).ok_or_else(|| anyhow!("failed to parse TTF font"))?;

  let mut charset: Vec<char> = Vec::new();
  for &(start, end) in ranges {
    if end < start {
      return Err(anyhow!("range end < start: {:?}-{:?}", start, end));
    }
    charset.extend((start as u32..=end as u32).filter_map(char::from_u32));
  }
  if charset.is_empty() {
    return Err(anyhow!("charset empty"));
  }

  // ---- metrics at the requested size
  let m_scaled = font.metrics(&[] as &[NormalizedCoord]).scale(px);
  let ascent = m_scaled.ascent;
  let descent = m_scaled.descent;
  let line_height = (ascent + descent + m_scaled.leading).ceil().max(1.0) as u16;
  let gmetrics = font.glyph_metrics(&[] as &[NormalizedCoord]).scale(px);

  let outline = [Source::ColorOutline(0), Source::ColorBitmap(StrikeWith::BestFit), Source::Outline];
  let mut scale_ctx = ScaleContext::new();
  let mut scaler = scale_ctx.builder(font).size(px).hint(true).build();

  let mut glyphs: Vec<Glyph> = Vec::with_capacity(charset.len());
  let mut bitmaps: Vec<(u16, i32, i32, i32, Vec<u8>)> = Vec::with_capacity(charset.len());
  let mut x_cursor: u32 = 0;

  for &ch in &charset {
    let gid = font.charmap().map(ch);
    if gid == 0 {
      debug!("no glyph for {:?} (U+{:04X})", ch, ch as u32);
      glyphs.push(Glyph::new(x_cursor as u16, 0, Some(0), Some(0)));
      continue;
    }
    let adv = saturate_u8(gmetrics.advance_width(gid));
    let mut render = Render::new(&outline);
    render.format(Format::Alpha).offset(Vector::new(0.0, 0.0));
    match render.render(&mut scaler, gid) {
      Some(img) if img.placement.width > 0 && img.placement.height > 0 => {
        let w = img.placement.width.min(255) as i32;
        let h = img.placement.height as i32;
        let stride = img.placement.width as usize;
        let mut data = Vec::with_capacity(w as usize * h as usize);
        for row in img.data.chunks_exact(stride) {
          data.extend_from_slice(&row[..w as usize]);
        }
        glyphs.push(Glyph::new(x_cursor as u16, w as u8, Some(adv), Some(saturate_i8(img.placement.left as f32))));
        bitmaps.push((x_cursor as u16, img.placement.top, w, h, data));
        x_cursor = x_cursor.saturating_add(w as u32);
      }
      // Blank glyphs (space) keep their advance.
      _ => glyphs.push(Glyph::new(x_cursor as u16, 0, Some(adv), Some(0))),
    }
  }
  if x_cursor > u16::MAX as u32 {
    return Err(anyhow!("atlas width {x_cursor} exceeds 65535 pixels"));
  }

  let atlas_w: u16 = (x_cursor as u16).max(1);
  let baseline_y = ascent.ceil() as i32;
  let atlas_h = (ascent + descent).ceil().max(1.0) as u16;

  // ---- compose single-row L8 atlas
  let mut l8 = vec![0u8; atlas_w as usize * atlas_h as usize];
  for (x, top, w, h, bm) in &bitmaps {
    let dst_top = baseline_y - *top;
    let row_w = *w as usize;
    for row in 0..*h {
      let dst_y = dst_top + row;
      if !(0..atlas_h as i32).contains(&dst_y) {
        continue;
      }
      let src_off = row as usize * row_w;
      let dst_off = dst_y as usize * atlas_w as usize + *x as usize;
      l8[dst_off..dst_off + row_w].copy_from_slice(&bm[src_off..src_off + row_w]);
    }
  }

  let name = font
    .localized_strings()
    .find(|s| s.id() == StringId::Full)
    .map(|s| format!("{} {}", s.chars().collect::<String>(), px.round() as u32))
    .unwrap_or_default();
  let meta = Metadata {
    name,
    line_height,
    ascent: baseline_y as i16,
    descent: descent.round() as i16,
    monospace: font.metrics(&[] as &[NormalizedCoord]).is_monospace,
    glyphs,
    kerning: Vec::new(),
    charset: ranges.iter().map(|(s, e)| CharsetRange { start: s.to_string(), end: e.to_string() }).collect(),
  };
  debug!("imported {} glyphs into a {}x{} atlas", meta.glyphs.len(), atlas_w, atlas_h);
  Ok((meta, Atlas::new(atlas_w, atlas_h, l8)?))
}

#[inline]
pub(crate) fn saturate_i8(v: f32) -> i8 {
  v.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8
}

#[inline]
fn saturate_u8(v: f32) -> u8 {
  v.round().clamp(0.0, u8::MAX as f32) as u8
}
