//! Crop optimizer: one shared trim box per character range.

use crate::pack::THRESHOLD;

/// Region of the font cell kept for every glyph of a range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CropBox {
  pub offset_x: usize,
  pub offset_y: usize,
  pub width: usize,
  pub height: usize,
}

/// Union of the inked pixels of `glyphs`, each a `width × height` cell.
///
/// Missing glyphs (`None` or empty data) do not contribute. Without any ink the
/// whole cell is kept.
pub fn crop_box<'g>(glyphs: impl IntoIterator<Item = Option<&'g [u8]>>, width: usize, height: usize) -> CropBox {
  let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0, 0);
  for data in glyphs.into_iter().flatten().filter(|d| !d.is_empty()) {
    for y in 0..height {
      for x in 0..width {
        if data[y * width + x] >= THRESHOLD {
          x0 = x0.min(x);
          y0 = y0.min(y);
          x1 = x1.max(x);
          y1 = y1.max(y);
        }
      }
    }
  }
  if x0 > x1 || y0 > y1 {
    return CropBox { offset_x: 0, offset_y: 0, width, height };
  }
  CropBox { offset_x: x0, offset_y: y0, width: x1 - x0 + 1, height: y1 - y0 + 1 }
}

/// Copies the `crop` region out of a `width`-wide cell. Empty data stays empty.
pub fn crop_glyph(data: &[u8], width: usize, crop: &CropBox) -> Vec<u8> {
  if data.is_empty() {
    return Vec::new();
  }
  let mut out = Vec::with_capacity(crop.width * crop.height);
  for y in crop.offset_y..crop.offset_y + crop.height {
    let row = y * width + crop.offset_x;
    out.extend_from_slice(&data[row..row + crop.width]);
  }
  out
}
