//! Glyph packer: coverage cells → column-major bit bytes.

/// Coverage at or above this (on the 0..=15 scale) is ink.
pub const THRESHOLD: u8 = 8;

/// Number of columns up to and including the last inked one.
pub fn inked_columns(data: &[u8], width: usize, height: usize) -> usize {
  (0..width)
    .rev()
    .find(|&x| (0..height).any(|y| data[y * width + x] >= THRESHOLD))
    .map_or(0, |x| x + 1)
}

/// Appends the packed columns of one glyph cell to `dest`.
///
/// Each column takes `ceil(height / 8)` bytes, bit `i` of byte `b` being row
/// `8 * b + i`. With `num_cols == 0` the glyph keeps only its inked columns;
/// otherwise exactly `num_cols` columns are written. Missing glyphs (empty `data`)
/// write nothing.
pub fn encode_glyph(data: &[u8], width: usize, height: usize, num_cols: usize, dest: &mut Vec<u8>) {
  if data.is_empty() {
    return;
  }
  let cols = if num_cols == 0 { inked_columns(data, width, height) } else { num_cols };
  for x in 0..cols {
    for band in (0..height).step_by(8) {
      let mut byte = 0u8;
      for i in 0..(height - band).min(8) {
        let y = band + i;
        if x < width && data[y * width + x] >= THRESHOLD {
          byte |= 1 << i;
        }
      }
      dest.push(byte);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn packs_columns_low_bit_first() {
    // 3x2: row 0 = #.#, row 1 = .#. (the 7 stays blank)
    let cell = [15, 0, 9, 7, 8, 0];
    let mut out = Vec::new();
    encode_glyph(&cell, 3, 2, 0, &mut out);
    assert_eq!(out, [0b01, 0b10, 0b01]);
  }

  #[test]
  fn drops_blank_trailing_columns_unless_width_is_fixed() {
    let cell = [15, 0, 0, 0];
    let mut out = Vec::new();
    encode_glyph(&cell, 4, 1, 0, &mut out);
    assert_eq!(out, [0x01]);
    out.clear();
    encode_glyph(&cell, 4, 1, 4, &mut out);
    assert_eq!(out, [0x01, 0, 0, 0]);
    out.clear();
    encode_glyph(&[0; 4], 4, 1, 0, &mut out);
    assert!(out.is_empty());
    encode_glyph(&[], 4, 1, 4, &mut out);
    assert!(out.is_empty());
  }

  #[test]
  fn tall_cells_use_several_bytes_per_column() {
    // 1x10, rows 0 and 9 inked.
    let mut cell = [0u8; 10];
    cell[0] = 15;
    cell[9] = 15;
    let mut out = Vec::new();
    encode_glyph(&cell, 1, 10, 0, &mut out);
    assert_eq!(out, [0x01, 0x02]);
    assert_eq!(inked_columns(&cell, 1, 10), 1);
  }
}
