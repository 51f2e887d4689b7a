//! Text dumps of encoded fonts: header, ranges, container directories and an
//! ASCII rendering of laid-out text.

use std::convert::Infallible;
use std::fmt::Write as _;

use bitfont::{render_aligned, render_justified, wordwrap, Align, Codepoint, Face, FnSink, Font, FontKind, PixelRun, TypeCase, INK_THRESHOLD};

/// How preview lines are placed inside the requested width.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
  Aligned(Align),
  Justified,
}

/// Header fields and range table of a loaded font.
pub fn describe(font: &Font<'_>) -> String {
  let info = &font.info;
  let mut out = String::new();
  let _ = writeln!(out, "{} ({})", info.full_name, info.short_name);
  let _ = writeln!(
    out,
    "  cell {}x{}, advance {}..{}, baseline ({},{}), line height {}",
    info.width, info.height, info.min_x_advance, info.max_x_advance, info.baseline_x, info.baseline_y, info.line_height
  );
  let _ = writeln!(out, "  flags {:?}, fallback U+{:04X}", info.flags, info.fallback_character);
  match &font.kind {
    FontKind::Bitmap(bw) => {
      let _ = writeln!(out, "  {} ranges, {} bytes", bw.ranges.len(), bw.data.len());
      for r in bw.ranges.iter() {
        let last = (r.first_char as u32 + r.char_count as u32).saturating_sub(1).max(r.first_char as u32);
        let width = if r.width != 0 { format!("width {}", r.width) } else { "width table".to_string() };
        let _ = writeln!(
          out,
          "    U+{:04X}..U+{:04X}  {:<12} crop +{}+{} h{}  {} bytes",
          r.first_char, last, width, r.offset_x, r.offset_y, r.height_pixels, r.glyph_data.len
        );
      }
    }
    FontKind::RunLength(rle) => {
      let _ = writeln!(out, "  run-length glyphs, {} bytes (not decodable)", rle.data.len());
    }
  }
  if !font.kerning.is_empty() {
    let _ = writeln!(out, "  {} kerning pairs", font.kerning.len());
  }
  out
}

/// Face directory of a "case" container.
pub fn describe_case(case: &TypeCase<'_>) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "case v{}, {} faces", case.version, case.faces().len());
  for face in case.faces() {
    let _ = writeln!(out, "  {:<16} {:>3}px  {} bytes", face.name, face.size, face.next - face.offset);
  }
  out
}

fn plot(rows: &mut [Vec<u8>], run: PixelRun) {
  if run.alpha <= INK_THRESHOLD || run.y < 0 {
    return;
  }
  let Some(row) = rows.get_mut(run.y as usize) else {
    return;
  };
  for x in run.x..run.x.saturating_add(run.count as i16) {
    if let Some(px) = usize::try_from(x).ok().and_then(|x| row.get_mut(x)) {
      *px = b'#';
    }
  }
}

/// Word-wraps `text` to `width` pixels and renders it as rows of `#` and `.`.
pub fn render_text<F: Face + ?Sized>(font: &F, text: &str, width: i16, layout: Layout) -> Vec<String> {
  let mut lines: Vec<Vec<u8>> = Vec::new();
  wordwrap(font, width, text.as_bytes(), |line, _| {
    lines.push(line.to_vec());
    true
  });

  let line_height = font.info().line_height.max(font.info().height) as usize;
  let mut rows = vec![vec![b'.'; width.max(0) as usize]; lines.len() * line_height];
  for (i, line) in lines.iter().enumerate() {
    let y0 = (i * line_height) as i16;
    let mut draw = |x: i16, y: i16, c: Codepoint| -> Result<u8, Infallible> {
      font.render_character(
        x,
        y,
        c,
        &mut FnSink(|run: PixelRun| {
          plot(&mut rows, run);
          Ok::<(), Infallible>(())
        }),
      )
    };
    let _ = match layout {
      Layout::Aligned(align) => {
        let x0 = match align {
          Align::Left => 0,
          Align::Center => width / 2,
          Align::Right => width,
        };
        render_aligned(font, x0, y0, align, line, 0, &mut draw)
      }
      Layout::Justified => render_justified(font, 0, y0, width, line, 0, &mut draw),
    };
  }
  rows.into_iter().map(|r| String::from_utf8_lossy(&r).into_owned()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use bitfont::fonts::pico;

  #[test]
  fn describes_the_builtin_font() {
    let text = describe(&pico::FONT);
    assert!(text.starts_with("Pico 3x5 (pico)\n"));
    assert!(text.contains("line height 6"));
    assert!(text.contains("fallback U+003F"));
    assert!(text.contains("U+0020..U+0020  width 4"));
    assert!(text.contains("U+0030..U+003F  width table"));
  }

  #[test]
  fn empty_ranges_do_not_underflow() {
    let mut font = pico::FONT.clone();
    if let FontKind::Bitmap(bw) = &mut font.kind {
      let mut ranges = bw.ranges.to_vec();
      ranges[0].first_char = 0;
      ranges[0].char_count = 0;
      bw.ranges = ranges.into();
    }
    assert!(describe(&font).contains("U+0000..U+0000"));
  }

  #[test]
  fn renders_left_and_right_aligned() {
    let rows = render_text(&pico::FONT, "10", 8, Layout::Aligned(Align::Left));
    assert_eq!(rows, [".#..###.", "##..#.#.", ".#..#.#.", ".#..#.#.", "###.###.", "........"]);

    let rows = render_text(&pico::FONT, "1", 8, Layout::Aligned(Align::Right));
    assert_eq!(rows[0], ".....#..");
    assert_eq!(rows[4], "....###.");
  }

  #[test]
  fn wraps_into_stacked_lines() {
    let rows = render_text(&pico::FONT, "10 1", 8, Layout::Justified);
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0], ".#..###.");
    assert_eq!(rows[6], ".#......");
    assert!(render_text(&pico::FONT, "", 8, Layout::Justified).is_empty());
  }

  #[test]
  fn lists_case_faces() {
    let case = crate::export::write_case(&[("pico".into(), 5, vec![0; 10]), ("big".into(), 10, vec![0; 3])]).unwrap();
    let text = describe_case(&TypeCase::parse(&case).unwrap());
    assert!(text.starts_with("case v2, 2 faces\n"));
    assert!(text.contains("pico"));
    assert!(text.contains("  5px  10 bytes"));
    assert!(text.contains(" 10px  3 bytes"));
  }
}
