use crate::font::{Codepoint, Face, FontInfo, PixelRun, PixelSink};

/// Integer upscale of another face.
///
/// Metrics are multiplied by the scale factors and every pixel run is stretched
/// `x_scale` times horizontally and repeated on `y_scale` rows, relative to the
/// render origin. The adapter never copies glyph data.
#[derive(Clone, Debug)]
pub struct ScaledFont<'f, F: ?Sized> {
  base: &'f F,
  info: FontInfo<'f>,
  x_scale: u8,
  y_scale: u8,
}

#[inline]
fn scale_u8(v: u8, s: u8) -> u8 {
  v.saturating_mul(s)
}

impl<'f, F: Face + ?Sized> ScaledFont<'f, F> {
  /// Wraps `base`. Scale factors below 1 are treated as 1.
  pub fn new(base: &'f F, x_scale: u8, y_scale: u8) -> Self {
    debug_assert!(x_scale >= 1 && y_scale >= 1, "scale factors start at 1");
    let (sx, sy) = (x_scale.max(1), y_scale.max(1));
    let src = base.info();
    let info = FontInfo {
      full_name: src.full_name.clone(),
      short_name: src.short_name.clone(),
      width: scale_u8(src.width, sx),
      height: scale_u8(src.height, sy),
      min_x_advance: scale_u8(src.min_x_advance, sx),
      max_x_advance: scale_u8(src.max_x_advance, sx),
      baseline_x: scale_u8(src.baseline_x, sx),
      baseline_y: scale_u8(src.baseline_y, sy),
      line_height: scale_u8(src.line_height, sy),
      flags: src.flags,
      fallback_character: src.fallback_character,
    };
    ScaledFont { base, info, x_scale: sx, y_scale: sy }
  }

  #[inline]
  pub fn base(&self) -> &'f F {
    self.base
  }

  #[inline]
  pub fn scale(&self) -> (u8, u8) {
    (self.x_scale, self.y_scale)
  }
}

/// Stretches runs about `(x0, y0)` before forwarding them.
struct ScaleSink<'s, S: ?Sized> {
  inner: &'s mut S,
  x0: i16,
  y0: i16,
  x_scale: u8,
  y_scale: u8,
}

impl<S: PixelSink + ?Sized> PixelSink for ScaleSink<'_, S> {
  type Error = S::Error;

  fn run(&mut self, run: PixelRun) -> Result<(), S::Error> {
    let x = self.x0.wrapping_add(run.x.wrapping_sub(self.x0).wrapping_mul(self.x_scale as i16));
    let y = self.y0.wrapping_add(run.y.wrapping_sub(self.y0).wrapping_mul(self.y_scale as i16));
    let total = run.count as u32 * self.x_scale as u32;
    for dy in 0..self.y_scale as i16 {
      let mut left = total;
      let mut cx = x;
      while left > 0 {
        let count = left.min(u8::MAX as u32) as u8;
        self.inner.run(PixelRun { x: cx, y: y.wrapping_add(dy), count, alpha: run.alpha })?;
        cx = cx.wrapping_add(count as i16);
        left -= count as u32;
      }
    }
    Ok(())
  }
}

impl<F: Face + ?Sized> Face for ScaledFont<'_, F> {
  #[inline]
  fn info(&self) -> &FontInfo<'_> {
    &self.info
  }

  fn glyph_width(&self, character: Codepoint) -> u8 {
    scale_u8(self.base.glyph_width(character), self.x_scale)
  }

  fn render_glyph<S: PixelSink + ?Sized>(
    &self,
    x0: i16,
    y0: i16,
    character: Codepoint,
    sink: &mut S,
  ) -> Result<u8, S::Error> {
    let mut scaled = ScaleSink { inner: sink, x0, y0, x_scale: self.x_scale, y_scale: self.y_scale };
    let advance = self.base.render_glyph(x0, y0, character, &mut scaled)?;
    Ok(scale_u8(advance, self.x_scale))
  }

  fn kerning(&self, left: Codepoint, right: Codepoint) -> i8 {
    let k = self.base.kerning(left, right) as i16 * self.x_scale as i16;
    k.clamp(i8::MIN as i16, i8::MAX as i16) as i8
  }
}
