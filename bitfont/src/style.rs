use crate::font::{Face, PixelRun, PixelSink, INK_THRESHOLD};
use crate::justify::{render_left, string_width};

use embedded_graphics::text::{renderer::*, Baseline};
use embedded_graphics_core::{prelude::*, primitives::*};

/// Draws text in one colour; pixels with coverage above [`INK_THRESHOLD`] are set,
/// the rest are left untouched.
#[derive(Debug)]
#[non_exhaustive]
pub struct BitTextStyle<'f, F: ?Sized, C> {
  pub font: &'f F,
  pub color: C,
}

impl<F: ?Sized, C: Copy> Clone for BitTextStyle<'_, F, C> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<F: ?Sized, C: Copy> Copy for BitTextStyle<'_, F, C> {}

impl<'f, F: Face + ?Sized, C: PixelColor> BitTextStyle<'f, F, C> {
  pub const fn new(font: &'f F, color: C) -> Self {
    Self { font, color }
  }

  /// Vertical offset (in px) from the provided baseline position to the top of the glyph box.
  #[inline]
  fn baseline_offset(&self, baseline: Baseline) -> i32 {
    let info = self.font.info();
    match baseline {
      Baseline::Top => 0,
      Baseline::Bottom => info.height.saturating_sub(1) as i32,
      Baseline::Middle => (info.height.saturating_sub(1) / 2) as i32,
      Baseline::Alphabetic => info.baseline_y as i32,
    }
  }
}

#[inline]
fn to_i16(v: i32) -> i16 {
  v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

struct DrawSink<'d, D, C> {
  target: &'d mut D,
  color: C,
}

impl<D, C> PixelSink for DrawSink<'_, D, C>
where
  D: DrawTarget<Color = C>,
  C: PixelColor,
{
  type Error = D::Error;

  fn run(&mut self, run: PixelRun) -> Result<(), D::Error> {
    if run.alpha <= INK_THRESHOLD || run.count == 0 {
      return Ok(());
    }
    let area = Rectangle::new(Point::new(run.x as i32, run.y as i32), Size::new(run.count as u32, 1));
    self.target.fill_solid(&area, self.color)
  }
}

impl<F: Face + ?Sized, C: PixelColor> TextRenderer for BitTextStyle<'_, F, C> {
  type Color = C;

  fn draw_string<D>(&self, text: &str, position: Point, baseline: Baseline, target: &mut D) -> Result<Point, D::Error>
  where
    D: DrawTarget<Color = Self::Color>,
  {
    let top = to_i16(position.y - self.baseline_offset(baseline));
    let mut sink = DrawSink { target, color: self.color };
    let font = self.font;
    render_left(font, to_i16(position.x), top, text.as_bytes(), || 0, &mut |x, y, c| {
      font.render_character(x, y, c, &mut sink)
    })?;
    let width = string_width(font, text.as_bytes(), 0, true) as i32;
    Ok(Point::new(position.x + width, position.y))
  }

  fn draw_whitespace<D>(&self, width: u32, position: Point, _baseline: Baseline, _target: &mut D) -> Result<Point, D::Error>
  where
    D: DrawTarget<Color = Self::Color>,
  {
    Ok(Point::new(position.x + width as i32, position.y))
  }

  fn measure_string(&self, text: &str, position: Point, baseline: Baseline) -> TextMetrics {
    let top_left = position - Point::new(0, self.baseline_offset(baseline));
    let width = string_width(self.font, text.as_bytes(), 0, true).max(0) as u32;
    let height = if width == 0 { 0 } else { self.font.info().height as u32 };
    TextMetrics {
      bounding_box: Rectangle::new(top_left, Size::new(width, height)),
      next_position: position + Point::new(width as i32, 0),
    }
  }

  fn line_height(&self) -> u32 {
    self.font.info().line_height as u32
  }
}
