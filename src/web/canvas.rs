// Canvas-backed implementations of the cover and particle layers.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::error::{Result, ScratchError};
use crate::particles::ParticlePainter;
use crate::surface::{CoverLayer, PixelRect, Point, Rgba};

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .map_err(ScratchError::js)?
        .ok_or(ScratchError::NoContext)?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| ScratchError::NoContext)
}

/// Scratchable cover drawn on a 2d canvas. The backing store is scaled by the
/// device pixel ratio; every public coordinate is in CSS pixels.
pub struct CanvasCover {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: u32,  // CSS px
    height: u32, // CSS px
    ratio: f64,
    paint: Rgba,
}

impl CanvasCover {
    pub fn new(canvas: HtmlCanvasElement, width: u32, height: u32, ratio: f64, paint: Rgba) -> Result<Self> {
        canvas.set_width((width as f64 * ratio).round() as u32);
        canvas.set_height((height as f64 * ratio).round() as u32);
        let ctx = context_2d(&canvas)?;
        ctx.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(ScratchError::js)?;
        let mut cover = Self { canvas, ctx, width, height, ratio, paint };
        cover.repaint(1.0);
        Ok(cover)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Strokes from here on remove paint instead of adding it.
    fn erase_mode(&self) {
        self.ctx.set_global_composite_operation("destination-out").ok();
        self.ctx.set_line_join("round");
        self.ctx.set_line_cap("round");
    }

    fn paint_mode(&self) {
        self.ctx.set_global_composite_operation("source-over").ok();
    }

    /// Replace the cover with `img` stretched over the surface.
    pub fn draw_image(&mut self, img: &HtmlImageElement) -> Result<()> {
        self.paint_mode();
        self.ctx.clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
        let drawn = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            img,
            0.0,
            0.0,
            self.width as f64,
            self.height as f64,
        );
        self.erase_mode();
        drawn.map_err(ScratchError::js)
    }
}

impl CoverLayer for CanvasCover {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn erase_segment(&mut self, from: Point, to: Point, width: f64) {
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn sample(&self, rect: PixelRect) -> Result<Vec<u8>> {
        // get_image_data ignores the transform, so scale into device pixels.
        let sx = (rect.x as f64 * self.ratio).floor();
        let sy = (rect.y as f64 * self.ratio).floor();
        let sw = (rect.width as f64 * self.ratio).round().max(1.0);
        let sh = (rect.height as f64 * self.ratio).round().max(1.0);
        let data = self
            .ctx
            .get_image_data(sx, sy, sw, sh)
            .map_err(ScratchError::js)?;
        Ok(data.data().0)
    }

    fn repaint(&mut self, opacity: f64) {
        let (w, h) = (self.width as f64, self.height as f64);
        self.paint_mode();
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.set_fill_style_str(&self.paint.with_alpha(opacity).css());
        self.ctx.fill_rect(0.0, 0.0, w, h);
        self.erase_mode();
    }

    fn erase_all(&mut self, strength: f64) {
        self.erase_mode();
        self.ctx
            .set_fill_style_str(&Rgba::rgb(0, 0, 0).with_alpha(strength).css());
        self.ctx.fill_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }
}

/// Glitter layer; unscaled, sits on top of the cover with pointer events off.
pub struct CanvasParticles {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasParticles {
    pub fn new(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Result<Self> {
        canvas.set_width(width);
        canvas.set_height(height);
        Ok(Self { ctx: context_2d(canvas)?, width: width as f64, height: height as f64 })
    }
}

impl ParticlePainter for CanvasParticles {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba) {
        self.ctx.set_fill_style_str(&color.css());
        self.ctx.begin_path();
        self.ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU).ok();
        self.ctx.fill();
    }
}
