use lyon::path::{Path, PathEvent};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};
use zap_canvas::{Color, DrawContext, RenderTarget, Style, Transform};

/// Double-buffered HTML canvas: frames are drawn into an offscreen canvas
/// and copied onto the visible one by `present`.
pub struct CanvasTarget {
    visible: HtmlCanvasElement,
    visible_ctx: CanvasRenderingContext2d,
    buffer: HtmlCanvasElement,
    buffer_ctx: CanvasRenderingContext2d,
    style: Style,
    /// Styles pushed by `save`, mirroring the context's own state stack.
    saved: Vec<Style>,
}

impl CanvasTarget {
    /// Wrap the `<canvas>` element with the given DOM id.
    pub fn from_id(canvas_id: &str) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let visible = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{canvas_id}")))?
            .dyn_into::<HtmlCanvasElement>()?;
        let buffer = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        buffer.set_width(visible.width());
        buffer.set_height(visible.height());
        Self::new(visible, buffer)
    }

    pub fn new(visible: HtmlCanvasElement, buffer: HtmlCanvasElement) -> Result<Self, JsValue> {
        let visible_ctx = context_2d(&visible)?;
        let buffer_ctx = context_2d(&buffer)?;
        Ok(Self {
            visible,
            visible_ctx,
            buffer,
            buffer_ctx,
            style: Style::default(),
            saved: Vec::new(),
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.visible
    }

    fn trace(&self, path: &Path) {
        let ctx = &self.buffer_ctx;
        ctx.begin_path();
        for event in path.iter() {
            match event {
                PathEvent::Begin { at } => ctx.move_to(at.x as f64, at.y as f64),
                PathEvent::Line { to, .. } => ctx.line_to(to.x as f64, to.y as f64),
                PathEvent::Quadratic { ctrl, to, .. } => ctx.quadratic_curve_to(
                    ctrl.x as f64,
                    ctrl.y as f64,
                    to.x as f64,
                    to.y as f64,
                ),
                PathEvent::Cubic {
                    ctrl1, ctrl2, to, ..
                } => ctx.bezier_curve_to(
                    ctrl1.x as f64,
                    ctrl1.y as f64,
                    ctrl2.x as f64,
                    ctrl2.y as f64,
                    to.x as f64,
                    to.y as f64,
                ),
                PathEvent::End { close, .. } => {
                    if close {
                        ctx.close_path();
                    }
                }
            }
        }
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    let context: js_sys::Object = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?;
    context.dyn_into::<CanvasRenderingContext2d>().map_err(JsValue::from)
}

/// CSS color string for the canvas API.
pub fn css(color: Color) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {})",
        channel(color.r),
        channel(color.g),
        channel(color.b),
        color.a.clamp(0.0, 1.0)
    )
}

impl DrawContext for CanvasTarget {
    fn save(&mut self) {
        self.buffer_ctx.save();
        self.saved.push(self.style);
    }

    fn restore(&mut self) {
        self.buffer_ctx.restore();
        if let Some(style) = self.saved.pop() {
            self.style = style;
        }
    }

    fn set_transform(&mut self, transform: &Transform) {
        let [a, b, c, d, e, f] = transform.to_array();
        if let Err(err) = self.buffer_ctx.set_transform(a, b, c, d, e, f) {
            log::warn!("set_transform failed: {:?}", err);
        }
    }

    fn set_style(&mut self, style: &Style) {
        self.style = *style;
        let ctx = &self.buffer_ctx;
        ctx.set_global_alpha(style.alpha.clamp(0.0, 1.0));
        ctx.set_line_width(style.line_width);
        ctx.set_shadow_blur(style.shadow_blur);
        ctx.set_shadow_color(&css(style.shadow_color));
        if let Some(fill) = style.fill {
            ctx.set_fill_style_str(&css(fill));
        }
        if let Some(stroke) = style.stroke {
            ctx.set_stroke_style_str(&css(stroke));
        }
    }

    fn fill(&mut self, path: &Path) {
        if self.style.fill.is_none() {
            return;
        }
        self.trace(path);
        self.buffer_ctx.fill();
    }

    fn stroke(&mut self, path: &Path) {
        if self.style.stroke.is_none() || self.style.line_width <= 0.0 {
            return;
        }
        self.trace(path);
        self.buffer_ctx.stroke();
    }
}

impl RenderTarget for CanvasTarget {
    fn backend(&self) -> &'static str {
        "canvas2d"
    }

    fn begin_frame(&mut self, width: f64, height: f64) {
        let (w, h) = (width.max(0.0) as u32, height.max(0.0) as u32);
        for canvas in [&self.visible, &self.buffer] {
            if canvas.width() != w {
                canvas.set_width(w);
            }
            if canvas.height() != h {
                canvas.set_height(h);
            }
        }
        self.saved.clear();
        self.style = Style::default();
        let ctx = &self.buffer_ctx;
        if let Err(err) = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0) {
            log::warn!("set_transform failed: {:?}", err);
        }
        ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn present(&mut self) {
        let (w, h) = (self.visible.width() as f64, self.visible.height() as f64);
        self.visible_ctx.clear_rect(0.0, 0.0, w, h);
        if let Err(err) = self
            .visible_ctx
            .draw_image_with_html_canvas_element(&self.buffer, 0.0, 0.0)
        {
            log::warn!("present failed: {:?}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_colors() {
        assert_eq!(css(Color::RED), "rgba(255, 0, 0, 1)");
        assert_eq!(css(Color::rgb(0.0, 0.5, 1.0).with_alpha(0.25)), "rgba(0, 128, 255, 0.25)");
        assert_eq!(css(Color::TRANSPARENT), "rgba(0, 0, 0, 0)");
    }
}
