// src/card/raster.rs
//! CPU rasterizer: executes a `CardScene` with `vello_cpu`, shapes text
//! with `parley`, and PNG-encodes the readback. Every failure here is
//! recoverable upstream (the compositor degrades to caption-only).

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect, RoundedRect, Shape};

use crate::card::layout::{Align, CardOp, CardScene, Rgba};
use crate::card::photo::PhotoBitmap;

pub type CardResult<T> = Result<T, CardError>;

#[derive(thiserror::Error, Debug)]
pub enum CardError {
    #[error("font error: {0}")]
    Font(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }
    fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}

/// Glyph color carried through parley layouts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba> for GlyphBrush {
    fn from(c: Rgba) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Scene executor bound to one TTF. Parley contexts are stateful, so
/// rendering takes `&mut self`; the compositor serializes access.
pub struct CardRenderer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<GlyphBrush>,
    font_data: vello_cpu::peniko::FontData,
    family_name: String,
}

impl CardRenderer {
    pub fn from_font_path(path: &Path) -> CardResult<Self> {
        let bytes = fs::read(path)
            .map_err(|e| CardError::font(format!("reading {}: {e}", path.display())))?;
        Self::from_font_bytes(bytes)
    }

    pub fn from_font_bytes(bytes: Vec<u8>) -> CardResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardError::font("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::font("registered font family has no name"))?
            .to_string();
        let font_data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            font_data,
            family_name,
        })
    }

    /// Execute the scene and return PNG bytes.
    pub fn render_png(&mut self, scene: &CardScene, photo: Option<&PhotoBitmap>) -> CardResult<Vec<u8>> {
        let w: u16 = scene
            .width
            .try_into()
            .map_err(|_| CardError::surface("canvas width exceeds u16"))?;
        let h: u16 = scene
            .height
            .try_into()
            .map_err(|_| CardError::surface("canvas height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(w, h);

        for op in &scene.ops {
            self.draw_op(&mut ctx, op, photo)?;
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);

        let mut bytes = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        encode_png(scene.width, scene.height, bytes)
    }

    fn draw_op(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &CardOp,
        photo: Option<&PhotoBitmap>,
    ) -> CardResult<()> {
        ctx.set_paint_transform(Affine::IDENTITY);

        match op {
            CardOp::Fill { x, y, w, h, color } => {
                ctx.set_transform(Affine::IDENTITY);
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_rect(&Rect::new(
                    f64::from(*x),
                    f64::from(*y),
                    f64::from(x + w),
                    f64::from(y + h),
                ));
                Ok(())
            }
            CardOp::Photo { x, y, w, h } => {
                let photo = photo
                    .ok_or_else(|| CardError::surface("scene has a photo op but no photo pixels"))?;
                let paint = image_paint(&photo.rgba8_premul, photo.width, photo.height)?;
                let sx = f64::from(*w) / f64::from(photo.width);
                let sy = f64::from(*h) / f64::from(photo.height);
                ctx.set_transform(
                    Affine::translate((f64::from(*x), f64::from(*y)))
                        * Affine::scale_non_uniform(sx, sy),
                );
                ctx.set_paint(paint);
                ctx.fill_rect(&Rect::new(
                    0.0,
                    0.0,
                    f64::from(photo.width),
                    f64::from(photo.height),
                ));
                Ok(())
            }
            CardOp::GradientV { x, y, w, h, top, bottom } => {
                let (wu, hu) = (*w as u32, *h as u32);
                let paint = gradient_paint(*top, *bottom, wu, hu)?;
                ctx.set_transform(Affine::translate((f64::from(*x), f64::from(*y))));
                ctx.set_paint(paint);
                ctx.fill_rect(&Rect::new(0.0, 0.0, f64::from(wu), f64::from(hu)));
                Ok(())
            }
            CardOp::Pill {
                x,
                y,
                w,
                h,
                radius,
                color,
            } => {
                ctx.set_transform(Affine::IDENTITY);
                ctx.set_paint(color_to_cpu(*color));
                let rounded = RoundedRect::new(
                    f64::from(*x),
                    f64::from(*y),
                    f64::from(x + w),
                    f64::from(y + h),
                    f64::from(*radius),
                );
                ctx.fill_path(&rounded.to_path(0.1));
                Ok(())
            }
            CardOp::Text {
                x,
                y,
                text,
                role,
                color,
                align,
            } => {
                let layout = self.layout_line(text, role.size_px(), GlyphBrush::from(*color));
                let x_origin = match align {
                    Align::Left => *x,
                    Align::Center => x - layout.full_width() / 2.0,
                };
                ctx.set_transform(Affine::translate((f64::from(x_origin), f64::from(*y))));

                for line in layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));
                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&self.font_data)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
                Ok(())
            }
        }
    }

    /// Shape one already-broken line. Layout never re-wraps here.
    fn layout_line(&mut self, text: &str, size_px: f32, brush: GlyphBrush) -> parley::Layout<GlyphBrush> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<GlyphBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

fn color_to_cpu(c: Rgba) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn image_paint(rgba8_premul: &[u8], width: u32, height: u32) -> CardResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::surface("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::surface("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CardError::surface("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Per-row vertical lerp between two premultiplied colors.
fn gradient_paint(top: Rgba, bottom: Rgba, w: u32, h: u32) -> CardResult<vello_cpu::Image> {
    let top = premul_rgba8(top);
    let bottom = premul_rgba8(bottom);
    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    let h1 = (h.max(1) - 1) as f32;
    for y in 0..h {
        let t = if h1 <= 0.0 { 0.0 } else { (y as f32) / h1 };
        let lerp = |a: u8, b: u8| -> u8 {
            let af = a as f32;
            let bf = b as f32;
            (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
        };
        let c = [
            lerp(top[0], bottom[0]),
            lerp(top[1], bottom[1]),
            lerp(top[2], bottom[2]),
            lerp(top[3], bottom[3]),
        ];
        for x in 0..w {
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[idx..idx + 4].copy_from_slice(&c);
        }
    }
    image_paint(&bytes, w, h)
}

fn premul_rgba8(c: Rgba) -> [u8; 4] {
    let af = (c.a as u16) + 1;
    let premul = |v: u8| -> u8 { (((v as u16) * af) >> 8) as u8 };
    [premul(c.r), premul(c.g), premul(c.b), c.a]
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        } else if a < 255 {
            px[0] = ((px[0] as u16 * 255) / a).min(255) as u8;
            px[1] = ((px[1] as u16 * 255) / a).min(255) as u8;
            px[2] = ((px[2] as u16 * 255) / a).min(255) as u8;
        }
    }
}

fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> CardResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| CardError::Encode("readback byte length mismatch".into()))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| CardError::Encode(e.to_string()))?;
    Ok(out)
}
