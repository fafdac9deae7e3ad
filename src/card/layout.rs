// src/card/layout.rs
//! Pure card layout: a `ShareRequest` plus photo dimensions become an
//! ordered draw-command list. No surface, no fonts, no IO — everything
//! here is unit-testable, and the renderer just executes the ops.

use crate::card::metrics::{FontRole, TextMeasure};
use crate::card::ShareRequest;

pub const CANVAS_W: u32 = 1080;
pub const CANVAS_H: u32 = 1600;

/// Photo bottom inset: the cover-fit box is the canvas minus the branded
/// bottom band.
pub const PHOTO_BOTTOM_INSET: f32 = 300.0;

const MARGIN_X: f32 = 90.0;
pub const CONTENT_W: f32 = CANVAS_W as f32 - 2.0 * MARGIN_X;

pub const BACKGROUND: Rgba = Rgba::opaque(0x0a, 0x0a, 0x0c);
pub const ACCENT_BLUE: Rgba = Rgba::opaque(0x25, 0x63, 0xeb);
pub const STAMP_GRAY: Rgba = Rgba::opaque(0x64, 0x74, 0x8b);
const WHITE: Rgba = Rgba::opaque(0xff, 0xff, 0xff);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One draw command. Coordinates are canvas pixels; `Text` y is the top
/// of the line box.
#[derive(Debug, Clone, PartialEq)]
pub enum CardOp {
    Fill {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
    /// Destination rect of the cover-fit photo; the renderer supplies pixels.
    Photo { x: f32, y: f32, w: f32, h: f32 },
    /// Vertical gradient from `top` color to `bottom` color.
    GradientV {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        top: Rgba,
        bottom: Rgba,
    },
    /// Rounded-rect pill.
    Pill {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        color: Rgba,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        role: FontRole,
        color: Rgba,
        align: Align,
    },
}

#[derive(Debug, Clone)]
pub struct CardScene {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<CardOp>,
}

/// Greedy word wrap: measure the candidate line before appending; when
/// it would exceed `max_width` and the buffer is non-empty, flush and
/// start a new line with that word. Trailing partial line is flushed.
/// Words are never split, so a single over-long word gets its own line.
pub fn wrap_greedy(
    text: &str,
    role: FontRole,
    measure: &dyn TextMeasure,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(role, &candidate) > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cover-fit destination rect: fill the photo box entirely, cropping
/// overflow, centered horizontally and top-aligned.
pub fn cover_fit(img_w: u32, img_h: u32) -> (f32, f32, f32, f32) {
    let cw = CANVAS_W as f32;
    let ch = CANVAS_H as f32;
    let scale = (cw / img_w as f32).max((ch - PHOTO_BOTTOM_INSET) / img_h as f32);
    let w = img_w as f32 * scale;
    let h = img_h as f32 * scale;
    ((cw - w) / 2.0, 0.0, w, h)
}

/// Chip pill geometry from measured label width.
const CHIP_PAD_X: f32 = 28.0;
const CHIP_H: f32 = 56.0;

/// Build the full scene. `photo` carries decoded dimensions, or `None`
/// for a card without a photo op (renderer paints background only).
pub fn layout_card(
    request: &ShareRequest,
    photo: Option<(u32, u32)>,
    measure: &dyn TextMeasure,
    reference_code: &str,
) -> CardScene {
    let cw = CANVAS_W as f32;
    let ch = CANVAS_H as f32;
    let mut ops = Vec::new();

    // Base fill, then photo under the scrims.
    ops.push(CardOp::Fill {
        x: 0.0,
        y: 0.0,
        w: cw,
        h: ch,
        color: BACKGROUND,
    });
    if let Some((iw, ih)) = photo {
        let (x, y, w, h) = cover_fit(iw, ih);
        ops.push(CardOp::Photo { x, y, w, h });
    }

    // Scrims for text legibility: a soft one up top, a heavy one behind
    // the bottom band.
    ops.push(CardOp::GradientV {
        x: 0.0,
        y: 0.0,
        w: cw,
        h: 260.0,
        top: BACKGROUND.with_alpha(217),
        bottom: BACKGROUND.with_alpha(0),
    });
    ops.push(CardOp::GradientV {
        x: 0.0,
        y: ch - 450.0,
        w: cw,
        h: 450.0,
        top: BACKGROUND.with_alpha(0),
        bottom: BACKGROUND.with_alpha(255),
    });
    ops.push(CardOp::Fill {
        x: 0.0,
        y: ch - 120.0,
        w: cw,
        h: 120.0,
        color: BACKGROUND,
    });

    // Category chip.
    let chip_label = request.category.to_uppercase();
    let chip_w = measure.text_width(FontRole::Chip, &chip_label) + 2.0 * CHIP_PAD_X;
    let chip_y = 920.0;
    ops.push(CardOp::Pill {
        x: MARGIN_X,
        y: chip_y,
        w: chip_w,
        h: CHIP_H,
        radius: CHIP_H / 2.0,
        color: ACCENT_BLUE,
    });
    ops.push(CardOp::Text {
        x: MARGIN_X + CHIP_PAD_X,
        y: chip_y + (CHIP_H - FontRole::Chip.size_px()) / 2.0,
        text: chip_label,
        role: FontRole::Chip,
        color: WHITE,
        align: Align::Left,
    });

    // Wrapped headline.
    let mut text_y = chip_y + CHIP_H + 44.0;
    for line in wrap_greedy(&request.title, FontRole::Headline, measure, CONTENT_W) {
        ops.push(CardOp::Text {
            x: MARGIN_X,
            y: text_y,
            text: line,
            role: FontRole::Headline,
            color: WHITE,
            align: Align::Left,
        });
        text_y += FontRole::Headline.line_height_px();
    }

    // Timestamp/verification line.
    ops.push(CardOp::Text {
        x: MARGIN_X,
        y: text_y + 10.0,
        text: format!("{} · {}", request.time_label, request.author),
        role: FontRole::Meta,
        color: STAMP_GRAY,
        align: Align::Left,
    });

    // Bottom band: wordmark, accent rule, reference stamp.
    ops.push(CardOp::Text {
        x: cw / 2.0,
        y: ch - 180.0 - FontRole::Wordmark.size_px(),
        text: "CDLT NEWS".to_string(),
        role: FontRole::Wordmark,
        color: WHITE,
        align: Align::Center,
    });
    ops.push(CardOp::Fill {
        x: cw / 2.0 - 60.0,
        y: ch - 155.0,
        w: 120.0,
        h: 4.0,
        color: ACCENT_BLUE,
    });
    ops.push(CardOp::Text {
        x: cw / 2.0,
        y: ch - 100.0 - FontRole::Stamp.size_px(),
        text: format!("ID: {reference_code}"),
        role: FontRole::Stamp,
        color: STAMP_GRAY,
        align: Align::Center,
    });

    CardScene {
        width: CANVAS_W,
        height: CANVAS_H,
        ops,
    }
}
