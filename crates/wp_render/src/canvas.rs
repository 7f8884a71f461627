//! Replays a recorded [`DrawList`] onto egui's background layer.
//!
//! The game draws in a fixed-size canvas (640x480 by default). The window can be
//! any size, so the canvas is scaled uniformly and centred ("letterboxed"). The
//! same transform maps the cursor back into canvas pixels for the pointer pose
//! source.

use egui::{Align2, Color32, CornerRadius, FontId, LayerId, Pos2, Rect, Stroke, TextureHandle};
use glam::Vec2;
use wp_core::draw::{DrawCommand, DrawList, Rgba, TextAlign};
use wp_core::video::VideoFrame;

const LETTERBOX_COLOR: Color32 = Color32::from_rgb(12, 12, 16);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    /// Screen-space position (egui points) of the canvas origin.
    pub origin: Pos2,
    /// Points per canvas pixel.
    pub scale: f32,
    pub canvas_size: Vec2,
}

impl CanvasTransform {
    pub fn fit(canvas_size: (u32, u32), screen: Rect) -> Self {
        let canvas = Vec2::new(canvas_size.0.max(1) as f32, canvas_size.1.max(1) as f32);
        let scale = (screen.width() / canvas.x).min(screen.height() / canvas.y).max(0.0);
        let used = canvas * scale;
        let origin = Pos2::new(
            screen.min.x + (screen.width() - used.x) * 0.5,
            screen.min.y + (screen.height() - used.y) * 0.5,
        );
        Self {
            origin,
            scale,
            canvas_size: canvas,
        }
    }

    pub fn to_screen(&self, p: Vec2) -> Pos2 {
        Pos2::new(self.origin.x + p.x * self.scale, self.origin.y + p.y * self.scale)
    }

    /// Inverse of [`to_screen`](Self::to_screen). `None` outside the canvas.
    pub fn to_canvas(&self, p: Pos2) -> Option<Vec2> {
        if self.scale <= 0.0 {
            return None;
        }
        let local = Vec2::new(
            (p.x - self.origin.x) / self.scale,
            (p.y - self.origin.y) / self.scale,
        );
        let inside = local.x >= 0.0
            && local.y >= 0.0
            && local.x <= self.canvas_size.x
            && local.y <= self.canvas_size.y;
        inside.then_some(local)
    }

    pub fn canvas_rect(&self) -> Rect {
        Rect::from_min_max(self.to_screen(Vec2::ZERO), self.to_screen(self.canvas_size))
    }
}

pub struct EguiCanvas {
    canvas_size: (u32, u32),
    video_texture: Option<(u64, TextureHandle)>,
}

impl EguiCanvas {
    pub fn new(canvas_size: (u32, u32)) -> Self {
        Self {
            canvas_size,
            video_texture: None,
        }
    }

    pub fn transform(&self, screen: Rect) -> CanvasTransform {
        CanvasTransform::fit(self.canvas_size, screen)
    }

    pub fn paint(&mut self, ctx: &egui::Context, list: &DrawList, video: Option<&VideoFrame>) {
        let transform = self.transform(ctx.screen_rect());
        let canvas_rect = transform.canvas_rect();
        let painter = ctx
            .layer_painter(LayerId::background())
            .with_clip_rect(ctx.screen_rect());
        painter.rect_filled(ctx.screen_rect(), CornerRadius::ZERO, LETTERBOX_COLOR);
        let painter = painter.with_clip_rect(canvas_rect);

        for command in list.commands() {
            match command {
                DrawCommand::Fade { color } => {
                    painter.rect_filled(canvas_rect, CornerRadius::ZERO, to_color32(*color));
                }
                DrawCommand::Video {
                    generation,
                    min,
                    size,
                } => {
                    let Some(texture) = self.video_texture(ctx, *generation, video) else {
                        continue;
                    };
                    let rect = Rect::from_min_max(
                        transform.to_screen(*min),
                        transform.to_screen(*min + *size),
                    );
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    painter.image(texture.id(), rect, uv, Color32::WHITE);
                }
                DrawCommand::Line { a, b, width, color } => {
                    painter.line_segment(
                        [transform.to_screen(*a), transform.to_screen(*b)],
                        Stroke::new(width * transform.scale, to_color32(*color)),
                    );
                }
                DrawCommand::Circle {
                    center,
                    diameter,
                    color,
                } => {
                    painter.circle_filled(
                        transform.to_screen(*center),
                        diameter * 0.5 * transform.scale,
                        to_color32(*color),
                    );
                }
                DrawCommand::RoundedRect {
                    min,
                    size,
                    radius,
                    color,
                } => {
                    let rect = Rect::from_min_max(
                        transform.to_screen(*min),
                        transform.to_screen(*min + *size),
                    );
                    let radius = (radius * transform.scale).round().clamp(0.0, 255.0) as u8;
                    painter.rect_filled(rect, CornerRadius::same(radius), to_color32(*color));
                }
                DrawCommand::Text {
                    text,
                    pos,
                    size,
                    align,
                    color,
                } => {
                    painter.text(
                        transform.to_screen(*pos),
                        to_align2(*align),
                        text,
                        FontId::proportional((size * transform.scale).max(1.0)),
                        to_color32(*color),
                    );
                }
            }
        }
    }

    /// Texture for the requested video generation, uploading only when the
    /// generation changed since the last paint.
    fn video_texture(
        &mut self,
        ctx: &egui::Context,
        generation: u64,
        video: Option<&VideoFrame>,
    ) -> Option<&TextureHandle> {
        let cached = matches!(&self.video_texture, Some((g, _)) if *g == generation);
        if !cached {
            let frame = video.filter(|f| f.generation == generation)?;
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [frame.width as usize, frame.height as usize],
                &frame.rgba,
            );
            match self.video_texture.as_mut() {
                Some((cached_generation, handle)) => {
                    handle.set(image, egui::TextureOptions::LINEAR);
                    *cached_generation = generation;
                }
                None => {
                    let handle =
                        ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR);
                    self.video_texture = Some((generation, handle));
                }
            }
        }
        self.video_texture.as_ref().map(|(_, handle)| handle)
    }
}

fn to_color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn to_align2(align: TextAlign) -> Align2 {
    match align {
        TextAlign::LeftTop => Align2::LEFT_TOP,
        TextAlign::CenterCenter => Align2::CENTER_CENTER,
        TextAlign::RightTop => Align2::RIGHT_TOP,
    }
}
