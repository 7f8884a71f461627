//! Immediate-mode drawing surface used by the frame controller.
//!
//! Game code never talks to the GPU. It issues primitive calls against a
//! [`DrawSurface`] in canvas pixels (origin top-left, y down). The application
//! records a frame into a [`DrawList`] and the renderer replays that list once
//! per presented frame, which keeps simulation and painting decoupled.

use glam::Vec2;

use crate::video::VideoFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);
    pub const GREEN: Rgba = Rgba::rgb(0, 255, 0);
    pub const DARK_BLUE: Rgba = Rgba::rgb(0, 0, 139);
    pub const DARK_RED: Rgba = Rgba::rgb(139, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    LeftTop,
    CenterCenter,
    RightTop,
}

pub trait DrawSurface {
    /// Fill the whole canvas. A translucent colour fades the previous content.
    fn fade(&mut self, color: Rgba);
    fn draw_video(&mut self, frame: &VideoFrame, min: Vec2, size: Vec2);
    fn line(&mut self, a: Vec2, b: Vec2, width: f32, color: Rgba);
    fn fill_circle(&mut self, center: Vec2, diameter: f32, color: Rgba);
    fn fill_rounded_rect(&mut self, min: Vec2, size: Vec2, radius: f32, color: Rgba);
    fn text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Rgba);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fade {
        color: Rgba,
    },
    Video {
        generation: u64,
        min: Vec2,
        size: Vec2,
    },
    Line {
        a: Vec2,
        b: Vec2,
        width: f32,
        color: Rgba,
    },
    Circle {
        center: Vec2,
        diameter: f32,
        color: Rgba,
    },
    RoundedRect {
        min: Vec2,
        size: Vec2,
        radius: f32,
        color: Rgba,
    },
    Text {
        text: String,
        pos: Vec2,
        size: f32,
        align: TextAlign,
        color: Rgba,
    },
}

/// A recorded frame. Video frames are referenced by generation, so the
/// painter uploads pixels only when the source produced a new frame.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl DrawSurface for DrawList {
    fn fade(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Fade { color });
    }

    fn draw_video(&mut self, frame: &VideoFrame, min: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::Video {
            generation: frame.generation,
            min,
            size,
        });
    }

    fn line(&mut self, a: Vec2, b: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line { a, b, width, color });
    }

    fn fill_circle(&mut self, center: Vec2, diameter: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            diameter,
            color,
        });
    }

    fn fill_rounded_rect(&mut self, min: Vec2, size: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::RoundedRect {
            min,
            size,
            radius,
            color,
        });
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            size,
            align,
            color,
        });
    }
}
