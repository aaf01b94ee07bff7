#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Flow Defence adapters.
//!
//! Scenes describe each frame as a list of textured sprite draws cut from a
//! single atlas plus a few text panels. Backends own the window, translate
//! device input into an [`EventStream`] and present whatever the scenes
//! wrote into the [`Frame`].

use anyhow::Result as AnyResult;
use flow_defence_core::{EventStream, SpriteRect, Viewport, WalkerColor};
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white, which leaves sprite texels untouched.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self::from_rgba_u8(red, green, blue, 255)
    }

    /// Creates a color from byte RGBA values.
    #[must_use]
    pub const fn from_rgba_u8(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: alpha as f32 / 255.0,
        }
    }
}

impl From<WalkerColor> for Color {
    fn from(color: WalkerColor) -> Self {
        Self::from_rgba_u8(color.red(), color.green(), color.blue(), color.alpha())
    }
}

/// Single textured quad cut from the sprite atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    /// Screen position of the sprite's centre.
    pub position: Vec2,
    /// Atlas rectangle to sample.
    pub source: SpriteRect,
    /// Scale applied to the source rectangle.
    pub scale: Vec2,
    /// Rotation around the centre in radians.
    pub rotation: f32,
    /// Color multiplied with the texels.
    pub tint: Color,
}

impl DrawCommand {
    /// Draws `source` centred on `position` without scaling, rotation or tint.
    #[must_use]
    pub const fn sprite(position: Vec2, source: SpriteRect) -> Self {
        Self {
            position,
            source,
            scale: Vec2::ONE,
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }

    /// Returns the command rotated by `rotation` radians.
    #[must_use]
    pub const fn rotated(self, rotation: f32) -> Self {
        Self { rotation, ..self }
    }

    /// Returns the command tinted with `tint`.
    #[must_use]
    pub const fn tinted(self, tint: Color) -> Self {
        Self { tint, ..self }
    }
}

/// Immediate-mode text panel shown on top of the sprites.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuiPanel {
    /// Panel heading.
    pub title: String,
    /// Lines displayed below the heading.
    pub lines: Vec<String>,
}

impl GuiPanel {
    /// Creates an empty panel with the given heading.
    #[must_use]
    pub fn new<T>(title: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    /// Appends a line of text.
    pub fn line<T>(&mut self, text: T)
    where
        T: Into<String>,
    {
        self.lines.push(text.into());
    }
}

/// Input snapshot gathered by adapters before updating the scenes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer position in screen coordinates, if the pointer is inside the window.
    pub pointer: Option<Vec2>,
    /// Input events raised since the previous frame.
    pub events: EventStream,
}

/// Output collected from the scenes for a single frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Sprites in back-to-front order.
    pub draws: Vec<DrawCommand>,
    /// Text panels in back-to-front order.
    pub panels: Vec<GuiPanel>,
    /// Set when the application asked to stop.
    pub exit_requested: bool,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything recorded for the previous frame.
    pub fn clear(&mut self) {
        self.draws.clear();
        self.panels.clear();
    }

    /// Flags the application for shutdown after this frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }
}

/// Static description of the window a backend should open.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Screen rectangle the scenes draw into.
    pub viewport: Viewport,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    ///
    /// Returns an error when the viewport has no area.
    pub fn new<T>(
        window_title: T,
        clear_color: Color,
        viewport: Viewport,
    ) -> Result<Self, RenderingError>
    where
        T: Into<String>,
    {
        let size = viewport.max() - viewport.min();
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(RenderingError::InvalidViewport {
                width: size.x,
                height: size.y,
            });
        }

        Ok(Self {
            window_title: window_title.into(),
            clear_color,
            viewport,
        })
    }

    /// Size of the viewport in pixels.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.viewport.max() - self.viewport.min()
    }
}

/// Rendering backend capable of presenting Flow Defence scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update` closure receives the simulated frame delta and
    /// the input captured by the adapter, and fills the frame that is
    /// presented afterwards. The backend stops once the closure sets
    /// [`Frame::exit_requested`].
    fn run<F>(self, presentation: Presentation, update: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Frame);
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The viewport must have a positive width and height.
    InvalidViewport {
        /// Width that failed validation.
        width: f32,
        /// Height that failed validation.
        height: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidViewport { width, height } => {
                write!(
                    f,
                    "viewport must have a positive area (received {width}x{height})"
                )
            }
        }
    }
}

impl Error for RenderingError {}
