//! RGBA color type, predefined constants and the foreground/background slots.

use serde::{Deserialize, Serialize};

/// Represents an RGBA color with floating-point components.
///
/// All components are in the range 0.0 (minimum) to 1.0 (maximum).
///
/// # Examples
///
/// ```
/// use alchemy::draw::Color;
/// let red = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
/// let semi_transparent_blue = Color { r: 0.0, g: 0.0, b: 1.0, a: 0.5 };
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component (0.0 = no red, 1.0 = full red)
    pub r: f64,
    /// Green component (0.0 = no green, 1.0 = full green)
    pub g: f64,
    /// Blue component (0.0 = no blue, 1.0 = full blue)
    pub b: f64,
    /// Alpha/transparency (0.0 = fully transparent, 1.0 = fully opaque)
    pub a: f64,
}

impl Color {
    /// Creates a new color from RGBA components.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with the alpha replaced.
    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Same color, fully opaque. Background colors never carry alpha.
    pub fn opaque(self) -> Self {
        self.with_alpha(1.0)
    }

    pub(crate) fn apply_source(&self, ctx: &cairo::Context) {
        ctx.set_source_rgba(self.r, self.g, self.b, self.a);
    }
}

// ============================================================================
// Predefined Color Constants
// ============================================================================

/// Predefined red color (R=1.0, G=0.0, B=0.0)
pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// Predefined green color (R=0.0, G=1.0, B=0.0)
pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);

/// Predefined blue color (R=0.0, G=0.0, B=1.0)
pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

/// Predefined yellow color (R=1.0, G=1.0, B=0.0)
pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0, 1.0);

/// Predefined orange color (R=1.0, G=0.5, B=0.0)
pub const ORANGE: Color = Color::new(1.0, 0.5, 0.0, 1.0);

/// Predefined pink/magenta color (R=1.0, G=0.0, B=1.0)
pub const PINK: Color = Color::new(1.0, 0.0, 1.0, 1.0);

/// Predefined white color (R=1.0, G=1.0, B=1.0)
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Predefined black color (R=0.0, G=0.0, B=0.0)
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// Fully transparent color
pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

/// Which of the two color slots new shapes are stamped with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActiveSlot {
    #[default]
    Foreground,
    Background,
}

/// Foreground and background colors plus the slot currently used for drawing.
///
/// Activating the background (e.g. for an eraser) never copies one slot into
/// the other, so switching back restores the foreground exactly, alpha
/// included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorSlots {
    foreground: Color,
    background: Color,
    active: ActiveSlot,
}

impl ColorSlots {
    pub fn new(foreground: Color, background: Color) -> Self {
        Self {
            foreground,
            background: background.opaque(),
            active: ActiveSlot::Foreground,
        }
    }

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn active_slot(&self) -> ActiveSlot {
        self.active
    }

    pub fn is_background_active(&self) -> bool {
        self.active == ActiveSlot::Background
    }

    /// Color new shapes should be stamped with.
    pub fn active(&self) -> Color {
        match self.active {
            ActiveSlot::Foreground => self.foreground,
            ActiveSlot::Background => self.background,
        }
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.foreground = color;
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color.opaque();
    }

    /// Writes to whichever slot is active.
    ///
    /// Returns `true` when the background changed and the canvas must be
    /// re-composited.
    pub fn set_active(&mut self, color: Color) -> bool {
        match self.active {
            ActiveSlot::Foreground => {
                self.foreground = color;
                false
            }
            ActiveSlot::Background => {
                self.background = color.opaque();
                true
            }
        }
    }

    pub fn set_background_active(&mut self, active: bool) {
        self.active = if active {
            ActiveSlot::Background
        } else {
            ActiveSlot::Foreground
        };
    }

    /// Toggles the active slot.
    pub fn swap(&mut self) {
        self.set_background_active(!self.is_background_active());
    }
}
