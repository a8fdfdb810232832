//! Generic input event types fed to the router by the host.

/// Mouse button identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left mouse button (primary drawing button)
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Which end of a tablet pen is near the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenKind {
    Stylus,
    Eraser,
}

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Stylus,
    Eraser,
}

impl From<Option<PenKind>> for PointerKind {
    fn from(pen: Option<PenKind>) -> Self {
        match pen {
            None => PointerKind::Mouse,
            Some(PenKind::Stylus) => PointerKind::Stylus,
            Some(PenKind::Eraser) => PointerKind::Eraser,
        }
    }
}

/// Auxiliary channels reported by a pen device.
///
/// Every channel is optional; absent values leave the previous reading in
/// place (or fall back to pointer coordinates for the location).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PenLevels {
    /// Raw pressure in `0.0..=1.0`
    pub pressure: Option<f64>,
    /// Tilt around the x and y axes, in radians
    pub tilt: Option<(f64, f64)>,
    /// Absolute location in canvas coordinates
    pub location: Option<(f64, f64)>,
    /// Set when the device reported actual movement in this sample
    pub moved: bool,
}

/// Raw events delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Moved { x: f64, y: f64 },
    Pressed { x: f64, y: f64, button: MouseButton },
    Released { x: f64, y: f64, button: MouseButton },
    Entered { x: f64, y: f64 },
    Exited { x: f64, y: f64 },
    PenLevels(PenLevels),
    /// A pen came near the surface (`Some`) or left it (`None`)
    PenProximity(Option<PenKind>),
}

/// What a module receives for each pointer notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Button involved in a press, release or click
    pub button: Option<MouseButton>,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, kind: PointerKind) -> Self {
        Self {
            x,
            y,
            button: None,
            kind,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}
