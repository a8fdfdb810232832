//! Pointer state machine and dispatch to the active modules.

use super::events::{InputEvent, MouseButton, PenKind, PenLevels, PointerEvent, PointerKind};
use super::module::{ModuleContext, Modules, PointerNotification};
use crate::draw::Canvas;

/// Button state of the pointer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A button is down and the pointer has not moved since
    Pressed,
    Dragging,
}

/// Whether the pointer is over the canvas viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hover {
    #[default]
    Outside,
    Inside,
}

/// Latest pen readings, visible to modules through [`ModuleContext::pen`].
#[derive(Debug, Clone, Default)]
pub struct PenState {
    kind: Option<PenKind>,
    down: bool,
    raw_pressure: f64,
    pressure: f64,
    tilt: (f64, f64),
    location: (f64, f64),
    device_location: Option<(f64, f64)>,
    location_changed: bool,
}

impl PenState {
    /// Pen end near the surface, `None` for a plain mouse.
    pub fn kind(&self) -> Option<PenKind> {
        self.kind
    }

    pub fn is_pen(&self) -> bool {
        self.kind.is_some()
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Squared pressure while down, zero while up. A mouse reports full
    /// pressure while a button is held.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn tilt(&self) -> (f64, f64) {
        self.tilt
    }

    pub fn location(&self) -> (f64, f64) {
        self.location
    }

    /// True only after the device actually moved.
    pub fn location_changed(&self) -> bool {
        self.location_changed
    }

    fn apply_levels(&mut self, levels: PenLevels) {
        if let Some(pressure) = levels.pressure {
            self.raw_pressure = pressure.clamp(0.0, 1.0);
            if self.down {
                self.pressure = self.sampled_pressure();
            }
        }
        if let Some(tilt) = levels.tilt {
            self.tilt = tilt;
        }
        if let Some(location) = levels.location {
            self.device_location = Some(location);
            self.location = location;
        }
        if levels.moved {
            self.location_changed = true;
        }
    }

    fn sampled_pressure(&self) -> f64 {
        if self.is_pen() {
            self.raw_pressure * self.raw_pressure
        } else {
            1.0
        }
    }

    /// Follows the pointer unless the device reports its own location.
    fn pointer_at(&mut self, x: f64, y: f64) {
        if self.device_location.is_some() {
            return;
        }
        if self.location != (x, y) {
            self.location = (x, y);
            if !self.is_pen() {
                self.location_changed = true;
            }
        }
    }

    fn press(&mut self) {
        self.down = true;
        self.pressure = self.sampled_pressure();
    }

    fn release(&mut self) {
        self.down = false;
        self.pressure = 0.0;
    }

    fn set_kind(&mut self, kind: Option<PenKind>) {
        self.kind = kind;
        if kind.is_none() {
            self.device_location = None;
            self.raw_pressure = 0.0;
            self.tilt = (0.0, 0.0);
        }
    }
}

/// Turns raw host events into module notifications.
///
/// The `events`, `create_events` and `affect_events` switches only gate
/// notifications; the pointer state keeps tracking while they are off.
#[derive(Debug)]
pub struct InputRouter {
    phase: Phase,
    hover: Hover,
    pen: PenState,
    events_enabled: bool,
    create_events: bool,
    affect_events: bool,
    redraw_requested: bool,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputRouter {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            hover: Hover::Outside,
            pen: PenState::default(),
            events_enabled: true,
            create_events: true,
            affect_events: true,
            redraw_requested: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hover(&self) -> Hover {
        self.hover
    }

    pub fn pen(&self) -> &PenState {
        &self.pen
    }

    pub fn events_enabled(&self) -> bool {
        self.events_enabled
    }

    pub fn set_events_enabled(&mut self, enabled: bool) {
        self.events_enabled = enabled;
    }

    pub fn create_events(&self) -> bool {
        self.create_events
    }

    pub fn set_create_events(&mut self, enabled: bool) {
        self.create_events = enabled;
    }

    pub fn affect_events(&self) -> bool {
        self.affect_events
    }

    pub fn set_affect_events(&mut self, enabled: bool) {
        self.affect_events = enabled;
    }

    /// Processes one raw event, then delivers any canvas notices the modules
    /// raised along the way. A redraw requested by any callback runs last.
    pub fn handle(&mut self, event: InputEvent, canvas: &mut Canvas, modules: &mut Modules) {
        self.redraw_requested = false;
        match event {
            InputEvent::Moved { x, y } => self.on_moved(x, y, canvas, modules),
            InputEvent::Pressed { x, y, button } => self.on_pressed(x, y, button, canvas, modules),
            InputEvent::Released { x, y, button } => {
                self.on_released(x, y, button, canvas, modules)
            }
            InputEvent::Entered { x, y } => {
                self.pen.pointer_at(x, y);
                self.set_hover(Hover::Inside, x, y, canvas, modules);
            }
            InputEvent::Exited { x, y } => {
                self.set_hover(Hover::Outside, x, y, canvas, modules);
            }
            InputEvent::PenLevels(levels) => self.pen.apply_levels(levels),
            InputEvent::PenProximity(kind) => self.on_proximity(kind, canvas),
        }
        if modules.deliver_notices(canvas, &self.pen) {
            self.redraw_requested = true;
        }
        if std::mem::take(&mut self.redraw_requested) {
            modules.redraw(canvas, &self.pen);
        }
    }

    fn on_moved(&mut self, x: f64, y: f64, canvas: &mut Canvas, modules: &mut Modules) {
        self.pen.pointer_at(x, y);
        let hover = if canvas.contains(x, y) {
            Hover::Inside
        } else {
            Hover::Outside
        };
        self.set_hover(hover, x, y, canvas, modules);

        let notification = match self.phase {
            Phase::Idle => PointerNotification::Moved,
            Phase::Pressed | Phase::Dragging => {
                self.phase = Phase::Dragging;
                PointerNotification::Dragged
            }
        };
        let event = self.event(x, y);
        self.notify(notification, &event, canvas, modules);
        self.pen.location_changed = false;
    }

    fn on_pressed(
        &mut self,
        x: f64,
        y: f64,
        button: MouseButton,
        canvas: &mut Canvas,
        modules: &mut Modules,
    ) {
        self.pen.pointer_at(x, y);
        self.pen.press();
        self.phase = Phase::Pressed;
        let event = self.event(x, y).with_button(button);
        self.notify(PointerNotification::Pressed, &event, canvas, modules);
    }

    fn on_released(
        &mut self,
        x: f64,
        y: f64,
        button: MouseButton,
        canvas: &mut Canvas,
        modules: &mut Modules,
    ) {
        self.pen.pointer_at(x, y);
        self.pen.release();
        let clicked = self.phase == Phase::Pressed;
        self.phase = Phase::Idle;

        let event = self.event(x, y).with_button(button);
        self.notify(PointerNotification::Released, &event, canvas, modules);
        if clicked {
            self.notify(PointerNotification::Clicked, &event, canvas, modules);
        }
    }

    fn on_proximity(&mut self, kind: Option<PenKind>, canvas: &mut Canvas) {
        log::debug!("Pen proximity: {:?}", kind);
        self.pen.set_kind(kind);
        match kind {
            Some(PenKind::Eraser) => canvas.set_background_active(true),
            Some(PenKind::Stylus) => canvas.set_background_active(false),
            None => {}
        }
    }

    /// Fires entered/exited only when the hover state actually flips.
    fn set_hover(
        &mut self,
        hover: Hover,
        x: f64,
        y: f64,
        canvas: &mut Canvas,
        modules: &mut Modules,
    ) {
        if self.hover == hover {
            return;
        }
        self.hover = hover;
        let notification = match hover {
            Hover::Inside => PointerNotification::Entered,
            Hover::Outside => PointerNotification::Exited,
        };
        let event = self.event(x, y);
        self.notify(notification, &event, canvas, modules);
    }

    fn event(&self, x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(x, y, PointerKind::from(self.pen.kind))
    }

    fn notify(
        &mut self,
        notification: PointerNotification,
        event: &PointerEvent,
        canvas: &mut Canvas,
        modules: &mut Modules,
    ) {
        if !self.events_enabled {
            return;
        }
        let mut ctx = ModuleContext::new(canvas, &self.pen);
        modules.dispatch(
            notification,
            event,
            &mut ctx,
            self.create_events,
            self.affect_events,
        );
        if ctx.redraw_requested() {
            self.redraw_requested = true;
        }
    }
}
