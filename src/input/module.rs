//! Create and affect modules and the registry that dispatches to them.

use super::events::PointerEvent;
use super::router::PenState;
use crate::draw::{Canvas, CanvasNotice};

/// Upper bound on notice rounds per delivery; a module that commits from
/// `on_committed` on every call would otherwise never settle.
const MAX_NOTICE_ROUNDS: usize = 16;

/// Shared state handed to every module callback.
pub struct ModuleContext<'a> {
    pub canvas: &'a mut Canvas,
    pub pen: &'a PenState,
    redraw_requested: bool,
}

impl<'a> ModuleContext<'a> {
    pub fn new(canvas: &'a mut Canvas, pen: &'a PenState) -> Self {
        Self {
            canvas,
            pen,
            redraw_requested: false,
        }
    }

    /// Asks for an affect pass and a canvas rebuild once the current
    /// notification has reached every module.
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }
}

/// A drawing tool driven by pointer notifications.
///
/// Create modules originate shapes (only one is active at a time); affect
/// modules transform existing or in-progress shapes (any number may be
/// active). Every method defaults to doing nothing.
pub trait CanvasModule {
    fn name(&self) -> &str;

    fn on_pointer_moved(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}
    fn on_pointer_pressed(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}
    fn on_pointer_clicked(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}
    fn on_pointer_entered(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}
    fn on_pointer_exited(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}
    fn on_pointer_released(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}
    fn on_pointer_dragged(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {}

    /// The canvas was cleared.
    fn on_cleared(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// In-progress shapes were moved into the committed record.
    fn on_committed(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// Applied by active affect modules at the start of [`Modules::redraw`].
    fn affect(&mut self, _ctx: &mut ModuleContext<'_>) {}
}

/// Pointer notifications a module can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerNotification {
    Moved,
    Pressed,
    Clicked,
    Entered,
    Exited,
    Released,
    Dragged,
}

impl PointerNotification {
    fn send(self, module: &mut dyn CanvasModule, event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        match self {
            PointerNotification::Moved => module.on_pointer_moved(event, ctx),
            PointerNotification::Pressed => module.on_pointer_pressed(event, ctx),
            PointerNotification::Clicked => module.on_pointer_clicked(event, ctx),
            PointerNotification::Entered => module.on_pointer_entered(event, ctx),
            PointerNotification::Exited => module.on_pointer_exited(event, ctx),
            PointerNotification::Released => module.on_pointer_released(event, ctx),
            PointerNotification::Dragged => module.on_pointer_dragged(event, ctx),
        }
    }
}

/// Registered modules plus which of them are active.
#[derive(Default)]
pub struct Modules {
    creates: Vec<Box<dyn CanvasModule>>,
    current_create: Option<usize>,
    affects: Vec<Box<dyn CanvasModule>>,
    active_affects: Vec<bool>,
}

impl Modules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a create module and returns its index. The first one
    /// registered becomes current.
    pub fn add_create(&mut self, module: Box<dyn CanvasModule>) -> usize {
        log::debug!("Registered create module '{}'", module.name());
        self.creates.push(module);
        let index = self.creates.len() - 1;
        if self.current_create.is_none() {
            self.current_create = Some(index);
        }
        index
    }

    /// Registers an inactive affect module and returns its index.
    pub fn add_affect(&mut self, module: Box<dyn CanvasModule>) -> usize {
        log::debug!("Registered affect module '{}'", module.name());
        self.affects.push(module);
        self.active_affects.push(false);
        self.affects.len() - 1
    }

    pub fn create_count(&self) -> usize {
        self.creates.len()
    }

    pub fn affect_count(&self) -> usize {
        self.affects.len()
    }

    pub fn current_create(&self) -> Option<usize> {
        self.current_create
    }

    pub fn current_create_name(&self) -> Option<&str> {
        self.current_create
            .and_then(|index| self.creates.get(index))
            .map(|module| module.name())
    }

    /// Selects the active create module; `None` deselects. Out-of-range
    /// indices are ignored and return `false`.
    pub fn select_create(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(index) if index >= self.creates.len() => false,
            _ => {
                self.current_create = index;
                true
            }
        }
    }

    pub fn is_affect_active(&self, index: usize) -> bool {
        self.active_affects.get(index).copied().unwrap_or(false)
    }

    pub fn set_affect_active(&mut self, index: usize, active: bool) -> bool {
        match self.active_affects.get_mut(index) {
            Some(slot) => {
                *slot = active;
                true
            }
            None => false,
        }
    }

    /// Forwards a pointer notification to the current create module (when
    /// `to_create`) and then the active affect modules in index order (when
    /// `to_affects`).
    pub fn dispatch(
        &mut self,
        notification: PointerNotification,
        event: &PointerEvent,
        ctx: &mut ModuleContext<'_>,
        to_create: bool,
        to_affects: bool,
    ) {
        if to_create {
            if let Some(module) = self.current_create.and_then(|i| self.creates.get_mut(i)) {
                notification.send(module.as_mut(), event, ctx);
            }
        }
        if to_affects {
            for (module, active) in self.affects.iter_mut().zip(&self.active_affects) {
                if *active {
                    notification.send(module.as_mut(), event, ctx);
                }
            }
        }
    }

    /// Delivers queued canvas notices to the current create module and every
    /// active affect module. Notices raised while delivering are delivered
    /// too.
    ///
    /// Returns `true` when a module requested a redraw from its callback.
    pub fn deliver_notices(&mut self, canvas: &mut Canvas, pen: &PenState) -> bool {
        let mut redraw_requested = false;
        for _ in 0..MAX_NOTICE_ROUNDS {
            let notices = canvas.take_notices();
            if notices.is_empty() {
                return redraw_requested;
            }
            let mut ctx = ModuleContext::new(canvas, pen);
            for notice in notices {
                self.for_each_active(|module| match notice {
                    CanvasNotice::Committed => module.on_committed(&mut ctx),
                    CanvasNotice::Cleared => module.on_cleared(&mut ctx),
                });
            }
            redraw_requested |= ctx.redraw_requested();
        }
        if canvas.has_notices() {
            log::warn!(
                "Modules kept raising canvas notices after {} rounds; dropping the rest",
                MAX_NOTICE_ROUNDS
            );
            canvas.take_notices();
        }
        redraw_requested
    }

    /// Lets active affect modules apply their transforms in index order, then
    /// rebuilds the canvas once.
    ///
    /// While redraw is disabled on the canvas the rebuild is skipped and the
    /// cache stays stale; use [`Canvas::force_redraw`] to override. Returns
    /// `true` when the cache was rebuilt.
    pub fn redraw(&mut self, canvas: &mut Canvas, pen: &PenState) -> bool {
        {
            let mut ctx = ModuleContext::new(canvas, pen);
            for (module, active) in self.affects.iter_mut().zip(&self.active_affects) {
                if *active {
                    module.affect(&mut ctx);
                }
            }
        }
        let rebuilt = if canvas.redraw_enabled() {
            canvas.force_redraw()
        } else {
            log::debug!("Redraw disabled, canvas rebuild deferred");
            false
        };
        if self.deliver_notices(canvas, pen) {
            log::debug!("Redraw requested during redraw, ignored");
        }
        rebuilt
    }

    fn for_each_active<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn CanvasModule),
    {
        if let Some(module) = self.current_create.and_then(|i| self.creates.get_mut(i)) {
            f(module.as_mut());
        }
        for (module, active) in self.affects.iter_mut().zip(&self.active_affects) {
            if *active {
                f(module.as_mut());
            }
        }
    }
}
