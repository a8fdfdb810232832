use super::*;
use crate::draw::{Canvas, CanvasSettings, Category, Path, Shape, WHITE};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

/// Records every callback as `"<name>:<callback>"`.
struct Recorder {
    name: &'static str,
    log: Log,
    pressures: Rc<RefCell<Vec<f64>>>,
}

impl Recorder {
    fn boxed(name: &'static str, log: &Log) -> Box<Self> {
        Box::new(Self {
            name,
            log: Rc::clone(log),
            pressures: Rc::new(RefCell::new(Vec::new())),
        })
    }

    fn push(&self, what: &str) {
        self.log.borrow_mut().push(format!("{}:{}", self.name, what));
    }
}

impl CanvasModule for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn on_pointer_moved(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {
        self.push("moved");
    }

    fn on_pointer_pressed(&mut self, _event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        self.pressures.borrow_mut().push(ctx.pen.pressure());
        self.push("pressed");
    }

    fn on_pointer_clicked(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {
        self.push("clicked");
    }

    fn on_pointer_entered(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {
        self.push("entered");
    }

    fn on_pointer_exited(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {
        self.push("exited");
    }

    fn on_pointer_released(&mut self, _event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        self.pressures.borrow_mut().push(ctx.pen.pressure());
        self.push("released");
    }

    fn on_pointer_dragged(&mut self, _event: &PointerEvent, _ctx: &mut ModuleContext<'_>) {
        self.push("dragged");
    }

    fn on_cleared(&mut self, _ctx: &mut ModuleContext<'_>) {
        self.push("cleared");
    }

    fn on_committed(&mut self, _ctx: &mut ModuleContext<'_>) {
        self.push("committed");
    }
}

/// Clears the canvas whenever it is clicked.
struct ClearOnClick;

impl CanvasModule for ClearOnClick {
    fn name(&self) -> &str {
        "clear-on-click"
    }

    fn on_pointer_clicked(&mut self, _event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        ctx.canvas.clear();
    }
}

fn canvas() -> Canvas {
    Canvas::new(100, 100, CanvasSettings::default())
}

fn entries(log: &Log, prefix: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .cloned()
        .collect()
}

fn moved(x: f64, y: f64) -> InputEvent {
    InputEvent::Moved { x, y }
}

fn pressed(x: f64, y: f64) -> InputEvent {
    InputEvent::Pressed {
        x,
        y,
        button: MouseButton::Left,
    }
}

fn released(x: f64, y: f64) -> InputEvent {
    InputEvent::Released {
        x,
        y,
        button: MouseButton::Left,
    }
}

#[test]
fn staying_inside_enters_once() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    modules.add_create(Recorder::boxed("create", &log));
    let mut router = InputRouter::new();

    router.handle(InputEvent::Entered { x: 5.0, y: 5.0 }, &mut canvas, &mut modules);
    for step in 0..10 {
        router.handle(moved(10.0 + step as f64, 10.0), &mut canvas, &mut modules);
    }

    let log = log.borrow();
    assert_eq!(log.iter().filter(|e| e.ends_with(":entered")).count(), 1);
    assert_eq!(log.iter().filter(|e| e.ends_with(":moved")).count(), 10);
    assert_eq!(router.hover(), Hover::Inside);
}

#[test]
fn motion_across_bounds_fires_transitions() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    modules.add_create(Recorder::boxed("create", &log));
    let mut router = InputRouter::new();

    router.handle(moved(10.0, 10.0), &mut canvas, &mut modules);
    router.handle(moved(150.0, 10.0), &mut canvas, &mut modules);
    router.handle(moved(160.0, 10.0), &mut canvas, &mut modules);
    router.handle(InputEvent::Exited { x: 160.0, y: 10.0 }, &mut canvas, &mut modules);

    assert_eq!(
        *log.borrow(),
        vec![
            "create:entered",
            "create:moved",
            "create:exited",
            "create:moved",
            "create:moved",
        ]
    );
}

#[test]
fn dispatches_create_then_affects_in_order() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    modules.add_create(Recorder::boxed("create", &log));
    let first = modules.add_affect(Recorder::boxed("affect0", &log));
    let _inactive = modules.add_affect(Recorder::boxed("affect1", &log));
    let third = modules.add_affect(Recorder::boxed("affect2", &log));
    modules.set_affect_active(first, true);
    modules.set_affect_active(third, true);
    let mut router = InputRouter::new();
    router.handle(InputEvent::Entered { x: 1.0, y: 1.0 }, &mut canvas, &mut modules);
    log.borrow_mut().clear();

    router.handle(pressed(1.0, 1.0), &mut canvas, &mut modules);

    assert_eq!(
        *log.borrow(),
        vec!["create:pressed", "affect0:pressed", "affect2:pressed"]
    );
}

#[test]
fn switches_suppress_notifications_without_touching_store() {
    let log = Log::default();
    let mut canvas = canvas();
    canvas.push(
        Category::Committed,
        Shape::fill(Path::rectangle(0.0, 0.0, 5.0, 5.0), WHITE),
    );
    let mut modules = Modules::new();
    modules.add_create(Recorder::boxed("create", &log));
    let affect = modules.add_affect(Recorder::boxed("affect", &log));
    modules.set_affect_active(affect, true);
    let mut router = InputRouter::new();

    router.set_events_enabled(false);
    router.handle(moved(1.0, 1.0), &mut canvas, &mut modules);
    assert!(log.borrow().is_empty());
    assert_eq!(router.hover(), Hover::Inside);

    router.set_events_enabled(true);
    router.set_create_events(false);
    router.handle(pressed(1.0, 1.0), &mut canvas, &mut modules);
    assert_eq!(*log.borrow(), vec!["affect:pressed"]);

    router.set_create_events(true);
    router.set_affect_events(false);
    router.handle(released(1.0, 1.0), &mut canvas, &mut modules);
    assert_eq!(entries(&log, "affect"), vec!["affect:pressed"]);
    assert_eq!(entries(&log, "create"), vec!["create:released", "create:clicked"]);

    assert_eq!(canvas.shapes(Category::Committed).len(), 1);
}

#[test]
fn click_only_without_drag() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    modules.add_create(Recorder::boxed("create", &log));
    let mut router = InputRouter::new();

    router.handle(pressed(10.0, 10.0), &mut canvas, &mut modules);
    assert_eq!(router.phase(), Phase::Pressed);
    router.handle(moved(12.0, 10.0), &mut canvas, &mut modules);
    assert_eq!(router.phase(), Phase::Dragging);
    router.handle(released(12.0, 10.0), &mut canvas, &mut modules);
    assert_eq!(router.phase(), Phase::Idle);

    let log = log.borrow();
    assert!(log.contains(&"create:dragged".to_string()));
    assert!(!log.contains(&"create:clicked".to_string()));
}

#[test]
fn pressure_is_squared_and_never_stale() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    let recorder = Recorder::boxed("create", &log);
    let pressures = Rc::clone(&recorder.pressures);
    modules.add_create(recorder);
    let mut router = InputRouter::new();

    router.handle(
        InputEvent::PenProximity(Some(PenKind::Stylus)),
        &mut canvas,
        &mut modules,
    );
    let levels = PenLevels {
        pressure: Some(0.5),
        ..PenLevels::default()
    };
    router.handle(InputEvent::PenLevels(levels), &mut canvas, &mut modules);
    assert_eq!(router.pen().pressure(), 0.0);

    router.handle(pressed(5.0, 5.0), &mut canvas, &mut modules);
    assert_eq!(router.pen().pressure(), 0.25);

    router.handle(released(5.0, 5.0), &mut canvas, &mut modules);
    assert_eq!(router.pen().pressure(), 0.0);

    let levels = PenLevels {
        pressure: Some(0.9),
        ..PenLevels::default()
    };
    router.handle(InputEvent::PenLevels(levels), &mut canvas, &mut modules);
    assert_eq!(router.pen().pressure(), 0.0);
    assert_eq!(*pressures.borrow(), vec![0.25, 0.0]);
}

#[test]
fn pen_location_changes_only_on_device_motion() {
    let mut canvas = canvas();
    let mut modules = Modules::new();
    let mut router = InputRouter::new();
    router.handle(
        InputEvent::PenProximity(Some(PenKind::Stylus)),
        &mut canvas,
        &mut modules,
    );

    router.handle(moved(3.0, 3.0), &mut canvas, &mut modules);
    assert_eq!(router.pen().location(), (3.0, 3.0));
    assert!(!router.pen().location_changed());

    let levels = PenLevels {
        location: Some((20.5, 30.25)),
        tilt: Some((0.1, -0.2)),
        moved: true,
        ..PenLevels::default()
    };
    router.handle(InputEvent::PenLevels(levels), &mut canvas, &mut modules);
    assert!(router.pen().location_changed());
    assert_eq!(router.pen().location(), (20.5, 30.25));
    assert_eq!(router.pen().tilt(), (0.1, -0.2));

    router.handle(moved(20.0, 30.0), &mut canvas, &mut modules);
    assert!(!router.pen().location_changed());
    assert_eq!(router.pen().location(), (20.5, 30.25));
}

#[test]
fn eraser_selects_background_slot() {
    let mut canvas = canvas();
    let mut modules = Modules::new();
    let mut router = InputRouter::new();

    router.handle(
        InputEvent::PenProximity(Some(PenKind::Eraser)),
        &mut canvas,
        &mut modules,
    );
    assert!(canvas.colors().is_background_active());

    router.handle(
        InputEvent::PenProximity(Some(PenKind::Stylus)),
        &mut canvas,
        &mut modules,
    );
    assert!(!canvas.colors().is_background_active());
}

#[test]
fn clear_from_callback_reaches_every_active_module() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    modules.add_create(Box::new(ClearOnClick));
    let affect = modules.add_affect(Recorder::boxed("affect", &log));
    modules.set_affect_active(affect, true);
    let mut router = InputRouter::new();

    router.handle(pressed(1.0, 1.0), &mut canvas, &mut modules);
    router.handle(released(1.0, 1.0), &mut canvas, &mut modules);

    assert_eq!(
        entries(&log, "affect"),
        vec!["affect:pressed", "affect:released", "affect:clicked", "affect:cleared"]
    );
    assert!(!canvas.has_notices());
}

#[test]
fn freehand_commits_stroke_on_release() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = Modules::new();
    modules.add_create(Box::new(Freehand::new()));
    let affect = modules.add_affect(Recorder::boxed("affect", &log));
    modules.set_affect_active(affect, true);
    let mut router = InputRouter::new();

    router.handle(pressed(10.0, 10.0), &mut canvas, &mut modules);
    router.handle(moved(20.0, 15.0), &mut canvas, &mut modules);
    router.handle(moved(30.0, 25.0), &mut canvas, &mut modules);
    assert_eq!(canvas.shapes(Category::Creating).len(), 1);
    assert_eq!(
        canvas.current(Category::Creating).map(|s| s.path.segments().len()),
        Some(3)
    );

    router.handle(released(30.0, 25.0), &mut canvas, &mut modules);
    assert!(canvas.shapes(Category::Creating).is_empty());
    assert_eq!(canvas.shapes(Category::Committed).len(), 1);
    assert!(entries(&log, "affect").contains(&"affect:committed".to_string()));
}

#[test]
fn select_create_rejects_unknown_index() {
    let log = Log::default();
    let mut modules = Modules::new();
    modules.add_create(Recorder::boxed("first", &log));
    modules.add_create(Recorder::boxed("second", &log));

    assert_eq!(modules.current_create_name(), Some("first"));
    assert!(modules.select_create(Some(1)));
    assert_eq!(modules.current_create_name(), Some("second"));
    assert!(!modules.select_create(Some(5)));
    assert_eq!(modules.current_create(), Some(1));
    assert!(!modules.set_affect_active(0, true));
}

/// Logs its `affect` pass and nudges the in-progress shape.
struct Nudge {
    name: &'static str,
    log: Log,
}

impl CanvasModule for Nudge {
    fn name(&self) -> &str {
        self.name
    }

    fn affect(&mut self, ctx: &mut ModuleContext<'_>) {
        self.log
            .borrow_mut()
            .push(format!("{}:affect:{}", self.name, ctx.canvas.is_cache_stale()));
        ctx.canvas.update_current(Category::Creating, |shape| {
            shape.line_width += 1.0;
        });
    }
}

/// Requests a redraw on every drag.
struct RedrawOnDrag;

impl CanvasModule for RedrawOnDrag {
    fn name(&self) -> &str {
        "redraw-on-drag"
    }

    fn on_pointer_dragged(&mut self, _event: &PointerEvent, ctx: &mut ModuleContext<'_>) {
        ctx.request_redraw();
    }
}

fn nudges(log: &Log) -> Modules {
    let mut modules = Modules::new();
    for name in ["affect0", "affect1", "affect2"] {
        let index = modules.add_affect(Box::new(Nudge {
            name,
            log: Rc::clone(log),
        }));
        modules.set_affect_active(index, name != "affect1");
    }
    modules
}

fn stroke() -> Shape {
    Shape::stroke(Path::from_points(&[(0.0, 0.0), (10.0, 10.0)]), WHITE, 2.0)
}

#[test]
fn redraw_applies_active_affects_in_order_then_rebuilds() {
    let log = Log::default();
    let mut canvas = canvas();
    canvas.push(Category::Creating, stroke());
    let serial = canvas.change_serial();
    let mut modules = nudges(&log);

    assert!(modules.redraw(&mut canvas, &PenState::default()));

    assert_eq!(
        *log.borrow(),
        vec!["affect0:affect:false", "affect2:affect:false"]
    );
    assert_eq!(canvas.current(Category::Creating).map(|s| s.line_width), Some(4.0));
    assert!(canvas.change_serial() > serial);
    assert!(canvas.has_changed());
}

#[test]
fn redraw_defers_rebuild_while_disabled() {
    let log = Log::default();
    let mut canvas = canvas();
    canvas.set_redraw_enabled(false);
    canvas.push(Category::Committed, stroke());
    let mut modules = nudges(&log);

    assert!(!modules.redraw(&mut canvas, &PenState::default()));

    assert_eq!(log.borrow().len(), 2);
    assert!(canvas.is_cache_stale());
    assert!(!canvas.has_changed());
    assert!(!canvas.redraw_enabled());

    canvas.set_redraw_enabled(true);
    assert!(!canvas.is_cache_stale());
    assert!(canvas.has_changed());
}

#[test]
fn redraw_requested_from_callback_runs_affects() {
    let log = Log::default();
    let mut canvas = canvas();
    let mut modules = nudges(&log);
    modules.add_create(Box::new(RedrawOnDrag));
    let mut router = InputRouter::new();

    router.handle(pressed(10.0, 10.0), &mut canvas, &mut modules);
    assert!(log.borrow().is_empty());

    router.handle(moved(12.0, 10.0), &mut canvas, &mut modules);
    assert_eq!(
        *log.borrow(),
        vec!["affect0:affect:false", "affect2:affect:false"]
    );
}
