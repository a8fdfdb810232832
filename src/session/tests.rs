use super::*;
use crate::config::{SessionConfig, SessionStorageMode};
use crate::draw::{Canvas, CanvasSettings, Category, Path as ShapePath, RED, Shape};
use crate::export::page_size;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn options(dir: &Path) -> SessionOptions {
    let mut options = SessionOptions::new(dir.to_path_buf());
    options.interval_ms = 1000;
    options
}

fn recorder(dir: &Path) -> (SessionRecorder, ManualTicker) {
    let ticker = ManualTicker::new();
    (SessionRecorder::new(options(dir), ticker.clone()), ticker)
}

fn draw_square(canvas: &mut Canvas, x: f64) {
    canvas.push(
        Category::Committed,
        Shape::fill(ShapePath::rectangle(x, 2.0, 10.0, 10.0), RED),
    );
}

fn page_sizes(path: &Path) -> Vec<(f64, f64)> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| page_size(&doc, id).unwrap())
        .collect()
}

fn pdf_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    files.sort();
    files
}

#[test]
fn unchanged_ticks_write_nothing_then_one_change_writes_one_page() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(64, 48, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    assert_eq!(ticker.period(), Some(Duration::from_millis(1000)));

    for _ in 0..3 {
        ticker.fire(1);
        assert_eq!(recorder.pump(&mut canvas), vec![TickOutcome::Unchanged]);
    }
    assert!(pdf_files(temp.path()).is_empty());

    draw_square(&mut canvas, 2.0);
    assert!(canvas.has_changed());
    ticker.fire(1);
    let outcomes = recorder.pump(&mut canvas);
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], TickOutcome::Appended { pages: 1, .. }));
    assert!(!canvas.has_changed());
    assert_eq!(pdf_files(temp.path()).len(), 1);
    assert_eq!(recorder.pages_written(), 1);
}

#[test]
fn stroke_held_down_across_ticks_is_recorded() {
    use crate::input::{Freehand, InputEvent, InputRouter, Modules, MouseButton};

    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(64, 48, CanvasSettings::default());
    let mut modules = Modules::new();
    modules.add_create(Box::new(Freehand::new()));
    let mut router = InputRouter::new();

    recorder.set_recording(true, &mut canvas);
    router.handle(
        InputEvent::Pressed {
            x: 5.0,
            y: 5.0,
            button: MouseButton::Left,
        },
        &mut canvas,
        &mut modules,
    );
    router.handle(InputEvent::Moved { x: 30.0, y: 30.0 }, &mut canvas, &mut modules);

    ticker.fire(1);
    let outcomes = recorder.pump(&mut canvas);
    assert!(matches!(outcomes.as_slice(), [TickOutcome::Appended { pages: 1, .. }]));
    assert!(canvas.shapes(Category::Committed).is_empty());

    router.handle(InputEvent::Moved { x: 40.0, y: 20.0 }, &mut canvas, &mut modules);
    ticker.fire(1);
    let outcomes = recorder.pump(&mut canvas);
    assert!(matches!(outcomes.as_slice(), [TickOutcome::Appended { pages: 2, .. }]));

    ticker.fire(1);
    assert_eq!(recorder.pump(&mut canvas), vec![TickOutcome::Unchanged]);
}

#[test]
fn set_recording_forgets_earlier_changes() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    draw_square(&mut canvas, 2.0);
    recorder.set_recording(true, &mut canvas);
    ticker.fire(1);
    assert_eq!(recorder.pump(&mut canvas), vec![TickOutcome::Unchanged]);
}

#[test]
fn second_page_merges_into_first_document_at_max_size() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, _ticker) = recorder(temp.path());

    let mut wide = Canvas::new(200, 100, CanvasSettings::default());
    draw_square(&mut wide, 2.0);
    assert!(recorder.save_page(&mut wide));
    let output = recorder.output_path().unwrap().to_path_buf();
    assert!(output.starts_with(temp.path()));
    assert!(
        output
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Alchemy-")
    );
    assert_eq!(page_sizes(&output), vec![(200.0, 100.0)]);

    let mut tall = Canvas::new(150, 300, CanvasSettings::default());
    draw_square(&mut tall, 4.0);
    assert!(recorder.save_page(&mut tall));
    assert_eq!(recorder.output_path(), Some(output.as_path()));
    assert_eq!(page_sizes(&output), vec![(200.0, 300.0), (200.0, 300.0)]);
    assert_eq!(recorder.pages_written(), 2);
    assert_eq!(pdf_files(temp.path()).len(), 1);
}

#[test]
fn missing_output_starts_a_new_document() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, _ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(40, 40, CanvasSettings::default());

    assert!(recorder.save_page(&mut canvas));
    let first = recorder.output_path().unwrap().to_path_buf();
    std::fs::remove_file(&first).unwrap();

    assert!(recorder.save_page(&mut canvas));
    let second = recorder.output_path().unwrap().to_path_buf();
    assert!(second.exists());
    assert_eq!(page_sizes(&second).len(), 1);
}

#[test]
fn restart_session_starts_a_fresh_document() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, _ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(40, 40, CanvasSettings::default());

    assert!(recorder.save_page(&mut canvas));
    let first = recorder.output_path().unwrap().to_path_buf();

    recorder.restart_session();
    assert_eq!(recorder.output_path(), None);
    assert_eq!(recorder.pages_written(), 0);

    assert!(recorder.save_page(&mut canvas));
    let second = recorder.output_path().unwrap().to_path_buf();
    assert_ne!(first, second);
    assert_eq!(page_sizes(&first).len(), 1);
    assert_eq!(page_sizes(&second).len(), 1);
}

#[test]
fn zero_interval_stops_the_timer() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    assert!(ticker.is_running());

    recorder.set_interval(0);
    assert!(!ticker.is_running());
    assert!(!ticker.fire(1));
    assert!(recorder.is_recording());

    recorder.set_interval(250);
    assert_eq!(ticker.period(), Some(Duration::from_millis(250)));
}

#[test]
fn interval_change_while_stopped_does_not_start_timer() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    recorder.set_interval(250);
    assert!(!ticker.is_running());
    assert_eq!(recorder.interval(), Duration::from_millis(250));
}

#[test]
fn stopping_recording_ignores_further_ticks() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    recorder.set_recording(false, &mut canvas);
    draw_square(&mut canvas, 2.0);
    assert_eq!(recorder.on_tick(&mut canvas), TickOutcome::Unchanged);
    assert!(!ticker.is_running());
    assert!(pdf_files(temp.path()).is_empty());
}

#[test]
fn auto_clear_empties_canvas_without_recording_a_blank_page() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    recorder.set_auto_clear(true);
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    draw_square(&mut canvas, 2.0);
    ticker.fire(1);
    let outcomes = recorder.pump(&mut canvas);
    assert!(matches!(outcomes[0], TickOutcome::Appended { pages: 1, .. }));

    assert!(canvas.shapes(Category::Committed).is_empty());
    assert!(!canvas.has_changed());
    assert!(canvas.has_notices());

    ticker.fire(1);
    assert_eq!(recorder.pump(&mut canvas), vec![TickOutcome::Unchanged]);
    assert_eq!(recorder.pages_written(), 1);
}

#[test]
fn save_clear_page_clears_after_writing() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, _ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());
    draw_square(&mut canvas, 2.0);

    assert!(recorder.save_clear_page(&mut canvas));
    assert!(canvas.shapes(Category::Committed).is_empty());
    assert_eq!(recorder.pages_written(), 1);
}

#[test]
fn saved_page_shows_record_indicator() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, _ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    assert!(recorder.save_page(&mut canvas));
    assert!(canvas.record_indicator_visible());
}

#[test]
fn manual_save_restarts_the_timer() {
    let temp = tempfile::tempdir().unwrap();
    let (mut recorder, ticker) = recorder(temp.path());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    ticker.fire(3);
    assert!(recorder.manual_save_page(&mut canvas));
    // Pending ticks were dropped by the restart
    assert!(recorder.pump(&mut canvas).is_empty());
    assert!(ticker.is_running());
}

#[test]
fn failed_save_keeps_changed_flag_and_state() {
    let temp = tempfile::tempdir().unwrap();
    // A regular file where the session directory should be
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let ticker = ManualTicker::new();
    let mut recorder = SessionRecorder::new(options(&blocker), ticker.clone());
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    draw_square(&mut canvas, 2.0);
    ticker.fire(1);
    assert_eq!(recorder.pump(&mut canvas), vec![TickOutcome::Failed]);
    assert!(canvas.has_changed());
    assert_eq!(recorder.output_path(), None);
    assert!(!recorder.is_busy());
    assert!(!canvas.record_indicator_visible());
}

#[test]
fn background_worker_delivers_result_on_pump() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let ticker = ManualTicker::new();
    let mut recorder = SessionRecorder::new(options(temp.path()), ticker.clone())
        .with_worker(ExportWorker::new(runtime.handle()));
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    draw_square(&mut canvas, 2.0);
    ticker.fire(1);
    assert_eq!(recorder.pump(&mut canvas), vec![TickOutcome::Queued]);
    assert!(recorder.is_busy());
    assert!(canvas.has_changed());

    // A second tick while the first page is in flight is skipped
    assert_eq!(recorder.on_tick(&mut canvas), TickOutcome::Busy);
    assert!(!recorder.save_page(&mut canvas));

    let outcome = recorder
        .flush(&mut canvas, Duration::from_secs(10))
        .unwrap();
    assert!(matches!(outcome, TickOutcome::Appended { pages: 1, .. }));
    assert!(!recorder.is_busy());
    assert!(!canvas.has_changed());
}

#[test]
fn change_during_background_export_is_kept() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let mut recorder = SessionRecorder::new(options(temp.path()), ManualTicker::new())
        .with_worker(ExportWorker::new(runtime.handle()));
    recorder.set_auto_clear(true);
    let mut canvas = Canvas::new(32, 32, CanvasSettings::default());

    recorder.set_recording(true, &mut canvas);
    draw_square(&mut canvas, 2.0);
    assert_eq!(recorder.on_tick(&mut canvas), TickOutcome::Queued);
    draw_square(&mut canvas, 12.0);

    let outcome = recorder
        .flush(&mut canvas, Duration::from_secs(10))
        .unwrap();
    assert!(matches!(outcome, TickOutcome::Appended { .. }));
    assert!(canvas.has_changed());
    assert_eq!(canvas.shapes(Category::Committed).len(), 2);
}

#[test]
fn storage_modes_resolve_directories() {
    let temp = tempfile::tempdir().unwrap();
    let mut cfg = SessionConfig {
        storage: SessionStorageMode::Config,
        ..SessionConfig::default()
    };
    let options = options_from_config(&cfg, temp.path()).unwrap();
    assert_eq!(options.session_directory(), temp.path().join("sessions"));
    assert_eq!(options.recording_interval(), Duration::from_millis(5000));

    cfg.storage = SessionStorageMode::Custom;
    cfg.custom_directory = None;
    assert!(options_from_config(&cfg, temp.path()).is_err());

    cfg.custom_directory = Some(temp.path().join("custom").display().to_string());
    let options = options_from_config(&cfg, temp.path()).unwrap();
    assert_eq!(options.directory, temp.path().join("custom"));

    cfg.storage = SessionStorageMode::Auto;
    let options = options_from_config(&cfg, temp.path()).unwrap();
    assert!(options.directory.ends_with("Alchemy"));
}
