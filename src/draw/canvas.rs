//! The drawing canvas: shape store, settings, cached raster and change tracking.
//!
//! Committed shapes are rasterised once into a cache surface and composited
//! over the backdrop on every repaint; in-progress shapes and guides are
//! replayed on top. Any mutation of the committed record or of a setting that
//! affects its appearance invalidates the cache, which is rebuilt immediately
//! unless redraw has been disabled. Edits to the other categories leave the
//! cache alone but still count as a redraw for change tracking.

use super::color::{Color, ColorSlots};
use super::embed::{EmbeddedImage, EmbeddedPage};
use super::render::{render_background, render_record_indicator, render_shapes, render_surface};
use super::shape::{Path, Shape, ShapeStyle};
use super::store::{Category, ShapeStore};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How a frame is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Paint the cached committed raster, then in-progress shapes
    Incremental,
    /// Replay every shape from scratch, ignoring the cache
    Vector,
}

/// Errors raised while producing a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },

    #[error("invalid render scale {0}")]
    InvalidScale(f64),

    #[error("invalid page size {width}x{height}")]
    InvalidPage { width: f64, height: f64 },
}

/// Notifications queued by the canvas for the active modules.
///
/// They are delivered after the mutation that produced them, once the caller
/// has released the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasNotice {
    Committed,
    Cleared,
}

/// Initial drawing settings of a canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasSettings {
    pub foreground: Color,
    pub background: Color,
    /// Multiplied into the active color of every new shape
    pub alpha: f64,
    pub line_width: f64,
    pub style: ShapeStyle,
    pub smoothing: bool,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            foreground: super::color::BLACK,
            background: super::color::WHITE,
            alpha: 1.0,
            line_width: 3.0,
            style: ShapeStyle::Stroke,
            smoothing: true,
        }
    }
}

/// Layers painted on top of the shapes, chosen per call.
#[derive(Clone, Copy, Debug)]
struct Overlays {
    guides: bool,
    indicator: bool,
}

impl Overlays {
    const NONE: Overlays = Overlays {
        guides: false,
        indicator: false,
    };
}

pub struct Canvas {
    store: ShapeStore,
    colors: ColorSlots,
    alpha: f64,
    line_width: f64,
    style: ShapeStyle,
    smoothing: bool,
    redraw_enabled: bool,
    draw_under: bool,
    guides_visible: bool,
    image: Option<EmbeddedImage>,
    page: Option<Box<dyn EmbeddedPage>>,
    width: i32,
    height: i32,
    cache: Option<cairo::ImageSurface>,
    cache_stale: bool,
    changed: bool,
    change_serial: u64,
    indicator_until: Option<Instant>,
    notices: VecDeque<CanvasNotice>,
}

impl Canvas {
    pub fn new(width: i32, height: i32, settings: CanvasSettings) -> Self {
        let mut canvas = Self {
            store: ShapeStore::new(),
            colors: ColorSlots::new(settings.foreground, settings.background),
            alpha: settings.alpha.clamp(0.0, 1.0),
            line_width: settings.line_width,
            style: settings.style,
            smoothing: settings.smoothing,
            redraw_enabled: true,
            draw_under: false,
            guides_visible: true,
            image: None,
            page: None,
            width: width.max(0),
            height: height.max(0),
            cache: None,
            cache_stale: true,
            changed: false,
            change_serial: 0,
            indicator_until: None,
            notices: VecDeque::new(),
        };
        canvas.regenerate_cache();
        // A fresh canvas has nothing worth recording
        canvas.changed = false;
        canvas
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// True when `(x, y)` lies inside the viewport.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        let (width, height) = (width.max(0), height.max(0));
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!(
            "Canvas resized {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;
        self.invalidate();
    }

    // ------------------------------------------------------------------------
    // Shapes
    // ------------------------------------------------------------------------

    pub fn store(&self) -> &ShapeStore {
        &self.store
    }

    pub fn shapes(&self, category: Category) -> &[Shape] {
        self.store.shapes(category)
    }

    pub fn current(&self, category: Category) -> Option<&Shape> {
        self.store.current(category)
    }

    /// Stamps `path` with the active color, alpha, style and line width.
    pub fn new_shape(&self, path: Path) -> Shape {
        let color = self.colors.active();
        let color = color.with_alpha(color.a * self.alpha);
        Shape::new(path, self.style, color, self.line_width)
    }

    pub fn push(&mut self, category: Category, shape: Shape) {
        self.store.push(category, shape);
        self.after_edit(category);
    }

    /// Replaces the current shape of `category`. Does nothing when the
    /// category is empty.
    pub fn set_current(&mut self, category: Category, shape: Shape) -> Option<Shape> {
        let previous = self.store.set_current(category, shape);
        if previous.is_some() {
            self.after_edit(category);
        }
        previous
    }

    /// Edits the current shape of `category` in place. Returns `false` when
    /// the category is empty.
    pub fn update_current<F>(&mut self, category: Category, edit: F) -> bool
    where
        F: FnOnce(&mut Shape),
    {
        let Some(shape) = self.store.current_mut(category) else {
            return false;
        };
        edit(shape);
        self.after_edit(category);
        true
    }

    pub fn remove_current(&mut self, category: Category) -> Option<Shape> {
        let removed = self.store.remove_current(category)?;
        self.after_edit(category);
        Some(removed)
    }

    /// Moves the creating or affecting shapes into the committed record.
    ///
    /// Queues a [`CanvasNotice::Committed`] for the modules. Committing
    /// `Committed` or `Guides` does nothing.
    pub fn commit(&mut self, category: Category) -> usize {
        if matches!(category, Category::Committed | Category::Guides) {
            return 0;
        }
        let moved = self.store.commit(category, self.draw_under);
        self.after_commit(moved)
    }

    /// Commits creating and affecting together.
    pub fn commit_all(&mut self) -> usize {
        let moved = self.store.commit_all(self.draw_under);
        self.after_commit(moved)
    }

    fn after_commit(&mut self, moved: usize) -> usize {
        if moved > 0 {
            log::debug!("Committed {} shape(s)", moved);
            self.invalidate();
        }
        self.notices.push_back(CanvasNotice::Committed);
        moved
    }

    /// Empties every category. Settings are kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.invalidate();
        self.notices.push_back(CanvasNotice::Cleared);
    }

    /// Replaces the committed record, e.g. with a drawing loaded from disk.
    pub fn load_committed(&mut self, shapes: Vec<Shape>) {
        self.store.replace_committed(shapes);
        self.invalidate();
    }

    /// Committed edits rebuild the cache. In-progress and guide edits are
    /// painted over it, so they only mark the canvas changed.
    fn after_edit(&mut self, category: Category) {
        if category == Category::Committed {
            self.invalidate();
        } else if self.redraw_enabled {
            self.mark_changed();
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn colors(&self) -> &ColorSlots {
        &self.colors
    }

    /// Foreground changes only affect new shapes; nothing is redrawn.
    pub fn set_foreground(&mut self, color: Color) {
        self.colors.set_foreground(color);
    }

    pub fn set_background(&mut self, color: Color) {
        self.colors.set_background(color);
        self.invalidate();
    }

    /// Replaces the color in the active slot.
    pub fn set_active_color(&mut self, color: Color) {
        if self.colors.set_active(color) {
            self.invalidate();
        }
    }

    /// Selects the background slot (eraser) or the foreground slot (pen).
    pub fn set_background_active(&mut self, active: bool) {
        self.colors.set_background_active(active);
    }

    pub fn swap_colors(&mut self) {
        self.colors.swap();
        self.invalidate();
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width.max(0.0);
    }

    pub fn style(&self) -> ShapeStyle {
        self.style
    }

    pub fn set_style(&mut self, style: ShapeStyle) {
        self.style = style;
    }

    /// Switches new shapes between stroke and fill.
    pub fn toggle_style(&mut self) -> ShapeStyle {
        self.style = self.style.toggled();
        self.style
    }

    pub fn smoothing(&self) -> bool {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: bool) {
        if self.smoothing != smoothing {
            self.smoothing = smoothing;
            self.invalidate();
        }
    }

    pub fn draw_under(&self) -> bool {
        self.draw_under
    }

    pub fn set_draw_under(&mut self, draw_under: bool) {
        if self.draw_under != draw_under {
            self.draw_under = draw_under;
            self.invalidate();
        }
    }

    pub fn guides_visible(&self) -> bool {
        self.guides_visible
    }

    pub fn set_guides_visible(&mut self, visible: bool) {
        self.guides_visible = visible;
    }

    pub fn image(&self) -> Option<&EmbeddedImage> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: Option<EmbeddedImage>) {
        self.image = image;
        self.invalidate();
    }

    pub fn set_image_visible(&mut self, visible: bool) {
        if let Some(image) = self.image.as_mut() {
            if image.visible != visible {
                image.visible = visible;
                self.invalidate();
            }
        }
    }

    pub fn set_image_location(&mut self, x: i32, y: i32) {
        if let Some(image) = self.image.as_mut() {
            image.location = (x, y);
            self.invalidate();
        }
    }

    /// Moves the image back to the top-left corner.
    pub fn reset_image_location(&mut self) {
        self.set_image_location(0, 0);
    }

    pub fn has_page(&self) -> bool {
        self.page.is_some()
    }

    pub fn set_page(&mut self, page: Option<Box<dyn EmbeddedPage>>) {
        self.page = page;
        self.invalidate();
    }

    // ------------------------------------------------------------------------
    // Cache and change tracking
    // ------------------------------------------------------------------------

    pub fn redraw_enabled(&self) -> bool {
        self.redraw_enabled
    }

    /// Enabling redraw rebuilds a cache that went stale while it was off.
    pub fn set_redraw_enabled(&mut self, enabled: bool) {
        self.redraw_enabled = enabled;
        if enabled && self.cache_stale {
            self.regenerate_cache();
        }
    }

    /// True while the cached raster lags behind the committed record.
    pub fn is_cache_stale(&self) -> bool {
        self.cache_stale
    }

    /// Marks the cache stale and rebuilds it when redraw is enabled.
    ///
    /// Safe to call from inside module callbacks; each call does a complete
    /// rebuild with no state carried over from an interrupted one.
    pub fn invalidate(&mut self) {
        self.cache_stale = true;
        if self.redraw_enabled {
            self.regenerate_cache();
        }
    }

    /// Rebuilds the cache once, even while redraw is disabled.
    pub fn force_redraw(&mut self) -> bool {
        let previous = self.redraw_enabled;
        self.redraw_enabled = true;
        let ok = self.regenerate_cache();
        self.redraw_enabled = previous;
        ok
    }

    fn regenerate_cache(&mut self) -> bool {
        match self.build_cache() {
            Ok(surface) => {
                self.cache = surface;
                self.cache_stale = false;
                self.mark_changed();
                true
            }
            Err(err) => {
                log::warn!("Failed to rebuild canvas cache: {}", err);
                false
            }
        }
    }

    fn build_cache(&self) -> Result<Option<cairo::ImageSurface>, RenderError> {
        if self.width == 0 || self.height == 0 {
            return Ok(None);
        }
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, self.width, self.height)?;
        {
            let ctx = cairo::Context::new(&surface)?;
            self.apply_antialias(&ctx);
            render_shapes(&ctx, self.store.shapes(Category::Committed));
        }
        surface.flush();
        Ok(Some(surface))
    }

    fn mark_changed(&mut self) {
        self.changed = true;
        self.change_serial = self.change_serial.wrapping_add(1);
    }

    /// True when the canvas was redrawn since the last acknowledgement.
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Serial of the latest redraw; pass it back to [`Self::acknowledge_changes`].
    pub fn change_serial(&self) -> u64 {
        self.change_serial
    }

    /// Clears the changed flag if nothing changed after `serial` was read.
    pub fn acknowledge_changes(&mut self, serial: u64) -> bool {
        if serial == self.change_serial {
            self.changed = false;
            true
        } else {
            false
        }
    }

    pub fn reset_changed(&mut self) {
        self.changed = false;
    }

    // ------------------------------------------------------------------------
    // Indicator and notices
    // ------------------------------------------------------------------------

    /// Shows the record indicator on screen for `duration`.
    pub fn show_record_indicator(&mut self, duration: Duration) {
        self.indicator_until = Some(Instant::now() + duration);
    }

    pub fn record_indicator_visible(&self) -> bool {
        self.indicator_until
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    /// Drops an expired indicator. Returns `true` if a repaint is needed.
    pub fn expire_record_indicator(&mut self, now: Instant) -> bool {
        match self.indicator_until {
            Some(deadline) if now >= deadline => {
                self.indicator_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn take_notices(&mut self) -> Vec<CanvasNotice> {
        self.notices.drain(..).collect()
    }

    pub fn has_notices(&self) -> bool {
        !self.notices.is_empty()
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Renders a frame onto a new ARGB surface of viewport size times `scale`.
    ///
    /// Guides are included while guide display is on; the record indicator
    /// never is.
    pub fn render(
        &self,
        mode: RenderMode,
        transparent: bool,
        scale: f64,
    ) -> Result<cairo::ImageSurface, RenderError> {
        let overlays = Overlays {
            guides: self.guides_visible,
            indicator: false,
        };
        self.render_to_surface(mode, transparent, scale, overlays)
    }

    /// Vector frame for bitmap and document export: no guides, no indicator.
    pub fn render_export(
        &self,
        transparent: bool,
        scale: f64,
    ) -> Result<cairo::ImageSurface, RenderError> {
        self.render_to_surface(RenderMode::Vector, transparent, scale, Overlays::NONE)
    }

    /// Paints the export frame directly into `ctx` (e.g. a PDF page).
    pub fn render_export_into(
        &self,
        ctx: &cairo::Context,
        transparent: bool,
    ) -> Result<(), RenderError> {
        self.paint(ctx, RenderMode::Vector, transparent, Overlays::NONE)
    }

    /// Paints the export frame onto a `page_width` x `page_height` page.
    ///
    /// A canvas larger than the page is scaled down to fit; the frame is
    /// centred and clipped to the canvas bounds.
    pub fn render_export_fit(
        &self,
        ctx: &cairo::Context,
        page_width: f64,
        page_height: f64,
    ) -> Result<(), RenderError> {
        if !(page_width.is_finite() && page_height.is_finite())
            || page_width <= 0.0
            || page_height <= 0.0
        {
            return Err(RenderError::InvalidPage {
                width: page_width,
                height: page_height,
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }

        let (width, height) = (self.width as f64, self.height as f64);
        let factor = (page_width / width).min(page_height / height).min(1.0);
        ctx.save()?;
        ctx.translate(
            (page_width - width * factor) / 2.0,
            (page_height - height * factor) / 2.0,
        );
        ctx.scale(factor, factor);
        ctx.rectangle(0.0, 0.0, width, height);
        ctx.clip();
        self.paint(ctx, RenderMode::Vector, false, Overlays::NONE)?;
        ctx.restore()?;
        Ok(())
    }

    /// Paints the on-screen view: cached frame, in-progress shapes, guides and
    /// the record indicator while it is showing.
    pub fn present(&self, ctx: &cairo::Context) -> Result<(), RenderError> {
        let overlays = Overlays {
            guides: self.guides_visible,
            indicator: self.record_indicator_visible(),
        };
        self.paint(ctx, RenderMode::Incremental, false, overlays)
    }

    fn render_to_surface(
        &self,
        mode: RenderMode,
        transparent: bool,
        scale: f64,
        overlays: Overlays,
    ) -> Result<cairo::ImageSurface, RenderError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RenderError::InvalidScale(scale));
        }
        let width = (self.width as f64 * scale).round() as i32;
        let height = (self.height as f64 * scale).round() as i32;
        if width <= 0 || height <= 0 {
            return Err(RenderError::InvalidSize { width, height });
        }

        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)?;
        {
            let ctx = cairo::Context::new(&surface)?;
            ctx.scale(scale, scale);
            self.paint(&ctx, mode, transparent, overlays)?;
        }
        surface.flush();
        Ok(surface)
    }

    fn paint(
        &self,
        ctx: &cairo::Context,
        mode: RenderMode,
        transparent: bool,
        overlays: Overlays,
    ) -> Result<(), RenderError> {
        ctx.save()?;
        self.apply_antialias(ctx);

        if !transparent {
            render_background(ctx, self.colors.background());
        }
        self.paint_page(ctx)?;
        self.paint_image(ctx);

        let creating = self.store.shapes(Category::Creating);
        let affecting = self.store.shapes(Category::Affecting);
        match mode {
            RenderMode::Vector => render_shapes(ctx, self.store.drawable()),
            RenderMode::Incremental if self.draw_under => {
                render_shapes(ctx, creating.iter().chain(affecting));
                self.paint_committed(ctx);
            }
            RenderMode::Incremental => {
                self.paint_committed(ctx);
                render_shapes(ctx, creating.iter().chain(affecting));
            }
        }

        if overlays.guides {
            render_shapes(ctx, self.store.shapes(Category::Guides));
        }
        if overlays.indicator {
            render_record_indicator(ctx, self.height as f64);
        }

        ctx.restore()?;
        Ok(())
    }

    /// Cached committed raster, or a direct replay when no cache exists yet.
    fn paint_committed(&self, ctx: &cairo::Context) {
        match &self.cache {
            Some(cache) => render_surface(ctx, cache, 0.0, 0.0),
            None => render_shapes(ctx, self.store.shapes(Category::Committed)),
        }
    }

    fn paint_page(&self, ctx: &cairo::Context) -> Result<(), RenderError> {
        let Some(page) = self.page.as_ref() else {
            return Ok(());
        };
        let (width, height) = page.size();
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }
        ctx.save()?;
        ctx.rectangle(0.0, 0.0, width, height);
        ctx.clip();
        if let Err(err) = page.render_into(ctx) {
            log::warn!("Failed to render embedded page: {}", err);
        }
        ctx.restore()?;
        Ok(())
    }

    fn paint_image(&self, ctx: &cairo::Context) {
        if let Some(image) = self.image.as_ref().filter(|image| image.visible) {
            let (x, y) = image.location;
            render_surface(ctx, image.surface(), x as f64, y as f64);
        }
    }

    fn apply_antialias(&self, ctx: &cairo::Context) {
        ctx.set_antialias(if self.smoothing {
            cairo::Antialias::Default
        } else {
            cairo::Antialias::None
        });
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("store", &self.store)
            .field("colors", &self.colors)
            .field("changed", &self.changed)
            .field("change_serial", &self.change_serial)
            .finish_non_exhaustive()
    }
}
