//! Editor session: one open image and everything that hangs off it.
//!
//! `EditorSession` owns the long-lived collaborators (config, record store,
//! segmentation oracle). Per-image state lives in a `Document` that is
//! built whole on `open_image` and dropped on `close_image`, so nothing
//! leaks from one image to the next.
//!
//! Every store mutation runs as one unit with its raster change:
//!
//! ```text
//! snapshot → store → mask → persist → push undo entry
//! ```
//!
//! If the mask cannot be persisted the snapshot is restored and the store
//! change reverted before the error is returned.

use crate::history::{UndoAction, UndoEntry, UndoHistory};
use crate::input::InputEvent;
use crate::oracle::{SegmentationOracle, circle_from_mask};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{EscapeOutcome, ToolAction, ToolKind, ToolState};
use image::RgbaImage;
use kurbo::{Point, Size};
use mezo_core::{
    AnalysisSummary, AnnotationStore, EditorConfig, EngineError, EngineResult, GestureOutcome,
    ImageId, ImageMeta, Mezo, MezoId, RecordStore, ViewportState, validate_diameter,
};
use mezo_raster::{MaskCompositor, MaskFiles, MaskSnapshot, Overlay, render_marker};

// ─── Types ───────────────────────────────────────────────────────────────

/// An image to annotate.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub image_id: ImageId,
    pub pixels: RgbaImage,
    /// Where the mask and result live; `None` keeps the mask in memory.
    pub files: Option<MaskFiles>,
    /// Used until settings saved for `image_id` are found on open.
    pub meta: ImageMeta,
}

impl ImageSource {
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.pixels.width()), f64::from(self.pixels.height()))
    }
}

/// Per-image state, reset as a unit.
#[derive(Debug)]
pub struct Document {
    pub source: ImageSource,
    pub viewport: ViewportState,
    pub tool: ToolState,
    pub annotations: AnnotationStore,
    pub compositor: MaskCompositor,
    pub history: UndoHistory,
    pub oracle_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// No tool active; the clicked pixel.
    Inspected(Point),
    OutsideImage(Point),
    CenterPlaced(Point),
    Created(Mezo),
    Removed { mezo: Mezo, repainted: usize },
    /// Remove tool clicked where no annotation is.
    Missed(Point),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UndoReport {
    /// A manual center is pending; undo is ignored.
    Ignored,
    Nothing,
    Reverted(UndoAction),
    /// History was empty; the newest annotation was removed instead.
    RemovedLast(Mezo),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputOutcome {
    Ignored,
    Gesture(GestureOutcome),
    Click(ClickOutcome),
    ToolSelected(ToolKind),
    Escaped(EscapeOutcome),
    Undo(UndoReport),
    ViewerReset,
    Resized,
}

// ─── Session ─────────────────────────────────────────────────────────────

pub struct EditorSession<S: RecordStore, O: SegmentationOracle> {
    pub config: EditorConfig,
    records: S,
    oracle: O,
    window_size: Size,
    document: Option<Document>,
}

impl<S: RecordStore, O: SegmentationOracle> EditorSession<S, O> {
    pub fn new(config: EditorConfig, records: S, oracle: O, window_size: Size) -> Self {
        Self {
            config,
            records,
            oracle,
            window_size,
            document: None,
        }
    }

    pub fn records(&self) -> &S {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut S {
        &mut self.records
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn viewport(&self) -> Option<&ViewportState> {
        self.document.as_ref().map(|d| &d.viewport)
    }

    pub fn tool(&self) -> Option<ToolState> {
        self.document.as_ref().map(|d| d.tool)
    }

    pub fn annotations(&self) -> Option<&[Mezo]> {
        self.document.as_ref().map(|d| d.annotations.list())
    }

    pub fn mask(&self) -> Option<&MaskCompositor> {
        self.document.as_ref().map(|d| &d.compositor)
    }

    fn doc(&self) -> EngineResult<&Document> {
        self.document.as_ref().ok_or(EngineError::NoImageOpen)
    }

    fn doc_mut(&mut self) -> EngineResult<&mut Document> {
        self.document.as_mut().ok_or(EngineError::NoImageOpen)
    }

    // ─── Open / close ────────────────────────────────────────────────────

    /// Open `source`, replacing any open image. Annotations and saved
    /// measurement settings are loaded from the record store and the mask
    /// from its file; a missing mask file is rebuilt from the annotations.
    pub fn open_image(&mut self, mut source: ImageSource) -> EngineResult<()> {
        self.close_image();

        let image_size = source.size();
        let style = self.config.style;
        let annotations = AnnotationStore::load(&self.records, source.image_id)?;
        if let Some(meta) = self
            .records
            .image_meta(source.image_id)
            .map_err(EngineError::Persistence)?
        {
            source.meta = meta;
        }

        let mask_on_disk = source
            .files
            .as_ref()
            .is_some_and(|f| f.mask_path.exists());
        let mut compositor = match &source.files {
            Some(files) => MaskCompositor::open(image_size, style, files.clone())?,
            None => MaskCompositor::new(image_size, style)?,
        };
        if !mask_on_disk && !annotations.is_empty() {
            compositor.repaint_all(annotations.list())?;
        }
        compositor.persist(&source.pixels)?;

        let viewport = ViewportState::from_window(image_size, self.window_size, self.config.viewport);
        log::info!(
            "opened {} ({}x{}, {} mezos), {}",
            source.image_id,
            image_size.width,
            image_size.height,
            annotations.len(),
            viewport.status_line()
        );

        self.document = Some(Document {
            source,
            viewport,
            tool: ToolState::Idle,
            annotations,
            compositor,
            history: UndoHistory::new(self.config.undo_capacity),
            oracle_ready: false,
        });
        Ok(())
    }

    pub fn close_image(&mut self) {
        if let Some(doc) = self.document.take() {
            log::info!("closed {}", doc.source.image_id);
        }
    }

    // ─── Viewer ──────────────────────────────────────────────────────────

    /// New window size (chrome included).
    pub fn resize(&mut self, window_size: Size) {
        self.window_size = window_size;
        if let Some(doc) = self.document.as_mut() {
            doc.viewport.resize_window(window_size);
        }
    }

    pub fn reset_viewer(&mut self) -> EngineResult<()> {
        self.doc_mut()?.viewport.reset();
        Ok(())
    }

    pub fn status_line(&self) -> Option<String> {
        self.document.as_ref().map(|d| d.viewport.status_line())
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one host event. Gestures that end as taps become clicks.
    pub fn handle_input(&mut self, event: &InputEvent) -> EngineResult<InputOutcome> {
        match event {
            InputEvent::WindowResized { width, height } => {
                self.resize(Size::new(*width, *height));
                Ok(InputOutcome::Resized)
            }
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => match ShortcutMap::resolve(key, *ctrl, *shift, *alt, *meta) {
                Some(action) => self.apply_shortcut(action),
                None => Ok(InputOutcome::Ignored),
            },
            _ if self.document.is_none() => Ok(InputOutcome::Ignored),
            InputEvent::GestureStart { x, y } => {
                self.doc_mut()?.viewport.begin_gesture(Point::new(*x, *y));
                Ok(InputOutcome::Ignored)
            }
            InputEvent::GestureUpdate { x, y, scale } => {
                self.doc_mut()?
                    .viewport
                    .update_gesture(Point::new(*x, *y), *scale);
                Ok(InputOutcome::Ignored)
            }
            InputEvent::GestureEnd => {
                let outcome = self.doc_mut()?.viewport.end_gesture();
                self.settle_gesture(outcome)
            }
            InputEvent::Wheel { x, y, zoom } => {
                let viewport = &mut self.doc_mut()?.viewport;
                let at = Point::new(*x, *y);
                viewport.begin_gesture(at);
                viewport.zoom_gesture(at, *zoom);
                let outcome = viewport.end_gesture();
                self.settle_gesture(outcome)
            }
        }
    }

    fn settle_gesture(&mut self, outcome: GestureOutcome) -> EngineResult<InputOutcome> {
        match outcome {
            GestureOutcome::Tap(point) => Ok(InputOutcome::Click(self.click(point)?)),
            GestureOutcome::Ignored => Ok(InputOutcome::Ignored),
            other => Ok(InputOutcome::Gesture(other)),
        }
    }

    fn apply_shortcut(&mut self, action: ShortcutAction) -> EngineResult<InputOutcome> {
        if self.document.is_none() {
            return Ok(InputOutcome::Ignored);
        }
        let kind = match action {
            ShortcutAction::ToolMagicSelect => ToolKind::MagicSelect,
            ShortcutAction::ToolManualSelect => ToolKind::ManualSelect,
            ShortcutAction::ToolRemove => ToolKind::Remove,
            ShortcutAction::Cancel => return Ok(InputOutcome::Escaped(self.escape()?)),
            ShortcutAction::Undo => return Ok(InputOutcome::Undo(self.undo()?)),
            ShortcutAction::ResetViewer => {
                self.reset_viewer()?;
                return Ok(InputOutcome::ViewerReset);
            }
        };
        self.select_tool(kind)?;
        Ok(InputOutcome::ToolSelected(kind))
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    /// Switch tools, dropping any pending manual center. Magic select
    /// prepares the oracle on first use; if that fails the tool stays.
    pub fn select_tool(&mut self, kind: ToolKind) -> EngineResult<()> {
        let Self {
            oracle, document, ..
        } = self;
        let doc = document.as_mut().ok_or(EngineError::NoImageOpen)?;
        if kind == ToolKind::MagicSelect && !doc.oracle_ready {
            oracle
                .prepare(&doc.source.pixels)
                .map_err(EngineError::Segmentation)?;
            doc.oracle_ready = true;
            log::info!("segmentation ready for {}", doc.source.image_id);
        }
        doc.tool = ToolState::select(kind);
        log::debug!("tool {kind:?}");
        Ok(())
    }

    pub fn escape(&mut self) -> EngineResult<EscapeOutcome> {
        Ok(self.doc_mut()?.tool.escape())
    }

    /// Handle a click on image pixel `point` with the active tool.
    pub fn click(&mut self, point: Point) -> EngineResult<ClickOutcome> {
        let Self {
            records,
            oracle,
            document,
            ..
        } = self;
        let doc = document.as_mut().ok_or(EngineError::NoImageOpen)?;
        let size = doc.source.size();
        let inside = point.x >= 0.0 && point.y >= 0.0 && point.x < size.width && point.y < size.height;

        match doc.tool.handle_click(point, inside) {
            ToolAction::Inspect(p) => Ok(ClickOutcome::Inspected(p)),
            ToolAction::OutsideImage(p) => Ok(ClickOutcome::OutsideImage(p)),
            ToolAction::PlaceCenter(p) => Ok(ClickOutcome::CenterPlaced(p)),
            ToolAction::Segment(p) => {
                let region = oracle.predict(p).map_err(EngineError::Segmentation)?;
                let (center, diameter) = circle_from_mask(&region)?;
                doc.create(records, center, diameter).map(ClickOutcome::Created)
            }
            ToolAction::CreateCircle { center, diameter } => {
                doc.create(records, center, diameter).map(ClickOutcome::Created)
            }
            ToolAction::RemoveAt(p) => match doc.annotations.find_containing(p) {
                Some(id) => {
                    let (mezo, repainted) = doc.remove(records, id, true)?;
                    Ok(ClickOutcome::Removed { mezo, repainted })
                }
                None => Ok(ClickOutcome::Missed(p)),
            },
        }
    }

    /// Remove an annotation by id, as the remove tool does.
    pub fn remove(&mut self, id: MezoId) -> EngineResult<Mezo> {
        let Self {
            records, document, ..
        } = self;
        let doc = document.as_mut().ok_or(EngineError::NoImageOpen)?;
        doc.remove(records, id, true).map(|(mezo, _)| mezo)
    }

    pub fn undo(&mut self) -> EngineResult<UndoReport> {
        let Self {
            records, document, ..
        } = self;
        let doc = document.as_mut().ok_or(EngineError::NoImageOpen)?;
        doc.undo(records)
    }

    // ─── Measurements ────────────────────────────────────────────────────

    /// Set the pore fraction, clamped to `0..=1`, and save it for the image.
    pub fn set_porosity(&mut self, porosity: f64) -> EngineResult<()> {
        let mut meta = self.doc()?.source.meta;
        meta.porosity = if porosity.is_finite() {
            porosity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.save_meta(meta)
    }

    /// `px` pixels correspond to `mkm` micrometers. Non-positive values
    /// are ignored.
    pub fn set_scale_factor(&mut self, px: f64, mkm: f64) -> EngineResult<()> {
        let mut meta = self.doc()?.source.meta;
        if !(px > 0.0 && mkm > 0.0 && px.is_finite() && mkm.is_finite()) {
            log::warn!("ignoring scale {px} px = {mkm} µm");
            return Ok(());
        }
        meta.scale_px = px;
        meta.scale_mkm = mkm;
        self.save_meta(meta)
    }

    fn save_meta(&mut self, meta: ImageMeta) -> EngineResult<()> {
        let Self {
            records, document, ..
        } = self;
        let doc = document.as_mut().ok_or(EngineError::NoImageOpen)?;
        records
            .set_image_meta(doc.source.image_id, meta)
            .map_err(EngineError::Persistence)?;
        doc.source.meta = meta;
        log::info!(
            "{}: porosity {:.3}, {} px = {} µm",
            doc.source.image_id,
            meta.porosity,
            meta.scale_px,
            meta.scale_mkm
        );
        Ok(())
    }

    pub fn summary(&self) -> EngineResult<AnalysisSummary> {
        let doc = self.doc()?;
        Ok(AnalysisSummary::compute(
            doc.source.size(),
            &doc.source.meta,
            doc.annotations.list(),
        ))
    }

    /// The red marker for a pending manual center, if any.
    pub fn marker_layer(&self) -> EngineResult<Option<Overlay>> {
        let doc = self.doc()?;
        doc.tool
            .pending_center()
            .map(|center| render_marker(center, doc.viewport.image_scale, self.config.style.marker))
            .transpose()
            .map_err(EngineError::from)
    }
}

// ─── Document mutations ──────────────────────────────────────────────────

impl Document {
    fn persist(&self) -> EngineResult<()> {
        self.compositor
            .persist(&self.source.pixels)
            .map_err(EngineError::from)
    }

    fn rollback_raster(&mut self, snapshot: &MaskSnapshot) {
        if let Err(e) = self.compositor.restore(snapshot) {
            log::warn!("mask rollback failed: {e}");
        }
    }

    fn create(
        &mut self,
        records: &mut dyn RecordStore,
        center: Point,
        diameter: f64,
    ) -> EngineResult<Mezo> {
        validate_diameter(diameter)?;
        let snapshot = self.compositor.snapshot();
        let mezo = self.annotations.create(records, center, diameter)?;

        let applied = self
            .compositor
            .paint(&mezo)
            .map_err(EngineError::from)
            .and_then(|()| self.persist());
        if let Err(e) = applied {
            log::warn!("rolling back {}: {e}", mezo.id);
            self.rollback_raster(&snapshot);
            if let Err(undo) = self.annotations.delete(records, mezo.id) {
                log::warn!("could not delete {}: {undo}", mezo.id);
            }
            return Err(e);
        }

        self.history.push(UndoEntry {
            snapshot,
            action: UndoAction::Created(mezo.id),
        });
        Ok(mezo)
    }

    /// Delete `id` and erase it with its overlap closure. Returns the
    /// removed mezo and how many neighbours were repainted.
    fn remove(
        &mut self,
        records: &mut dyn RecordStore,
        id: MezoId,
        record_undo: bool,
    ) -> EngineResult<(Mezo, usize)> {
        let snapshot = self.compositor.snapshot();
        let mezo = self.annotations.delete(records, id)?;

        let applied = self
            .compositor
            .remove_with_overlaps(&mezo, self.annotations.list())
            .map_err(EngineError::from)
            .and_then(|closure| self.persist().map(|()| closure.len() - 1));
        let repainted = match applied {
            Ok(n) => n,
            Err(e) => {
                log::warn!("rolling back removal of {id}: {e}");
                self.rollback_raster(&snapshot);
                if let Err(undo) = self.annotations.reinsert(records, &mezo) {
                    log::warn!("could not restore {id}: {undo}");
                }
                return Err(e);
            }
        };

        if record_undo {
            self.history.push(UndoEntry {
                snapshot,
                action: UndoAction::Removed(mezo),
            });
        }
        Ok((mezo, repainted))
    }

    fn undo(&mut self, records: &mut dyn RecordStore) -> EngineResult<UndoReport> {
        if self.tool.pending_center().is_some() {
            return Ok(UndoReport::Ignored);
        }

        let Some(entry) = self.history.pop() else {
            return match self.annotations.last().copied() {
                Some(last) => {
                    self.remove(records, last.id, false)?;
                    log::info!("undo: removed newest {}", last.id);
                    Ok(UndoReport::RemovedLast(last))
                }
                None => Ok(UndoReport::Nothing),
            };
        };

        let before = self.compositor.snapshot();
        let result = match entry.action {
            UndoAction::Created(id) => self.revert_created(records, id, &entry.snapshot, &before),
            UndoAction::Removed(mezo) => {
                self.revert_removed(records, &mezo, &entry.snapshot, &before)
            }
        };
        match result {
            Ok(()) => {
                log::info!("undo: {:?}", entry.action);
                Ok(UndoReport::Reverted(entry.action))
            }
            Err(e) => {
                self.history.push(entry);
                Err(e)
            }
        }
    }

    fn revert_created(
        &mut self,
        records: &mut dyn RecordStore,
        id: MezoId,
        target: &MaskSnapshot,
        before: &MaskSnapshot,
    ) -> EngineResult<()> {
        let mezo = self.annotations.delete(records, id)?;
        let applied = self
            .compositor
            .restore(target)
            .map_err(EngineError::from)
            .and_then(|()| self.persist());
        if let Err(e) = applied {
            log::warn!("undo of {id} failed: {e}");
            self.rollback_raster(before);
            if let Err(undo) = self.annotations.reinsert(records, &mezo) {
                log::warn!("could not restore {id}: {undo}");
            }
            return Err(e);
        }
        Ok(())
    }

    fn revert_removed(
        &mut self,
        records: &mut dyn RecordStore,
        mezo: &Mezo,
        target: &MaskSnapshot,
        before: &MaskSnapshot,
    ) -> EngineResult<()> {
        self.annotations.reinsert(records, mezo)?;
        let applied = self
            .compositor
            .restore(target)
            .map_err(EngineError::from)
            .and_then(|()| self.persist());
        if let Err(e) = applied {
            log::warn!("undo of removal {} failed: {e}", mezo.id);
            self.rollback_raster(before);
            if let Err(undo) = self.annotations.delete(records, mezo.id) {
                log::warn!("could not delete {}: {undo}", mezo.id);
            }
            return Err(e);
        }
        Ok(())
    }
}
