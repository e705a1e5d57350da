//! Annotation store and record-store collaborators.
//!
//! `RecordStore` is the external key/value store the annotations are mirrored
//! to. It does no geometry; the in-memory `AnnotationStore` keeps the ordered
//! list for the open image, which is the source of truth for paint order.

use crate::error::{EngineError, EngineResult};
use crate::id::{ImageId, MezoId};
use crate::model::{ImageMeta, Mezo, MezoRecord, square_of, validate_diameter};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ─── Record Store Trait ──────────────────────────────────────────────────

/// Persistent storage for mezophase records and per-image measurement
/// settings, keyed by image.
///
/// Implementations assign ids in increasing order and never reuse them, so
/// ordering records by id gives paint order.
pub trait RecordStore {
    fn insert(&mut self, image_id: ImageId, center: Point, diameter: f64)
    -> Result<MezoId, String>;

    /// Put a deleted record back under its own id.
    fn restore(&mut self, record: MezoRecord) -> Result<(), String>;

    fn delete(&mut self, id: MezoId) -> Result<(), String>;

    fn list(&self, image_id: ImageId) -> Result<Vec<MezoRecord>, String>;

    /// Saved porosity and calibration of `image_id`, if any.
    fn image_meta(&self, image_id: ImageId) -> Result<Option<ImageMeta>, String>;

    fn set_image_meta(&mut self, image_id: ImageId, meta: ImageMeta) -> Result<(), String>;
}

// ─── In-memory store ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecordStore {
    next_id: u64,
    records: BTreeMap<MezoId, MezoRecord>,
    #[serde(default)]
    images: BTreeMap<ImageId, ImageMeta>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(
        &mut self,
        image_id: ImageId,
        center: Point,
        diameter: f64,
    ) -> Result<MezoId, String> {
        self.next_id += 1;
        let id = MezoId(self.next_id);
        self.records.insert(
            id,
            MezoRecord {
                id,
                image_id,
                center_x: center.x,
                center_y: center.y,
                diameter,
                square: square_of(diameter),
            },
        );
        Ok(id)
    }

    fn restore(&mut self, record: MezoRecord) -> Result<(), String> {
        if record.id.get() > self.next_id {
            return Err(format!("{} was never issued", record.id));
        }
        if self.records.contains_key(&record.id) {
            return Err(format!("{} already exists", record.id));
        }
        self.records.insert(record.id, record);
        Ok(())
    }

    fn delete(&mut self, id: MezoId) -> Result<(), String> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| format!("no record {id}"))
    }

    fn list(&self, image_id: ImageId) -> Result<Vec<MezoRecord>, String> {
        Ok(self
            .records
            .values()
            .filter(|r| r.image_id == image_id)
            .copied()
            .collect())
    }

    fn image_meta(&self, image_id: ImageId) -> Result<Option<ImageMeta>, String> {
        Ok(self.images.get(&image_id).copied())
    }

    fn set_image_meta(&mut self, image_id: ImageId, meta: ImageMeta) -> Result<(), String> {
        self.images.insert(image_id, meta);
        Ok(())
    }
}

// ─── File-backed store ───────────────────────────────────────────────────

/// A `MemoryRecordStore` written to a MessagePack file after every mutation.
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    inner: MemoryRecordStore,
}

impl FileRecordStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let inner = if path.exists() {
            let bytes = std::fs::read(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            rmp_serde::from_slice(&bytes)
                .map_err(|e| format!("corrupt record file {}: {e}", path.display()))?
        } else {
            MemoryRecordStore::new()
        };
        log::info!("record store {} ({} records)", path.display(), inner.len());
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), String> {
        let bytes = rmp_serde::to_vec(&self.inner).map_err(|e| e.to_string())?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
            }
        }
        std::fs::write(&self.path, bytes)
            .map_err(|e| format!("cannot write {}: {e}", self.path.display()))
    }
}

impl RecordStore for FileRecordStore {
    fn insert(
        &mut self,
        image_id: ImageId,
        center: Point,
        diameter: f64,
    ) -> Result<MezoId, String> {
        let id = self.inner.insert(image_id, center, diameter)?;
        if let Err(e) = self.flush() {
            if let Err(undo) = self.inner.delete(id) {
                log::warn!("could not drop unsaved {id}: {undo}");
            }
            return Err(e);
        }
        Ok(id)
    }

    fn restore(&mut self, record: MezoRecord) -> Result<(), String> {
        self.inner.restore(record)?;
        if let Err(e) = self.flush() {
            if let Err(undo) = self.inner.delete(record.id) {
                log::warn!("could not drop unsaved {}: {undo}", record.id);
            }
            return Err(e);
        }
        Ok(())
    }

    fn delete(&mut self, id: MezoId) -> Result<(), String> {
        let removed = self.inner.records.get(&id).copied();
        self.inner.delete(id)?;
        if let Err(e) = self.flush() {
            if let Some(record) = removed {
                self.inner.records.insert(id, record);
            }
            return Err(e);
        }
        Ok(())
    }

    fn list(&self, image_id: ImageId) -> Result<Vec<MezoRecord>, String> {
        self.inner.list(image_id)
    }

    fn image_meta(&self, image_id: ImageId) -> Result<Option<ImageMeta>, String> {
        self.inner.image_meta(image_id)
    }

    fn set_image_meta(&mut self, image_id: ImageId, meta: ImageMeta) -> Result<(), String> {
        let previous = self.inner.images.insert(image_id, meta);
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.inner.images.insert(image_id, old),
                None => self.inner.images.remove(&image_id),
            };
            return Err(e);
        }
        Ok(())
    }
}

// ─── Annotation Store ────────────────────────────────────────────────────

/// Ordered annotations of the open image. Index order is z-order:
/// the first element was painted first. Ids increase along the list, so
/// the order survives a round trip through the record store.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    image_id: ImageId,
    mezos: Vec<Mezo>,
}

impl AnnotationStore {
    /// An empty store for `image_id` (nothing loaded from records).
    pub fn empty(image_id: ImageId) -> Self {
        Self {
            image_id,
            mezos: Vec::new(),
        }
    }

    /// Load the annotations of `image_id` from the record store.
    pub fn load(records: &dyn RecordStore, image_id: ImageId) -> EngineResult<Self> {
        let mut rows = records.list(image_id).map_err(EngineError::Persistence)?;
        rows.sort_by_key(|r| r.id);
        Ok(Self {
            image_id,
            mezos: rows.into_iter().map(Mezo::from).collect(),
        })
    }

    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    /// Create an annotation, mirroring it to the record store first.
    pub fn create(
        &mut self,
        records: &mut dyn RecordStore,
        center: Point,
        diameter: f64,
    ) -> EngineResult<Mezo> {
        validate_diameter(diameter)?;
        let id = records
            .insert(self.image_id, center, diameter)
            .map_err(EngineError::Persistence)?;
        let mezo = Mezo {
            id,
            center,
            diameter,
            square: square_of(diameter),
        };
        self.mezos.push(mezo);
        log::info!(
            "created {id} at ({}, {}) d={diameter:.2}",
            center.x,
            center.y
        );
        Ok(mezo)
    }

    pub fn delete(&mut self, records: &mut dyn RecordStore, id: MezoId) -> EngineResult<Mezo> {
        let position = self
            .position(id)
            .ok_or(EngineError::UnknownAnnotation(id))?;
        records.delete(id).map_err(EngineError::Persistence)?;
        let mezo = self.mezos.remove(position);
        log::info!("deleted {id}");
        Ok(mezo)
    }

    /// Bring back a deleted annotation under its own id, which puts it
    /// back at its former z position.
    pub fn reinsert(&mut self, records: &mut dyn RecordStore, mezo: &Mezo) -> EngineResult<()> {
        let position = self.mezos.partition_point(|m| m.id < mezo.id);
        if self.mezos.get(position).is_some_and(|m| m.id == mezo.id) {
            return Err(EngineError::Persistence(format!("{} already exists", mezo.id)));
        }
        records
            .restore(mezo.to_record(self.image_id))
            .map_err(EngineError::Persistence)?;
        self.mezos.insert(position, *mezo);
        log::info!("restored {} at {position}", mezo.id);
        Ok(())
    }

    pub fn list(&self) -> &[Mezo] {
        &self.mezos
    }

    pub fn get(&self, id: MezoId) -> Option<&Mezo> {
        self.mezos.iter().find(|m| m.id == id)
    }

    pub fn position(&self, id: MezoId) -> Option<usize> {
        self.mezos.iter().position(|m| m.id == id)
    }

    /// Most recently inserted annotation.
    pub fn last(&self) -> Option<&Mezo> {
        self.mezos.last()
    }

    /// Topmost annotation containing `point`.
    pub fn find_containing(&self, point: Point) -> Option<MezoId> {
        self.mezos
            .iter()
            .rev()
            .find(|m| m.contains(point))
            .map(|m| m.id)
    }

    pub fn len(&self) -> usize {
        self.mezos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mezos.is_empty()
    }
}
