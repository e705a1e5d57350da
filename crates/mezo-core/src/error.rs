//! Engine error type.
//!
//! Collaborator traits (`RecordStore`, segmentation oracles) report plain
//! `String` errors; they are mapped into `EngineError` at the boundary so
//! callers can match on the kind for UI feedback.

use crate::id::MezoId;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// An operation needs an open image and none is open.
    NoImageOpen,
    /// A circle with a zero, negative or non-finite diameter.
    DegenerateAnnotation { diameter: f64 },
    /// The record store rejected a create/delete/list.
    Persistence(String),
    /// The segmentation oracle failed or returned an unusable mask.
    Segmentation(String),
    /// Mask allocation, decoding or file write failed.
    Raster(String),
    /// The id is not part of the open image's annotations.
    UnknownAnnotation(MezoId),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoImageOpen => write!(f, "no image is open"),
            EngineError::DegenerateAnnotation { diameter } => {
                write!(f, "degenerate annotation: diameter {diameter}")
            }
            EngineError::Persistence(msg) => write!(f, "record store error: {msg}"),
            EngineError::Segmentation(msg) => write!(f, "segmentation error: {msg}"),
            EngineError::Raster(msg) => write!(f, "mask error: {msg}"),
            EngineError::UnknownAnnotation(id) => write!(f, "unknown annotation {id}"),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
