use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::arena::ShapeId;

/// Construction-time violations of the scene graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("transform is not invertible")]
    NonInvertibleTransform,

    #[error("shape {0} does not exist")]
    UnknownShape(ShapeId),

    #[error("shape {0} is already attached to the scene graph")]
    AlreadyParented(ShapeId),

    #[error("shape {child} is already a child of group {group}")]
    DuplicateChild { group: ShapeId, child: ShapeId },

    #[error("shape {0} is not a group")]
    NotAGroup(ShapeId),

    #[error("attaching {child} under {parent} would make it its own ancestor")]
    Cycle { parent: ShapeId, child: ShapeId },
}

pub type ShapeResult<T> = Result<T, ShapeError>;

/// Errors raised while reading Wavefront OBJ data.
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: vertex index {index} is out of range")]
    VertexOutOfRange { line: usize, index: i64 },

    #[error("line {line}: normal index {index} is out of range")]
    NormalOutOfRange { line: usize, index: i64 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type ObjResult<T> = Result<T, ObjError>;

/// Errors raised while turning a scene description into a world.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("failed to load mesh {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: ObjError,
    },

    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    #[error("invalid light: {0}")]
    InvalidLight(String),
}

pub type SceneResult<T> = Result<T, SceneError>;
