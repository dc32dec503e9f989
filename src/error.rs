use thiserror::Error;

use crate::particle::{CellId, ParticleType};

/// Errors raised while building or querying the collision engine.
///
/// Configuration errors (`InvalidMaterialRepresentation`, `UndeclaredMaterial`,
/// `UnknownScatteringCenter`, `MalformedDataTable`, `Unsupported`) are raised
/// during factory construction and abort setup. `CellNotFound` and
/// `DuplicateCellAssignment` indicate a geometry/material mismatch and are
/// fatal at the point of use: a run that continues past one of them would
/// silently corrupt the physical result.
#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("invalid material representation for material '{material}': {reason}")]
    InvalidMaterialRepresentation { material: String, reason: String },

    #[error("cell {cell} has no {particle} material assigned")]
    CellNotFound { cell: CellId, particle: ParticleType },

    #[error("cell {cell} already has a {particle} material assigned")]
    DuplicateCellAssignment { cell: CellId, particle: ParticleType },

    #[error("cell {cell} references undeclared material id {material_id}")]
    UndeclaredMaterial { cell: CellId, material_id: u32 },

    #[error("scattering center '{alias}' not found in the data table index")]
    UnknownScatteringCenter { alias: String },

    #[error("data table '{name}' could not be used: {reason}")]
    MalformedDataTable { name: String, reason: String },

    #[error("unsupported feature requested: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, CollisionError>;
