use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::bank::SecondaryBank;
use crate::error::{CollisionError, Result};
use crate::material::{CollisionMode, Material};
use crate::particle::{CellId, ParticleState, ParticleType};
use crate::reaction::ReactionKind;

/// Registry mapping geometric cells to filled materials, one map per particle
/// family.
///
/// Populated once at setup by the factory and read-only afterwards; the
/// material graph behind it is immutable, so a handler can be shared across
/// worker threads behind an `Arc` with no locking.
#[derive(Debug, Default)]
pub struct CollisionHandler {
    neutron_materials: HashMap<CellId, Arc<Material>>,
    photon_materials: HashMap<CellId, Arc<Material>>,
    electron_materials: HashMap<CellId, Arc<Material>>,
}

impl CollisionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn family_map(&self, family: ParticleType) -> &HashMap<CellId, Arc<Material>> {
        match family {
            ParticleType::Neutron => &self.neutron_materials,
            ParticleType::Photon => &self.photon_materials,
            ParticleType::Electron => &self.electron_materials,
        }
    }

    fn family_map_mut(&mut self, family: ParticleType) -> &mut HashMap<CellId, Arc<Material>> {
        match family {
            ParticleType::Neutron => &mut self.neutron_materials,
            ParticleType::Photon => &mut self.photon_materials,
            ParticleType::Electron => &mut self.electron_materials,
        }
    }

    /// Register `material` as filling each of `cells` for its particle
    /// family.
    ///
    /// All cells are checked for an existing assignment before any is
    /// inserted, so a rejected call leaves the handler unchanged.
    pub fn add_material(&mut self, material: Arc<Material>, cells: &[CellId]) -> Result<()> {
        let family = material.family();
        for &cell in cells {
            if self.family_map(family).contains_key(&cell) {
                return Err(CollisionError::DuplicateCellAssignment {
                    cell,
                    particle: family,
                });
            }
        }
        debug!(
            "registering {} material {} in {} cell(s)",
            family,
            material.id(),
            cells.len()
        );
        let map = self.family_map_mut(family);
        for &cell in cells {
            map.insert(cell, Arc::clone(&material));
        }
        Ok(())
    }

    /// True if `cell` has no material for `family` (a void region).
    pub fn is_cell_void(&self, family: ParticleType, cell: CellId) -> bool {
        !self.family_map(family).contains_key(&cell)
    }

    /// Material filling `cell` for `family`. Void cells are an error: the
    /// caller is responsible for checking [`Self::is_cell_void`] before
    /// asking for collision physics there.
    pub fn get_cell_material(
        &self,
        family: ParticleType,
        cell: CellId,
    ) -> Result<&Arc<Material>> {
        self.family_map(family)
            .get(&cell)
            .ok_or(CollisionError::CellNotFound {
                cell,
                particle: family,
            })
    }

    /// Macroscopic total cross section (1/cm) seen by `state` in its current
    /// cell.
    pub fn get_macroscopic_total_cross_section(&self, state: &ParticleState) -> Result<f64> {
        let material = self.get_cell_material(state.particle_type, state.cell)?;
        Ok(material.macroscopic_total_cross_section(state.energy_ev))
    }

    /// Macroscopic cross section (1/cm) of one reaction kind in the particle's
    /// current cell.
    pub fn get_macroscopic_reaction_cross_section(
        &self,
        state: &ParticleState,
        kind: ReactionKind,
    ) -> Result<f64> {
        let material = self.get_cell_material(state.particle_type, state.cell)?;
        Ok(material.macroscopic_reaction_cross_section(state.energy_ev, kind))
    }

    /// Collide `state` with the material filling its current cell. When
    /// `mode` is `None` the family's default collision mode is used.
    pub fn collide_with_cell_material<R, B>(
        &self,
        state: &mut ParticleState,
        bank: &mut B,
        mode: Option<CollisionMode>,
        rng: &mut R,
    ) -> Result<()>
    where
        R: rand::Rng + ?Sized,
        B: SecondaryBank,
    {
        let material = self.get_cell_material(state.particle_type, state.cell)?;
        let mode = mode.unwrap_or_else(|| state.particle_type.default_collision_mode());
        material.collide(state, bank, mode, rng);
        Ok(())
    }
}
