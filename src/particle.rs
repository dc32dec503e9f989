use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a geometric cell. Cell location and ray tracing are owned by
/// the geometry collaborator; the collision engine only keys on the id.
pub type CellId = u32;

/// The particle families the engine transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleType {
    Neutron,
    Photon,
    Electron,
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleType::Neutron => write!(f, "neutron"),
            ParticleType::Photon => write!(f, "photon"),
            ParticleType::Electron => write!(f, "electron"),
        }
    }
}

/// Transport mode selected at problem setup. The mode decides which particle
/// families get materials built for them; a closed enum makes an unrecognized
/// mode unrepresentable rather than a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleMode {
    Neutron,
    Photon,
    Electron,
    NeutronPhoton,
    PhotonElectron,
    NeutronPhotonElectron,
}

impl ParticleMode {
    /// Particle families that need materials under this mode.
    pub fn families(&self) -> &'static [ParticleType] {
        match self {
            ParticleMode::Neutron => &[ParticleType::Neutron],
            ParticleMode::Photon => &[ParticleType::Photon],
            ParticleMode::Electron => &[ParticleType::Electron],
            ParticleMode::NeutronPhoton => &[ParticleType::Neutron, ParticleType::Photon],
            ParticleMode::PhotonElectron => &[ParticleType::Photon, ParticleType::Electron],
            ParticleMode::NeutronPhotonElectron => &[
                ParticleType::Neutron,
                ParticleType::Photon,
                ParticleType::Electron,
            ],
        }
    }
}

/// State of one in-flight particle.
///
/// A plain value type: secondaries are banked by copying the state, which
/// preserves the particle family through the `particle_type` tag without any
/// dynamic dispatch. Energies are in eV, positions in cm, `weight` is the
/// statistical weight carried through non-analogue collisions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy_ev: f64,
    pub weight: f64,
    pub cell: CellId,
    pub history: u64,
    pub alive: bool,
}

impl ParticleState {
    pub fn new(
        particle_type: ParticleType,
        position: [f64; 3],
        direction: [f64; 3],
        energy_ev: f64,
        cell: CellId,
    ) -> Self {
        Self {
            particle_type,
            position,
            direction,
            energy_ev,
            weight: 1.0,
            cell,
            history: 0,
            alive: true,
        }
    }

    /// Spawn a secondary of `particle_type` at the site of this collision.
    /// The secondary inherits position, cell, history and statistical weight.
    pub fn spawn_secondary(
        &self,
        particle_type: ParticleType,
        direction: [f64; 3],
        energy_ev: f64,
    ) -> Self {
        Self {
            particle_type,
            position: self.position,
            direction,
            energy_ev,
            weight: self.weight,
            cell: self.cell,
            history: self.history,
            alive: true,
        }
    }

    pub fn set_cell(&mut self, cell: CellId) {
        self.cell = cell;
    }
}
