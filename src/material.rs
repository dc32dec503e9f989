use std::sync::Arc;

use log::trace;

use crate::bank::SecondaryBank;
use crate::error::{CollisionError, Result};
use crate::particle::{ParticleState, ParticleType};
use crate::reaction::ReactionKind;
use crate::scattering_center::ScatteringCenter;

/// Histories below this energy are no longer worth tracking.
pub const ENERGY_FLOOR_EV: f64 = 1e-11;

/// Implicit-capture histories below this weight are terminated.
pub const WEIGHT_CUTOFF: f64 = 1e-12;

/// Tolerance on the constituent fraction sum at construction.
const FRACTION_SUM_TOLERANCE: f64 = 1e-6;

/// Collision physics mode.
///
/// `Analogue` is physically faithful: weight never changes and an absorption
/// channel terminates the history. `ImplicitCapture` multiplies the weight by
/// the survival probability of the selected scattering center and samples only
/// non-absorption channels, so a history is never capture-terminated (fission
/// remains analogue in both modes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionMode {
    Analogue,
    ImplicitCapture,
}

impl ParticleType {
    /// Collision mode used when the caller does not request one explicitly.
    /// Photons default to implicit capture; the charged and neutral hadronic
    /// families stay analogue.
    pub fn default_collision_mode(&self) -> CollisionMode {
        match self {
            ParticleType::Neutron => CollisionMode::Analogue,
            ParticleType::Photon => CollisionMode::ImplicitCapture,
            ParticleType::Electron => CollisionMode::Analogue,
        }
    }
}

/// A homogeneous mixture of scattering centers at fixed atom fractions and a
/// scalar number density (atoms/b·cm).
///
/// Immutable after construction; one instance may be referenced by many cells
/// (the factory deduplicates by material id and density), so all methods take
/// `&self` and the object is shared through `Arc`.
#[derive(Debug)]
pub struct Material {
    id: u32,
    name: Option<String>,
    number_density: f64,
    constituents: Vec<(Arc<ScatteringCenter>, f64)>,
    family: ParticleType,
}

impl Material {
    /// Build a material from (scattering center, atom fraction) pairs.
    ///
    /// Fractions must be positive and sum to 1 within tolerance; every
    /// constituent must belong to the same particle family.
    pub fn new(
        id: u32,
        number_density: f64,
        constituents: Vec<(Arc<ScatteringCenter>, f64)>,
    ) -> Result<Self> {
        if constituents.is_empty() {
            return Err(CollisionError::InvalidMaterialRepresentation {
                material: id.to_string(),
                reason: "material has no constituents".to_string(),
            });
        }
        if !number_density.is_finite() || number_density <= 0.0 {
            return Err(CollisionError::InvalidMaterialRepresentation {
                material: id.to_string(),
                reason: format!("non-positive number density {}", number_density),
            });
        }
        let mut sum = 0.0;
        for (center, fraction) in &constituents {
            if !fraction.is_finite() || *fraction <= 0.0 {
                return Err(CollisionError::InvalidMaterialRepresentation {
                    material: id.to_string(),
                    reason: format!(
                        "non-positive fraction {} for constituent '{}'",
                        fraction,
                        center.name()
                    ),
                });
            }
            sum += fraction;
        }
        if (sum - 1.0).abs() > FRACTION_SUM_TOLERANCE {
            return Err(CollisionError::InvalidMaterialRepresentation {
                material: id.to_string(),
                reason: format!("constituent fractions sum to {}, expected 1", sum),
            });
        }
        let family = constituents[0].0.family();
        for (center, _) in &constituents {
            if center.family() != family {
                return Err(CollisionError::InvalidMaterialRepresentation {
                    material: id.to_string(),
                    reason: format!(
                        "constituent '{}' is {} data in a {} material",
                        center.name(),
                        center.family(),
                        family
                    ),
                });
            }
        }
        Ok(Self {
            id,
            name: None,
            number_density,
            constituents,
            family,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn number_density(&self) -> f64 {
        self.number_density
    }

    pub fn family(&self) -> ParticleType {
        self.family
    }

    pub fn constituents(&self) -> &[(Arc<ScatteringCenter>, f64)] {
        &self.constituents
    }

    /// Per-constituent macroscopic terms N * f_i * sigma_t,i(E), in
    /// constituent order.
    ///
    /// The total query and the selection walk both consume this vector, so
    /// the scale of the selection draw and the walk accumulate in the same
    /// floating-point order and cannot disagree.
    fn constituent_terms(&self, energy_ev: f64) -> Vec<f64> {
        self.constituents
            .iter()
            .map(|(center, fraction)| {
                self.number_density * fraction * center.total_cross_section(energy_ev)
            })
            .collect()
    }

    /// Macroscopic total cross section (1/cm) at `energy_ev`.
    pub fn macroscopic_total_cross_section(&self, energy_ev: f64) -> f64 {
        self.constituent_terms(energy_ev).iter().sum()
    }

    /// Macroscopic cross section (1/cm) of one reaction kind summed over all
    /// constituents.
    pub fn macroscopic_reaction_cross_section(&self, energy_ev: f64, kind: ReactionKind) -> f64 {
        self.constituents
            .iter()
            .map(|(center, fraction)| {
                self.number_density * fraction * center.reaction_cross_section(energy_ev, kind)
            })
            .sum()
    }

    /// Select the scattering center the particle collided with, weighted by
    /// the macroscopic contribution of each constituent.
    fn sample_constituent<R: rand::Rng + ?Sized>(
        &self,
        energy_ev: f64,
        rng: &mut R,
    ) -> &Arc<ScatteringCenter> {
        let terms = self.constituent_terms(energy_ev);
        let total: f64 = terms.iter().sum();
        assert!(
            total > 0.0,
            "collision sampled in material {} at {} eV where the total macroscopic \
             cross section is zero",
            self.id,
            energy_ev
        );

        let threshold = rng.gen::<f64>() * total;
        let mut accumulated = 0.0;
        let mut last_contributing = None;
        for ((center, _), term) in self.constituents.iter().zip(&terms) {
            if *term > 0.0 {
                last_contributing = Some(center);
                accumulated += term;
                if threshold < accumulated {
                    return center;
                }
            }
        }
        last_contributing.expect("no contributing constituent despite positive total")
    }

    /// Perform a full collision: select a scattering center, select a
    /// reaction, and invoke its sampling law. Mutates `state` in place and
    /// may push secondaries into `bank`.
    pub fn collide<R, B>(
        &self,
        state: &mut ParticleState,
        bank: &mut B,
        mode: CollisionMode,
        rng: &mut R,
    ) where
        R: rand::Rng + ?Sized,
        B: SecondaryBank,
    {
        let energy = state.energy_ev;
        let center = self.sample_constituent(energy, rng);

        match mode {
            CollisionMode::Analogue => {
                let reaction = center.sample_reaction(energy, rng);
                trace!(
                    "material {}: analogue collision with {} via {:?}",
                    self.id,
                    center.name(),
                    reaction.kind
                );
                reaction.sample(state, bank, center.atomic_weight_ratio(), rng);
            }
            CollisionMode::ImplicitCapture => {
                let total = center.total_cross_section(energy);
                let absorption = center.absorption_cross_section(energy);
                let survival = total - absorption;
                if survival <= 0.0 {
                    // Pure absorber: nothing to survive into.
                    state.weight = 0.0;
                    state.alive = false;
                    return;
                }
                if absorption > 0.0 {
                    state.weight *= survival / total;
                }
                if state.weight < WEIGHT_CUTOFF {
                    state.alive = false;
                    return;
                }
                let reaction = center.sample_survival_reaction(energy, rng);
                trace!(
                    "material {}: implicit-capture collision with {} via {:?}, weight {}",
                    self.id,
                    center.name(),
                    reaction.kind,
                    state.weight
                );
                reaction.sample(state, bank, center.atomic_weight_ratio(), rng);
            }
        }
    }
}
