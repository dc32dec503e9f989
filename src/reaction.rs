use serde::{Deserialize, Serialize};

use crate::bank::SecondaryBank;
use crate::interpolation::{interpolate_linear, interpolate_log_log};
use crate::material::ENERGY_FLOOR_EV;
use crate::particle::{ParticleState, ParticleType};
use crate::physics;

/// Neutron-induced reaction channels. `mt()` gives the ENDF identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NuclearReactionKind {
    Elastic,
    LevelInelastic,
    N2n,
    N3n,
    Fission,
    RadiativeCapture,
    NProton,
    NAlpha,
}

impl NuclearReactionKind {
    pub fn mt(&self) -> i32 {
        match self {
            NuclearReactionKind::Elastic => 2,
            NuclearReactionKind::LevelInelastic => 51,
            NuclearReactionKind::N2n => 16,
            NuclearReactionKind::N3n => 17,
            NuclearReactionKind::Fission => 18,
            NuclearReactionKind::RadiativeCapture => 102,
            NuclearReactionKind::NProton => 103,
            NuclearReactionKind::NAlpha => 107,
        }
    }
}

/// Photon-atom interaction channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoatomicReactionKind {
    CoherentScattering,
    IncoherentScattering,
    PhotoelectricAbsorption,
    PairProduction,
}

/// Electron-atom interaction channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectroatomicReactionKind {
    CutoffElastic,
    Bremsstrahlung,
    AtomicExcitation,
    Electroionization,
}

/// Reaction identifier: one closed tag per particle family, so the material
/// and scattering-center algorithms are written once over this type instead
/// of being duplicated per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Nuclear(NuclearReactionKind),
    Photoatomic(PhotoatomicReactionKind),
    Electroatomic(ElectroatomicReactionKind),
}

/// Coarse classification used by the collision modes: absorption channels can
/// terminate a history (analogue) or feed survival biasing (implicit capture);
/// fission is sampled analogue in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCategory {
    Scattering,
    Absorption,
    Fission,
    Emission,
}

impl ReactionKind {
    /// Particle family whose scattering centers may carry this reaction.
    pub fn family(&self) -> ParticleType {
        match self {
            ReactionKind::Nuclear(_) => ParticleType::Neutron,
            ReactionKind::Photoatomic(_) => ParticleType::Photon,
            ReactionKind::Electroatomic(_) => ParticleType::Electron,
        }
    }

    pub fn category(&self) -> ReactionCategory {
        use ElectroatomicReactionKind as E;
        use NuclearReactionKind as N;
        use PhotoatomicReactionKind as P;
        match self {
            ReactionKind::Nuclear(N::Elastic) | ReactionKind::Nuclear(N::LevelInelastic) => {
                ReactionCategory::Scattering
            }
            ReactionKind::Nuclear(N::N2n) | ReactionKind::Nuclear(N::N3n) => {
                ReactionCategory::Emission
            }
            ReactionKind::Nuclear(N::Fission) => ReactionCategory::Fission,
            ReactionKind::Nuclear(N::RadiativeCapture)
            | ReactionKind::Nuclear(N::NProton)
            | ReactionKind::Nuclear(N::NAlpha) => ReactionCategory::Absorption,
            ReactionKind::Photoatomic(P::CoherentScattering)
            | ReactionKind::Photoatomic(P::IncoherentScattering) => ReactionCategory::Scattering,
            ReactionKind::Photoatomic(P::PhotoelectricAbsorption)
            | ReactionKind::Photoatomic(P::PairProduction) => ReactionCategory::Absorption,
            ReactionKind::Electroatomic(E::CutoffElastic)
            | ReactionKind::Electroatomic(E::AtomicExcitation) => ReactionCategory::Scattering,
            ReactionKind::Electroatomic(E::Bremsstrahlung)
            | ReactionKind::Electroatomic(E::Electroionization) => ReactionCategory::Emission,
        }
    }

    pub fn is_absorption(&self) -> bool {
        self.category() == ReactionCategory::Absorption
    }
}

/// Secondary energy spectra for emission-type laws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySpectrum {
    Watt { a_mev: f64, b_per_mev: f64 },
    Maxwellian { theta_ev: f64 },
    Discrete { energy_ev: f64 },
    FractionOfIncident { fraction: f64 },
}

impl EnergySpectrum {
    fn sample<R: rand::Rng + ?Sized>(&self, incident_ev: f64, rng: &mut R) -> f64 {
        match self {
            EnergySpectrum::Watt { a_mev, b_per_mev } => {
                physics::sample_watt_spectrum(*a_mev, *b_per_mev, rng)
            }
            EnergySpectrum::Maxwellian { theta_ev } => physics::sample_maxwellian(*theta_ev, rng),
            EnergySpectrum::Discrete { energy_ev } => *energy_ev,
            EnergySpectrum::FractionOfIncident { fraction } => incident_ev * fraction,
        }
    }
}

/// Outgoing-state sampling law attached to a reaction.
///
/// Each law is a self-contained model invoked through [`Reaction::sample`];
/// the selection machinery treats them as black boxes with a cross section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutgoingLaw {
    /// Analogue capture: the history ends, weight untouched.
    Disappearance,
    /// Isotropic-in-CM elastic scattering off a stationary target.
    ElasticIsotropic,
    /// Two-body inelastic level scattering using the reaction Q-value.
    LevelScattering,
    /// Primary absorbed; `multiplicity` secondaries of `product` type emitted
    /// isotropically with energies from `spectrum`. Covers (n,2n)/(n,3n) and
    /// capture photon production.
    MultiplicityEmission {
        product: ParticleType,
        multiplicity: f64,
        spectrum: EnergySpectrum,
    },
    /// Fission: nu-bar interpolated on (energy, value) tables, prompt
    /// neutrons from a Watt spectrum.
    Fission {
        nu_energy_ev: Vec<f64>,
        nu_value: Vec<f64>,
        #[serde(default = "default_watt_a")]
        watt_a_mev: f64,
        #[serde(default = "default_watt_b")]
        watt_b_per_mev: f64,
    },
    /// Incoherent (Compton) photon scattering.
    ComptonScattering,
    /// Coherent photon scattering: deflection only, energy unchanged.
    CoherentScattering,
    /// Photoelectric absorption; an optional fluorescence photon is emitted
    /// when atomic-relaxation data was attached at construction.
    PhotoelectricAbsorption {
        #[serde(default)]
        fluorescence_ev: Option<f64>,
    },
    /// Pair production: photon absorbed, electron/positron pair banked as two
    /// electron states sharing the available energy.
    PairProduction,
    /// Bremsstrahlung photon emission; the electron survives with reduced
    /// energy. `radiated_fraction` caps the sampled photon energy fraction.
    Bremsstrahlung { radiated_fraction: f64 },
    /// Deterministic mean energy loss to atomic excitation.
    AtomicExcitation { mean_loss_ev: f64 },
    /// Knock-on electron emission; the primary keeps the remaining energy.
    Electroionization { binding_ev: f64 },
}

fn default_watt_a() -> f64 {
    0.988
}

fn default_watt_b() -> f64 {
    2.249
}

/// One reaction channel of a scattering center: a tabulated cross section on
/// a threshold-truncated energy grid plus an outgoing-state law.
///
/// Extrapolation policy, uniform for every channel and therefore consistent
/// between total and per-reaction queries: zero below the first tabulated
/// energy (threshold), last tabulated value above the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub kind: ReactionKind,
    /// Index into the parent grid where this channel becomes active.
    #[serde(default)]
    pub threshold_idx: usize,
    /// Channel energy grid (the parent grid sliced at `threshold_idx`).
    pub energy: Vec<f64>,
    /// Cross section in barns, one value per grid point.
    pub cross_section: Vec<f64>,
    /// Q-value in eV.
    #[serde(default)]
    pub q_value_ev: f64,
    pub law: OutgoingLaw,
}

impl Reaction {
    /// Cross section (barns) at `energy_ev`.
    pub fn cross_section_at(&self, energy_ev: f64) -> f64 {
        if self.energy.is_empty() || self.cross_section.is_empty() {
            return 0.0;
        }
        if energy_ev < self.energy[0] {
            return 0.0; // below threshold
        }
        // Photoatomic cross sections vary over decades; log-log matches the
        // tabulation. Everything else is lin-lin like the source grids.
        match self.kind {
            ReactionKind::Photoatomic(_) => {
                interpolate_log_log(&self.energy, &self.cross_section, energy_ev)
            }
            _ => interpolate_linear(&self.energy, &self.cross_section, energy_ev),
        }
    }

    /// Invoke the outgoing-state law: mutate `state` in place and push any
    /// secondaries into `bank`. `awr` is the target atomic weight ratio of
    /// the owning scattering center.
    pub fn sample<R, B>(&self, state: &mut ParticleState, bank: &mut B, awr: f64, rng: &mut R)
    where
        R: rand::Rng + ?Sized,
        B: SecondaryBank,
    {
        match &self.law {
            OutgoingLaw::Disappearance => {
                state.alive = false;
            }
            OutgoingLaw::ElasticIsotropic => {
                let mu_cm = 2.0 * rng.gen::<f64>() - 1.0;
                physics::elastic_scatter(state, awr, mu_cm, rng);
            }
            OutgoingLaw::LevelScattering => {
                physics::level_scatter(state, awr, self.q_value_ev, rng);
            }
            OutgoingLaw::MultiplicityEmission {
                product,
                multiplicity,
                spectrum,
            } => {
                let incident = state.energy_ev;
                state.alive = false;
                let n = physics::stochastic_round(*multiplicity, rng);
                for _ in 0..n {
                    let energy = spectrum.sample(incident, rng).max(ENERGY_FLOOR_EV);
                    let direction = physics::isotropic_direction(rng);
                    bank.push_with_reaction(
                        state.spawn_secondary(*product, direction, energy),
                        self.kind,
                    );
                }
            }
            OutgoingLaw::Fission {
                nu_energy_ev,
                nu_value,
                watt_a_mev,
                watt_b_per_mev,
            } => {
                let nu_bar = interpolate_linear(nu_energy_ev, nu_value, state.energy_ev);
                state.alive = false;
                let n = physics::stochastic_round(nu_bar, rng);
                for _ in 0..n {
                    let energy = physics::sample_watt_spectrum(*watt_a_mev, *watt_b_per_mev, rng);
                    let direction = physics::isotropic_direction(rng);
                    bank.push_with_reaction(
                        state.spawn_secondary(ParticleType::Neutron, direction, energy),
                        self.kind,
                    );
                }
            }
            OutgoingLaw::ComptonScattering => {
                physics::compton_scatter(state, rng);
            }
            OutgoingLaw::CoherentScattering => {
                let mu = 2.0 * rng.gen::<f64>() - 1.0;
                physics::rotate_direction(&mut state.direction, mu, rng);
            }
            OutgoingLaw::PhotoelectricAbsorption { fluorescence_ev } => {
                state.alive = false;
                if let Some(e_fl) = fluorescence_ev {
                    if *e_fl > 0.0 {
                        let direction = physics::isotropic_direction(rng);
                        bank.push_with_reaction(
                            state.spawn_secondary(ParticleType::Photon, direction, *e_fl),
                            self.kind,
                        );
                    }
                }
            }
            OutgoingLaw::PairProduction => {
                let available = state.energy_ev - 2.0 * physics::ELECTRON_REST_MASS_EV;
                state.alive = false;
                if available > 0.0 {
                    for _ in 0..2 {
                        let direction = physics::isotropic_direction(rng);
                        bank.push_with_reaction(
                            state.spawn_secondary(
                                ParticleType::Electron,
                                direction,
                                available / 2.0,
                            ),
                            self.kind,
                        );
                    }
                }
            }
            OutgoingLaw::Bremsstrahlung { radiated_fraction } => {
                let e_photon = state.energy_ev * radiated_fraction * rng.gen::<f64>();
                if e_photon > ENERGY_FLOOR_EV {
                    // Forward-peaked: the photon keeps the electron direction
                    bank.push_with_reaction(
                        state.spawn_secondary(ParticleType::Photon, state.direction, e_photon),
                        self.kind,
                    );
                }
                state.energy_ev -= e_photon;
                if state.energy_ev <= ENERGY_FLOOR_EV {
                    state.alive = false;
                }
            }
            OutgoingLaw::AtomicExcitation { mean_loss_ev } => {
                state.energy_ev -= mean_loss_ev;
                if state.energy_ev <= ENERGY_FLOOR_EV {
                    state.alive = false;
                }
            }
            OutgoingLaw::Electroionization { binding_ev } => {
                let available = state.energy_ev - binding_ev;
                if available <= ENERGY_FLOOR_EV {
                    state.alive = false;
                    return;
                }
                // Knock-on electron takes up to half the available energy
                let e_knock = 0.5 * available * rng.gen::<f64>();
                if e_knock > ENERGY_FLOOR_EV {
                    let direction = physics::isotropic_direction(rng);
                    bank.push_with_reaction(
                        state.spawn_secondary(ParticleType::Electron, direction, e_knock),
                        self.kind,
                    );
                }
                state.energy_ev = available - e_knock;
                let mu = 2.0 * rng.gen::<f64>() - 1.0;
                physics::rotate_direction(&mut state.direction, mu, rng);
            }
        }
    }
}
