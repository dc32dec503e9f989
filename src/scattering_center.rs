use crate::error::{CollisionError, Result};
use crate::particle::ParticleType;
use crate::reaction::{Reaction, ReactionKind};

/// One species of scatterer: a nuclide (neutron family), photoatom, or
/// electroatom, aggregating every reaction channel for that species.
///
/// The total microscopic cross section is defined as the in-order sum of the
/// channel cross sections, so total and per-reaction queries can never drift
/// apart. Constructed once at setup from a data table, immutable afterwards,
/// and shared read-only (`Arc`) across materials and worker threads.
#[derive(Debug)]
pub struct ScatteringCenter {
    name: String,
    family: ParticleType,
    atomic_number: u32,
    mass_number: Option<u32>,
    atomic_weight_ratio: f64,
    reactions: Vec<Reaction>,
}

impl ScatteringCenter {
    /// Build a scattering center from its reaction channels. The channel
    /// order is fixed here and drives the deterministic selection walk.
    pub fn new(
        name: impl Into<String>,
        family: ParticleType,
        atomic_number: u32,
        mass_number: Option<u32>,
        atomic_weight_ratio: f64,
        reactions: Vec<Reaction>,
    ) -> Result<Self> {
        let name = name.into();
        if reactions.is_empty() {
            return Err(CollisionError::MalformedDataTable {
                name,
                reason: "no reaction channels".to_string(),
            });
        }
        if atomic_weight_ratio <= 0.0 {
            return Err(CollisionError::MalformedDataTable {
                name,
                reason: format!("non-positive atomic weight ratio {}", atomic_weight_ratio),
            });
        }
        for reaction in &reactions {
            if reaction.kind.family() != family {
                return Err(CollisionError::MalformedDataTable {
                    name,
                    reason: format!(
                        "{:?} channel does not belong to the {} family",
                        reaction.kind, family
                    ),
                });
            }
        }
        Ok(Self {
            name,
            family,
            atomic_number,
            mass_number,
            atomic_weight_ratio,
            reactions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> ParticleType {
        self.family
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn mass_number(&self) -> Option<u32> {
        self.mass_number
    }

    pub fn atomic_weight_ratio(&self) -> f64 {
        self.atomic_weight_ratio
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Total microscopic cross section (barns) at `energy_ev`: the sum of all
    /// channel cross sections in channel order.
    pub fn total_cross_section(&self, energy_ev: f64) -> f64 {
        self.reactions
            .iter()
            .map(|r| r.cross_section_at(energy_ev))
            .sum()
    }

    /// Microscopic cross section of one reaction kind. A kind this species
    /// does not carry contributes 0.0 rather than an error: the kind space is
    /// closed and callers are expected to probe.
    pub fn reaction_cross_section(&self, energy_ev: f64, kind: ReactionKind) -> f64 {
        self.reactions
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.cross_section_at(energy_ev))
            .sum()
    }

    /// Summed cross section of the absorption-category channels, used for
    /// survival biasing.
    pub fn absorption_cross_section(&self, energy_ev: f64) -> f64 {
        self.reactions
            .iter()
            .filter(|r| r.kind.is_absorption())
            .map(|r| r.cross_section_at(energy_ev))
            .sum()
    }

    /// Select a reaction with probability proportional to its cross section.
    ///
    /// Walks the fixed channel order accumulating partial sums until the
    /// scaled draw is exceeded. A zero-cross-section channel spans a
    /// zero-width interval and is never selected. If round-off leaves the
    /// accumulated sum just below the draw, the last contributing channel is
    /// selected rather than failing.
    ///
    /// Panics if the total cross section is non-positive: sampling a reaction
    /// where no interaction is possible is a caller bug.
    pub fn sample_reaction<R: rand::Rng + ?Sized>(
        &self,
        energy_ev: f64,
        rng: &mut R,
    ) -> &Reaction {
        self.sample_filtered(energy_ev, rng, |_| true)
    }

    /// Like [`Self::sample_reaction`] but restricted to non-absorption
    /// channels; used by implicit-capture collisions after the survival
    /// weight adjustment.
    pub fn sample_survival_reaction<R: rand::Rng + ?Sized>(
        &self,
        energy_ev: f64,
        rng: &mut R,
    ) -> &Reaction {
        self.sample_filtered(energy_ev, rng, |r| !r.kind.is_absorption())
    }

    fn sample_filtered<R, F>(&self, energy_ev: f64, rng: &mut R, keep: F) -> &Reaction
    where
        R: rand::Rng + ?Sized,
        F: Fn(&Reaction) -> bool,
    {
        let total: f64 = self
            .reactions
            .iter()
            .filter(|r| keep(r))
            .map(|r| r.cross_section_at(energy_ev))
            .sum();
        assert!(
            total > 0.0,
            "reaction sampling for '{}' at {} eV with zero total cross section",
            self.name,
            energy_ev
        );

        let threshold = rng.gen::<f64>() * total;
        let mut accumulated = 0.0;
        let mut last_contributing = None;
        for reaction in self.reactions.iter().filter(|r| keep(r)) {
            let xs = reaction.cross_section_at(energy_ev);
            if xs > 0.0 {
                last_contributing = Some(reaction);
                accumulated += xs;
                if threshold < accumulated {
                    return reaction;
                }
            }
        }
        // Round-off clamp: accumulated ended marginally below the draw.
        last_contributing.expect("no contributing reaction despite positive total")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::{NuclearReactionKind, OutgoingLaw};
    use crate::rng::FastRng;

    fn channel(kind: NuclearReactionKind, xs: f64) -> Reaction {
        Reaction {
            kind: ReactionKind::Nuclear(kind),
            threshold_idx: 0,
            energy: vec![1.0, 1.0e7],
            cross_section: vec![xs, xs],
            q_value_ev: 0.0,
            law: OutgoingLaw::ElasticIsotropic,
        }
    }

    fn three_channel_center() -> ScatteringCenter {
        ScatteringCenter::new(
            "X99",
            ParticleType::Neutron,
            42,
            Some(99),
            98.0,
            vec![
                channel(NuclearReactionKind::Elastic, 1.0),
                channel(NuclearReactionKind::RadiativeCapture, 2.0),
                channel(NuclearReactionKind::NAlpha, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_total_is_sum_of_channels() {
        let center = three_channel_center();
        let total = center.total_cross_section(1.0e6);
        let by_kind: f64 = [
            NuclearReactionKind::Elastic,
            NuclearReactionKind::RadiativeCapture,
            NuclearReactionKind::NAlpha,
        ]
        .iter()
        .map(|&k| center.reaction_cross_section(1.0e6, ReactionKind::Nuclear(k)))
        .sum();
        assert!((total - 4.0).abs() < 1e-12);
        assert!((total - by_kind).abs() / total < 1e-12);
    }

    #[test]
    fn test_absent_reaction_kind_is_zero() {
        let center = three_channel_center();
        assert_eq!(
            center.reaction_cross_section(
                1.0e6,
                ReactionKind::Nuclear(NuclearReactionKind::Fission)
            ),
            0.0
        );
    }

    #[test]
    fn test_absorption_cross_section() {
        let center = three_channel_center();
        // capture (2.0) + (n,alpha) (1.0)
        assert!((center.absorption_cross_section(1.0e6) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sampling_frequencies_match_ratios() {
        // 1:2:1 channels should select as 25% / 50% / 25%
        let center = three_channel_center();
        let mut rng = FastRng::new(7771);
        let mut counts = [0usize; 3];
        let draws = 100_000;
        for _ in 0..draws {
            let r = center.sample_reaction(1.0e6, &mut rng);
            match r.kind {
                ReactionKind::Nuclear(NuclearReactionKind::Elastic) => counts[0] += 1,
                ReactionKind::Nuclear(NuclearReactionKind::RadiativeCapture) => counts[1] += 1,
                ReactionKind::Nuclear(NuclearReactionKind::NAlpha) => counts[2] += 1,
                _ => unreachable!(),
            }
        }
        let freqs: Vec<f64> = counts.iter().map(|&c| c as f64 / draws as f64).collect();
        assert!((freqs[0] - 0.25).abs() < 0.01, "elastic {}", freqs[0]);
        assert!((freqs[1] - 0.50).abs() < 0.01, "capture {}", freqs[1]);
        assert!((freqs[2] - 0.25).abs() < 0.01, "(n,alpha) {}", freqs[2]);
    }

    #[test]
    fn test_zero_cross_section_channel_never_selected() {
        let center = ScatteringCenter::new(
            "Y1",
            ParticleType::Neutron,
            1,
            Some(1),
            1.0,
            vec![
                channel(NuclearReactionKind::Fission, 0.0),
                channel(NuclearReactionKind::Elastic, 3.0),
            ],
        )
        .unwrap();
        let mut rng = FastRng::new(55);
        for _ in 0..1000 {
            let r = center.sample_reaction(1.0e5, &mut rng);
            assert_eq!(r.kind, ReactionKind::Nuclear(NuclearReactionKind::Elastic));
        }
    }

    #[test]
    fn test_survival_sampling_excludes_absorption() {
        let center = three_channel_center();
        let mut rng = FastRng::new(4);
        for _ in 0..1000 {
            let r = center.sample_survival_reaction(1.0e6, &mut rng);
            assert!(!r.kind.is_absorption());
        }
    }

    #[test]
    fn test_rejects_wrong_family_channel() {
        let err = ScatteringCenter::new(
            "bad",
            ParticleType::Photon,
            1,
            None,
            1.0,
            vec![channel(NuclearReactionKind::Elastic, 1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, CollisionError::MalformedDataTable { .. }));
    }

    #[test]
    fn test_rejects_empty_reaction_set() {
        let err =
            ScatteringCenter::new("empty", ParticleType::Neutron, 1, None, 1.0, vec![]).unwrap_err();
        assert!(matches!(err, CollisionError::MalformedDataTable { .. }));
    }
}
