// Cross-section closure: macroscopic totals are linear in density and
// fraction, and the total equals the sum of the per-reaction parts at every
// energy.

use std::sync::Arc;

use collisions_for_mc::reaction::NuclearReactionKind;
use collisions_for_mc::{
    Material, OutgoingLaw, ParticleState, ParticleType, Reaction, ReactionKind, ScatteringCenter,
};

fn channel(kind: NuclearReactionKind, xs: &[f64], energy: &[f64], law: OutgoingLaw) -> Reaction {
    Reaction {
        kind: ReactionKind::Nuclear(kind),
        threshold_idx: 0,
        energy: energy.to_vec(),
        cross_section: xs.to_vec(),
        q_value_ev: 0.0,
        law,
    }
}

fn two_channel_center(name: &str, elastic: f64, capture: f64) -> Arc<ScatteringCenter> {
    let grid = [1.0, 1.0e7];
    Arc::new(
        ScatteringCenter::new(
            name,
            ParticleType::Neutron,
            1,
            Some(1),
            1.0,
            vec![
                channel(
                    NuclearReactionKind::Elastic,
                    &[elastic, elastic],
                    &grid,
                    OutgoingLaw::ElasticIsotropic,
                ),
                channel(
                    NuclearReactionKind::RadiativeCapture,
                    &[capture, capture],
                    &grid,
                    OutgoingLaw::Disappearance,
                ),
            ],
        )
        .unwrap(),
    )
}

#[test]
fn test_single_constituent_constant_table_is_exact() {
    // N = 1, f = 1, sigma = 2.0 barns everywhere: the macroscopic total must
    // be exactly 2.0 with no floating point slack.
    let center = Arc::new(
        ScatteringCenter::new(
            "mono",
            ParticleType::Neutron,
            1,
            Some(1),
            1.0,
            vec![channel(
                NuclearReactionKind::Elastic,
                &[2.0, 2.0],
                &[1.0, 1.0e7],
                OutgoingLaw::ElasticIsotropic,
            )],
        )
        .unwrap(),
    );
    let material = Material::new(1, 1.0, vec![(center, 1.0)]).unwrap();
    for energy in [1.0, 25.3e-3 * 1.0e6, 1.0e6, 1.0e7] {
        assert_eq!(material.macroscopic_total_cross_section(energy), 2.0);
    }
}

#[test]
fn test_macroscopic_total_is_linear_in_density() {
    let center = two_channel_center("lin", 1.5, 0.5);
    let thin = Material::new(1, 0.01, vec![(center.clone(), 1.0)]).unwrap();
    let thick = Material::new(2, 0.04, vec![(center, 1.0)]).unwrap();
    let ratio = thick.macroscopic_total_cross_section(1.0e5)
        / thin.macroscopic_total_cross_section(1.0e5);
    assert!((ratio - 4.0).abs() < 1e-12);
}

#[test]
fn test_total_equals_sum_of_reaction_parts() {
    let a = two_channel_center("A", 3.2, 0.8);
    let b = two_channel_center("B", 1.1, 2.9);
    let material = Material::new(3, 0.37, vec![(a, 0.25), (b, 0.75)]).unwrap();

    for energy in [10.0, 1.0e3, 2.5e6] {
        let total = material.macroscopic_total_cross_section(energy);
        let parts: f64 = [
            NuclearReactionKind::Elastic,
            NuclearReactionKind::RadiativeCapture,
        ]
        .iter()
        .map(|&k| material.macroscopic_reaction_cross_section(energy, ReactionKind::Nuclear(k)))
        .sum();
        assert!(
            (total - parts).abs() / total < 1e-12,
            "total {} != sum of parts {} at {} eV",
            total,
            parts,
            energy
        );
    }
}

#[test]
fn test_below_every_threshold_total_is_zero() {
    // All channels have thresholds above the query energy: the total is a
    // plain 0.0, not an error, so a driver can treat the region as
    // transparent.
    let center = Arc::new(
        ScatteringCenter::new(
            "threshold",
            ParticleType::Neutron,
            1,
            Some(2),
            2.0,
            vec![channel(
                NuclearReactionKind::N2n,
                &[0.0, 0.5],
                &[8.0e6, 1.4e7],
                OutgoingLaw::MultiplicityEmission {
                    product: ParticleType::Neutron,
                    multiplicity: 2.0,
                    spectrum: collisions_for_mc::EnergySpectrum::Maxwellian { theta_ev: 1.3e6 },
                },
            )],
        )
        .unwrap(),
    );
    let material = Material::new(4, 1.0, vec![(center, 1.0)]).unwrap();
    assert_eq!(material.macroscopic_total_cross_section(1.0e6), 0.0);
    assert_eq!(
        material.macroscopic_reaction_cross_section(
            1.0e6,
            ReactionKind::Nuclear(NuclearReactionKind::N2n)
        ),
        0.0
    );
}

#[test]
fn test_absent_reaction_kind_reads_zero_through_material() {
    let center = two_channel_center("noFission", 1.0, 1.0);
    let material = Material::new(5, 1.0, vec![(center, 1.0)]).unwrap();
    assert_eq!(
        material.macroscopic_reaction_cross_section(
            1.0e6,
            ReactionKind::Nuclear(NuclearReactionKind::Fission)
        ),
        0.0
    );
}

#[test]
fn test_state_energy_drives_the_lookup() {
    let center = Arc::new(
        ScatteringCenter::new(
            "ramp",
            ParticleType::Neutron,
            1,
            Some(1),
            1.0,
            vec![channel(
                NuclearReactionKind::Elastic,
                &[1.0, 3.0],
                &[0.0, 1.0e6],
                OutgoingLaw::ElasticIsotropic,
            )],
        )
        .unwrap(),
    );
    let material = Material::new(6, 1.0, vec![(center, 1.0)]).unwrap();
    let mid = ParticleState::new(ParticleType::Neutron, [0.0; 3], [0.0, 0.0, 1.0], 5.0e5, 1);
    // Linear interpolation halfway up the ramp
    assert!((material.macroscopic_total_cross_section(mid.energy_ev) - 2.0).abs() < 1e-12);
}
