// Collision kinematics and spectrum sampling shared by the reaction laws.

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::particle::ParticleState;

/// Electron rest mass energy in eV.
pub const ELECTRON_REST_MASS_EV: f64 = 510_998.95;

/// Sample a direction uniformly over the unit sphere.
pub fn isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    let mu = 2.0 * rng.gen::<f64>() - 1.0;
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    let sin_theta = (1.0 - mu * mu).sqrt();
    [sin_theta * phi.cos(), sin_theta * phi.sin(), mu]
}

/// Rotate `direction` to a new unit vector with cosine `mu` relative to the
/// old one, azimuth sampled uniformly.
pub fn rotate_direction<R: Rng + ?Sized>(direction: &mut [f64; 3], mu: f64, rng: &mut R) {
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    let old = Vector3::from_row_slice(direction);
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Build an orthonormal frame around the old direction
    let perp = if old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(&old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(&old).normalize()
    };
    let ortho = old.cross(&perp);

    let new_dir = mu * old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho;
    *direction = [new_dir.x, new_dir.y, new_dir.z];
}

/// Elastic scattering off a stationary target of weight ratio `awr`, with the
/// center-of-mass scattering cosine `mu_cm` already sampled by the caller.
///
/// Target-at-rest two-body kinematics:
///   mu_lab = (1 + A mu_cm) / sqrt(A^2 + 2 A mu_cm + 1)
///   E_out  = E_in (A^2 + 1 + 2 A mu_cm) / (A + 1)^2
pub fn elastic_scatter<R: Rng + ?Sized>(
    state: &mut ParticleState,
    awr: f64,
    mu_cm: f64,
    rng: &mut R,
) {
    let a = awr;
    let mu_lab = (1.0 + a * mu_cm) / (a * a + 2.0 * a * mu_cm + 1.0).sqrt();
    state.energy_ev *= (a * a + 1.0 + 2.0 * a * mu_cm) / ((a + 1.0) * (a + 1.0));
    rotate_direction(&mut state.direction, mu_lab, rng);
}

/// Two-body level scattering with reaction Q-value (eV). The outgoing
/// center-of-mass energy follows the threshold relation
///   E_cm' = (A / (A + 1))^2 (E + Q (A + 1) / A)
/// and the lab deflection is sampled isotropically.
pub fn level_scatter<R: Rng + ?Sized>(
    state: &mut ParticleState,
    awr: f64,
    q_value_ev: f64,
    rng: &mut R,
) {
    let a = awr;
    let ratio = a / (a + 1.0);
    let e_out = ratio * ratio * (state.energy_ev + q_value_ev * (a + 1.0) / a);
    state.energy_ev = e_out.max(crate::material::ENERGY_FLOOR_EV);
    let mu = 2.0 * rng.gen::<f64>() - 1.0;
    rotate_direction(&mut state.direction, mu, rng);
}

/// Compton scattering: deflection cosine sampled isotropically, outgoing
/// energy from the Compton energy-angle relation
///   E' = E / (1 + (E / m_e c^2)(1 - mu)).
pub fn compton_scatter<R: Rng + ?Sized>(state: &mut ParticleState, rng: &mut R) {
    let mu = 2.0 * rng.gen::<f64>() - 1.0;
    let alpha = state.energy_ev / ELECTRON_REST_MASS_EV;
    state.energy_ev /= 1.0 + alpha * (1.0 - mu);
    rotate_direction(&mut state.direction, mu, rng);
}

/// Sample a fission neutron energy (eV) from the Watt spectrum
/// chi(E) = C exp(-E/a) sinh(sqrt(b E)), a in MeV, b in 1/MeV.
///
/// Rejection scheme from the standard sampling recipe (LA-UR-14-27694):
/// E = L x with x exponential, accepted when (y - M(x+1))^2 <= b L x.
pub fn sample_watt_spectrum<R: Rng + ?Sized>(a_mev: f64, b_per_mev: f64, rng: &mut R) -> f64 {
    let k = 1.0 + b_per_mev * a_mev / 8.0;
    let l = a_mev * (k + (k * k - 1.0).sqrt());
    let m = l / a_mev - 1.0;

    loop {
        let x = -rng.gen::<f64>().ln();
        let y = -rng.gen::<f64>().ln();
        if (y - m * (x + 1.0)).powi(2) <= b_per_mev * l * x {
            return l * x * 1.0e6; // MeV -> eV
        }
    }
}

/// Sample an energy (eV) from a Maxwellian spectrum p(E) ~ sqrt(E) exp(-E/T).
///
/// E = T x / 2 with x chi-squared with three degrees of freedom, generated
/// from three standard normal draws.
pub fn sample_maxwellian<R: Rng + ?Sized>(theta_ev: f64, rng: &mut R) -> f64 {
    let normal = Normal::<f64>::new(0.0, 1.0).expect("unit normal is a valid distribution");
    let x: f64 = (0..3).map(|_| normal.sample(rng).powi(2)).sum();
    theta_ev * x / 2.0
}

/// Round a fractional expected count to an integer, preserving the mean.
pub fn stochastic_round<R: Rng + ?Sized>(expected: f64, rng: &mut R) -> usize {
    let base = expected.floor();
    let frac = expected - base;
    let n = base as usize;
    if rng.gen::<f64>() < frac {
        n + 1
    } else {
        n
    }
}
