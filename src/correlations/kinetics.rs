//! Electrode kinetics and electrochemical impedance.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ELECTRONS_PER_REACTION, FARADAY, GAS_CONSTANT, MAX_EXP_ARGUMENT, MIN_IMPEDANCE_FREQUENCY_HZ,
    MIN_TRANSIENT_TIME_S,
};
use crate::error::{finite, positive, NumericalError};

/// Butler–Volmer current density.
///
/// i = i₀·[exp(αnFη/RT) − exp(−(1−α)nFη/RT)], η = V − V₀, `t_kelvin` in K.
/// An exponent beyond [`MAX_EXP_ARGUMENT`] is reported as an overflow.
pub fn butler_volmer_current(
    v: f64,
    v0: f64,
    i0: f64,
    alpha: f64,
    t_kelvin: f64,
) -> Result<f64, NumericalError> {
    let t = positive(t_kelvin, "butler-volmer temperature")?;
    let eta = v - v0;
    let f = ELECTRONS_PER_REACTION * FARADAY / (GAS_CONSTANT * t);

    let anodic = alpha * f * eta;
    let cathodic = -(1.0 - alpha) * f * eta;
    for exponent in [anodic, cathodic] {
        if exponent > MAX_EXP_ARGUMENT {
            return Err(NumericalError::Overflow {
                context: "butler-volmer",
                exponent,
            });
        }
    }

    finite(i0 * (anodic.exp() - cathodic.exp()), "butler-volmer")
}

/// Cottrell diffusion-limited current (A).
///
/// i = nFAc·√(D/(πt)). `t` is clamped to [`MIN_TRANSIENT_TIME_S`] so the
/// t → 0 limit stays finite.
pub fn cottrell_current(t: f64, diffusivity: f64, concentration: f64, area: f64) -> f64 {
    let t = if t.is_finite() { t.max(MIN_TRANSIENT_TIME_S) } else { MIN_TRANSIENT_TIME_S };
    let d = diffusivity.max(0.0);
    ELECTRONS_PER_REACTION * FARADAY * area * concentration * (d / (std::f64::consts::PI * t)).sqrt()
}

/// Complex impedance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impedance {
    /// Ω
    pub real: f64,
    /// Ω
    pub imaginary: f64,
    /// Ω
    pub magnitude: f64,
    /// degrees, atan2(imag, real)
    pub phase_deg: f64,
}

/// Randles equivalent circuit with a semi-infinite Warburg element:
///
/// ```text
///        ┌── Cdl ──────────┐
/// ─ Rs ──┤                 ├──
///        └── Rct ── Zw ────┘      Zw = σ·ω^(-½)·(1 − j)
/// ```
pub fn randles_impedance(f: f64, rs: f64, rct: f64, cdl: f64, sigma: f64) -> Impedance {
    let f = if f.is_finite() { f.max(MIN_IMPEDANCE_FREQUENCY_HZ) } else { MIN_IMPEDANCE_FREQUENCY_HZ };
    let omega = 2.0 * std::f64::consts::PI * f;

    // Faradaic branch: Rct + Zw
    let w = sigma / omega.sqrt();
    let (a, b) = (rct + w, -w);

    // Parallel with Cdl: Zf / (1 + jωCdl·Zf)
    let wc = omega * cdl;
    let (dr, di) = (1.0 - wc * b, wc * a);
    let denom = dr * dr + di * di;
    let (pr, pi) = if denom > 0.0 {
        ((a * dr + b * di) / denom, (b * dr - a * di) / denom)
    } else {
        (a, b)
    };

    let real = rs + pr;
    let imaginary = pi;
    Impedance {
        real,
        imaginary,
        magnitude: real.hypot(imaginary),
        phase_deg: imaginary.atan2(real).to_degrees(),
    }
}

/// Faraday's law: molar rate (mol/s) for a current (A) and `n` electrons.
pub fn faraday_molar_rate(current: f64, electrons: f64) -> f64 {
    current / (electrons * FARADAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T298: f64 = 298.15;

    #[test]
    fn test_butler_volmer_zero_at_equilibrium() {
        let i = butler_volmer_current(0.5, 0.5, 1e-3, 0.5, T298).unwrap();
        assert_eq!(i, 0.0);
    }

    #[test]
    fn test_butler_volmer_odd_symmetry_at_half_alpha() {
        let up = butler_volmer_current(0.1, 0.0, 1e-3, 0.5, T298).unwrap();
        let down = butler_volmer_current(-0.1, 0.0, 1e-3, 0.5, T298).unwrap();
        assert!(up > 0.0);
        assert!((up + down).abs() < 1e-12 * up.abs().max(1.0));
    }

    #[test]
    fn test_butler_volmer_stable_at_two_volts() {
        for eta in [-2.0, 2.0] {
            for alpha in [0.0, 0.3, 0.5, 1.0] {
                let i = butler_volmer_current(eta, 0.0, 1.0, alpha, T298).unwrap();
                assert!(i.is_finite(), "eta={} alpha={}", eta, alpha);
            }
        }
    }

    #[test]
    fn test_butler_volmer_reports_overflow() {
        let r = butler_volmer_current(40.0, 0.0, 1.0, 0.5, T298);
        assert!(matches!(r, Err(NumericalError::Overflow { .. })));
        assert!(butler_volmer_current(0.1, 0.0, 1.0, 0.5, 0.0).is_err());
    }

    #[test]
    fn test_cottrell_finite_at_zero() {
        let i0 = cottrell_current(0.0, 1e-9, 10.0, 1e-4);
        assert!(i0.is_finite());
        assert!(i0 > 0.0);
        let later = cottrell_current(1.0, 1e-9, 10.0, 1e-4);
        assert!(later < i0);
        // 1/√t scaling
        let i4 = cottrell_current(4.0, 1e-9, 10.0, 1e-4);
        assert!((later / i4 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_randles_limits() {
        // High frequency: capacitor shorts the faradaic branch → Rs
        let z = randles_impedance(1e9, 10.0, 100.0, 1e-3, 0.0);
        assert!((z.real - 10.0).abs() < 1e-3);

        // No capacitance, no Warburg → Rs + Rct, zero phase
        let z = randles_impedance(1.0, 10.0, 100.0, 0.0, 0.0);
        assert!((z.real - 110.0).abs() < 1e-9);
        assert!(z.imaginary.abs() < 1e-12);
        assert!(z.phase_deg.abs() < 1e-9);

        // Capacitive behaviour → negative phase
        let z = randles_impedance(10.0, 10.0, 100.0, 1e-4, 5.0);
        assert!(z.imaginary < 0.0);
        assert!(z.phase_deg < 0.0);
        assert!((z.magnitude - z.real.hypot(z.imaginary)).abs() < 1e-12);
    }

    #[test]
    fn test_faraday_water_rate() {
        // 1 A forming water (n = 2) → 5.18 µmol/s
        let r = faraday_molar_rate(1.0, 2.0);
        assert!((r - 5.182e-6).abs() < 1e-8);
    }
}
