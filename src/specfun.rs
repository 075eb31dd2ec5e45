//! Special functions used by the loss models: Kelvin functions, modified
//! Bessel functions of complex argument and complete elliptic integrals.

use crate::convert;
use num_complex::Complex64;

/// Bessel function of the first kind `J_nu(z)` for integer order, by its
/// ascending series. Accurate for the |z| ≲ 60 range the loss factors need.
#[must_use]
pub fn bessel_first_kind(order: u32, z: Complex64) -> Complex64 {
    let half = z / 2.0;
    let mut term = half.powu(order);
    for k in 1..=order {
        term /= convert::f64_from_usize(k as usize);
    }
    let mut sum = term;
    for k in 1..200 {
        let kf = f64::from(k);
        term *= -(half * half) / (kf * (kf + f64::from(order)));
        sum += term;
        if term.norm() < sum.norm() * 1e-16 {
            break;
        }
    }
    sum
}

/// Modified Bessel function of the first kind `I_nu(z)` for integer order,
/// by its ascending series.
#[must_use]
pub fn modified_bessel_first_kind(order: u32, z: Complex64) -> Complex64 {
    let half = z / 2.0;
    let mut term = half.powu(order);
    for k in 1..=order {
        term /= convert::f64_from_usize(k as usize);
    }
    let mut sum = term;
    for k in 1..200 {
        let kf = f64::from(k);
        term *= (half * half) / (kf * (kf + f64::from(order)));
        sum += term;
        if term.norm() < sum.norm() * 1e-16 {
            break;
        }
    }
    sum
}

/// Ratio `I_{nu+1}(z) / I_nu(z)` by the modified Lentz continued fraction,
/// stable for arguments far beyond the range where the individual functions
/// overflow.
#[must_use]
pub fn modified_bessel_ratio(order: u32, z: Complex64) -> Complex64 {
    // I_{nu+1}/I_nu = (z/2) / ((nu+1) + q/((nu+2) + q/(...))), q = (z/2)^2
    let tiny = Complex64::new(1e-30, 0.0);
    let q = z * z / 4.0;
    let nu = f64::from(order);
    let mut f = Complex64::new(nu + 1.0, 0.0);
    if f.norm() < 1e-30 {
        f = tiny;
    }
    let mut c = f;
    let mut d = Complex64::new(0.0, 0.0);
    for n in 1..200 {
        let b = Complex64::new(nu + 1.0 + f64::from(n), 0.0);
        d = b + q * d;
        if d.norm() < 1e-30 {
            d = tiny;
        }
        c = b + q / c;
        if c.norm() < 1e-30 {
            c = tiny;
        }
        d = 1.0 / d;
        let delta = c * d;
        f *= delta;
        if (delta - 1.0).norm() < 1e-15 {
            break;
        }
    }
    z / 2.0 / f
}

const KELVIN_PHASE: Complex64 = Complex64::new(-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2);

/// Kelvin function pair `ber_nu(x) + i bei_nu(x)`, via
/// `J_nu(x · e^{3πi/4})`.
#[must_use]
pub fn kelvin(order: u32, x: f64) -> Complex64 {
    bessel_first_kind(order, KELVIN_PHASE * x)
}

/// Real part `ber_nu(x)` of the Kelvin pair.
#[must_use]
pub fn kelvin_real(order: u32, x: f64) -> f64 {
    kelvin(order, x).re
}

/// Imaginary part `bei_nu(x)` of the Kelvin pair.
#[must_use]
pub fn kelvin_imaginary(order: u32, x: f64) -> f64 {
    kelvin(order, x).im
}

/// Derivative pair `ber'_nu(x) + i bei'_nu(x)`.
#[must_use]
pub fn kelvin_derivative(order: u32, x: f64) -> Complex64 {
    let z = KELVIN_PHASE * x;
    let jprime = if order == 0 {
        -bessel_first_kind(1, z)
    } else {
        (bessel_first_kind(order - 1, z) - bessel_first_kind(order + 1, z)) / 2.0
    };
    KELVIN_PHASE * jprime
}

/// Derivative `ber'_nu(x)`.
#[must_use]
pub fn kelvin_derivative_real(order: u32, x: f64) -> f64 {
    kelvin_derivative(order, x).re
}

/// Derivative `bei'_nu(x)`.
#[must_use]
pub fn kelvin_derivative_imaginary(order: u32, x: f64) -> f64 {
    kelvin_derivative(order, x).im
}

/// Complete elliptic integral of the first kind `K(k)`, with `k` the
/// modulus, by the arithmetic-geometric mean.
///
/// # Panics
///
/// Panics if `|k| >= 1`.
#[must_use]
pub fn complete_elliptic_integral_first_kind(k: f64) -> f64 {
    assert!(k.abs() < 1.0);
    let mut a = 1.0;
    let mut b = (1.0 - k * k).sqrt();
    while (a - b).abs() > 1e-15 * a {
        let an = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = an;
    }
    std::f64::consts::FRAC_PI_2 / a
}

/// Complete elliptic integral of the second kind `E(k)`, with `k` the
/// modulus.
///
/// # Panics
///
/// Panics if `|k| >= 1`.
#[must_use]
pub fn complete_elliptic_integral_second_kind(k: f64) -> f64 {
    assert!(k.abs() < 1.0);
    let mut a = 1.0;
    let mut b = (1.0 - k * k).sqrt();
    let mut c = k;
    let mut sum = 0.5 * c * c;
    let mut power = 1.0;
    while c.abs() > 1e-15 {
        let an = 0.5 * (a + b);
        c = 0.5 * (a - b);
        b = (a * b).sqrt();
        a = an;
        power *= 2.0;
        sum += 0.5 * power * c * c;
    }
    std::f64::consts::FRAC_PI_2 / a * (1.0 - sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn modified_bessel_small_arguments() {
        let i0 = modified_bessel_first_kind(0, Complex64::new(1.0, 0.0));
        let i1 = modified_bessel_first_kind(1, Complex64::new(1.0, 0.0));
        assert_approx_eq!(f64, i0.re, 1.2660658777520084, epsilon = 1e-12);
        assert_approx_eq!(f64, i1.re, 0.5651591039924851, epsilon = 1e-12);
    }

    #[test]
    fn bessel_ratio_matches_series() {
        let z = Complex64::new(3.0, 3.0);
        let direct = modified_bessel_first_kind(1, z) / modified_bessel_first_kind(0, z);
        let ratio = modified_bessel_ratio(0, z);
        assert_approx_eq!(f64, direct.re, ratio.re, epsilon = 1e-10);
        assert_approx_eq!(f64, direct.im, ratio.im, epsilon = 1e-10);
    }

    #[test]
    fn kelvin_reference_values() {
        assert_approx_eq!(f64, kelvin_real(0, 1.0), 0.9843817812130869, epsilon = 1e-10);
        assert_approx_eq!(f64, kelvin_imaginary(0, 1.0), 0.2495660400366597, epsilon = 1e-10);
        assert_approx_eq!(f64, kelvin_derivative_real(0, 1.0), -0.0624457521790309, epsilon = 1e-10);
        assert_approx_eq!(f64, kelvin_derivative_imaginary(0, 1.0), 0.4973965114680974, epsilon = 1e-10);
    }

    #[test]
    fn elliptic_integrals() {
        assert_approx_eq!(
            f64,
            complete_elliptic_integral_first_kind(0.0),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-14
        );
        assert_approx_eq!(f64, complete_elliptic_integral_first_kind(0.5), 1.6857503548125961, epsilon = 1e-12);
        assert_approx_eq!(f64, complete_elliptic_integral_second_kind(0.5), 1.4674622093394272, epsilon = 1e-12);
    }
}
