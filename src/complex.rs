// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The handful of complex operations the Newton step needs.  These
//! are spelled out rather than delegated to `num`'s operator traits
//! so that the arithmetic, and therefore the rounding, is identical
//! no matter which thread evaluates a point.

use num::Complex;

/// Standard complex product.
#[inline]
pub fn multiply(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re)
}

/// Negates the imaginary part.
#[inline]
pub fn conjugate(a: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re, -a.im)
}

/// `a / b`, computed as `a * conj(b) / |b|^2`.  Returns `None` when
/// `b` is zero rather than producing infinities.
#[inline]
pub fn divide(a: Complex<f64>, b: Complex<f64>) -> Option<Complex<f64>> {
    let len = b.norm_sqr();
    if len == 0.0 {
        return None;
    }
    let t = multiply(a, conjugate(b));
    Some(Complex::new(t.re / len, t.im / len))
}

/// Raises `base` to a non-negative integral power by repeated
/// squaring, so the cost is logarithmic in `exp`.
#[inline]
pub fn power(mut base: Complex<f64>, mut exp: u32) -> Complex<f64> {
    let mut result = Complex::new(1.0, 0.0);
    while exp > 0 {
        if exp & 1 == 1 {
            result = multiply(result, base);
        }
        exp >>= 1;
        if exp > 0 {
            base = multiply(base, base);
        }
    }
    result
}

/// Squared euclidean distance between two points on the plane.
#[inline]
pub fn dist(i: Complex<f64>, j: Complex<f64>) -> f64 {
    (i.im - j.im) * (i.im - j.im) + (i.re - j.re) * (i.re - j.re)
}
