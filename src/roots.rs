// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The roots of unity are the answer key for the solver: every
//! converged point is classified by whichever of them it lands on.
//! They're computed once per run and shared by every worker.

use std::f64::consts::PI;
use std::ops::Index;
use std::sync::Arc;

use num::Complex;

use crate::complex::dist;

/// The n complex solutions of z^n = 1, in order of increasing angle
/// starting from 1 + 0i.  Cloning a RootSet shares the underlying
/// storage.
#[derive(Clone, Debug, PartialEq)]
pub struct RootSet {
    roots: Arc<[Complex<f64>]>,
}

impl RootSet {
    /// Computes root `i` as `(cos(2πi/n), sin(2πi/n))`.  A degree of
    /// zero produces an empty set; callers validate the degree first.
    pub fn new(degree: usize) -> RootSet {
        let roots: Vec<Complex<f64>> = (0..degree)
            .map(|i| {
                let angle = 2.0 * PI * (i as f64) / (degree as f64);
                Complex::new(angle.cos(), angle.sin())
            })
            .collect();
        RootSet {
            roots: roots.into(),
        }
    }

    /// The degree of the polynomial these are the roots of.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// True only for the degenerate degree-zero set.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterates the roots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Complex<f64>> {
        self.roots.iter()
    }

    /// Returns the index of the root closest to `z` and the squared
    /// distance to it.  Ties go to the lowest index.
    pub fn nearest(&self, z: Complex<f64>) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, root) in self.roots.iter().enumerate() {
            let d = dist(*root, z);
            match best {
                Some((_, min)) if d >= min => {}
                _ => best = Some((i, d)),
            }
        }
        best
    }
}

impl Index<usize> for RootSet {
    type Output = Complex<f64>;

    fn index(&self, i: usize) -> &Complex<f64> {
        &self.roots[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_lie_on_the_unit_circle_at_even_angles() {
        for n in 1..=32 {
            let roots = RootSet::new(n);
            assert_eq!(roots.len(), n);
            for (i, r) in roots.iter().enumerate() {
                assert!((r.norm_sqr() - 1.0).abs() < 1e-12);
                let expected = 2.0 * PI * (i as f64) / (n as f64);
                let delta = (r.arg() - expected).rem_euclid(2.0 * PI);
                assert!(delta < 1e-9 || (2.0 * PI - delta) < 1e-9);
            }
        }
    }

    #[test]
    fn roots_are_pairwise_distinct() {
        for n in 2..=24 {
            let roots = RootSet::new(n);
            for i in 0..n {
                for j in (i + 1)..n {
                    assert!(dist(roots[i], roots[j]) > 1e-6, "n={} i={} j={}", n, i, j);
                }
            }
        }
    }

    #[test]
    fn first_root_is_one() {
        assert_eq!(RootSet::new(7)[0], Complex::new(1.0, 0.0));
    }

    #[test]
    fn nearest_prefers_the_lowest_index_on_ties() {
        let roots = RootSet::new(2);
        // The origin is equidistant from 1 and -1.
        let (i, d) = roots.nearest(Complex::new(0.0, 0.0)).unwrap();
        assert_eq!(i, 0);
        assert_eq!(d, 1.0);
    }

    #[test]
    fn nearest_finds_the_closest_root() {
        let roots = RootSet::new(4);
        assert_eq!(roots.nearest(Complex::new(0.1, 0.9)).unwrap().0, 1);
        assert_eq!(roots.nearest(Complex::new(-2.0, 0.1)).unwrap().0, 2);
        assert_eq!(roots.nearest(Complex::new(0.0, -0.7)).unwrap().0, 3);
        assert_eq!(RootSet::new(0).nearest(Complex::new(0.0, 0.0)), None);
    }

    #[test]
    fn clones_share_storage() {
        let a = RootSet::new(5);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.roots, &b.roots));
    }
}
