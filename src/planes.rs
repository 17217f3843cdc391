// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners.  Every
//! pixel of the output image becomes one starting point for the
//! Newton iteration.
use num::Complex;

use crate::error::RenderError;

/// Describes the width and height of an integral plane that is
/// assumed to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of the
/// Complex plane, treating the real part of each value as the
/// x-component and the imaginary part of each value as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

impl Default for ComplexPlane {
    /// The square [-1, 1] x [-1, 1].
    fn default() -> Self {
        ComplexPlane(Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0))
    }
}

/// Describes the x, y of a pixel in the image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of the image onto the complex plane.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The size of the image.
    pub integral_plane: IntegralPlane,
    /// The region of the complex plane the image covers.
    pub complex_plane: ComplexPlane,
}

impl PlaneMapper {
    /// Constructor.  Both planes must have a positive extent in each
    /// direction.
    pub fn new(
        width: usize,
        height: usize,
        complex_plane: ComplexPlane,
    ) -> Result<PlaneMapper, RenderError> {
        let ComplexPlane(leftlower, rightupper) = complex_plane;
        if width == 0 || height == 0 {
            return Err(RenderError::invalid(
                "size",
                format!("{}x{} has no pixels", width, height),
            ));
        }
        if !(leftlower.re < rightupper.re) {
            return Err(RenderError::invalid(
                "domain",
                "the left lower corner is not to the left of the right upper corner",
            ));
        }
        if !(leftlower.im < rightupper.im) {
            return Err(RenderError::invalid(
                "domain",
                "the left lower corner is not lower than the right upper corner",
            ));
        }

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane,
        })
    }

    /// The total number of pixels in the image.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Never true for a mapper built through `new`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The complex coordinate of column `x`.  For the default square
    /// this is `(x / width - 0.5) * 2`.
    #[inline]
    pub fn column_to_re(&self, x: usize) -> f64 {
        let ComplexPlane(ll, ru) = self.complex_plane;
        let t = (x as f64) / (self.integral_plane.0 as f64);
        (t - 0.5) * (ru.re - ll.re) + (ru.re + ll.re) * 0.5
    }

    /// The complex coordinate of row `y`.
    #[inline]
    pub fn row_to_im(&self, y: usize) -> f64 {
        let ComplexPlane(ll, ru) = self.complex_plane;
        let t = (y as f64) / (self.integral_plane.1 as f64);
        (t - 0.5) * (ru.im - ll.im) + (ru.im + ll.im) * 0.5
    }

    /// Given a pixel on the integral cartesian plane, map it to its
    /// starting point on the complex cartesian plane.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(self.column_to_re(pixel.0), self.row_to_im(pixel.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planemapper_fails_on_bad_shape() {
        let pm = PlaneMapper::new(
            4,
            4,
            ComplexPlane(Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0)),
        );
        assert!(pm.is_err());
        let pm = PlaneMapper::new(
            4,
            4,
            ComplexPlane(Complex::new(1.0, -1.0), Complex::new(-1.0, 1.0)),
        );
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_fails_on_empty_image() {
        assert!(PlaneMapper::new(0, 4, ComplexPlane::default()).is_err());
        assert!(PlaneMapper::new(4, 0, ComplexPlane::default()).is_err());
    }

    #[test]
    fn planemapper_passes_on_good_shape() {
        let pm = PlaneMapper::new(4, 3, ComplexPlane::default()).unwrap();
        assert_eq!(pm.len(), 12);
        assert!(!pm.is_empty());
    }

    #[test]
    fn default_domain_uses_the_centered_formula() {
        let pm = PlaneMapper::new(5, 4, ComplexPlane::default()).unwrap();
        for x in 0..5 {
            let expected = ((x as f64) / 5.0 - 0.5) * 2.0;
            assert_eq!(pm.column_to_re(x), expected);
        }
        for y in 0..4 {
            let expected = ((y as f64) / 4.0 - 0.5) * 2.0;
            assert_eq!(pm.row_to_im(y), expected);
        }
    }

    #[test]
    fn pixel_to_point_on_small_square() {
        let pm = PlaneMapper::new(2, 2, ComplexPlane::default()).unwrap();
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-1.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(1, 0)), Complex::new(0.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(1, 1)), Complex::new(0.0, 0.0));
    }

    #[test]
    fn pixel_to_point_on_shifted_planes() {
        let pm = PlaneMapper::new(
            4,
            4,
            ComplexPlane(Complex::new(0.0, 0.0), Complex::new(4.0, 8.0)),
        )
        .unwrap();
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 4.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 1)), Complex::new(3.0, 2.0));
    }
}
