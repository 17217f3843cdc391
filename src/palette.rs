// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns classifications into colors.  Index 0 of a palette is the
//! color of points that never reached a root; index `i + 1` is the
//! color of root `i`.

use num::clamp;

use crate::error::RenderError;
use crate::solver::Classification;

/// An 8-bit RGB triple.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

const BASE_COLORS: [Rgb; 9] = [
    Rgb(0, 0, 0),       // black
    Rgb(255, 0, 0),     // red
    Rgb(0, 255, 0),     // green
    Rgb(0, 0, 255),     // blue
    Rgb(255, 255, 0),   // yellow
    Rgb(255, 165, 0),   // orange
    Rgb(128, 0, 128),   // purple
    Rgb(0, 255, 255),   // cyan
    Rgb(255, 192, 203), // pink
];

/// How the iteration count affects brightness.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shading {
    /// Every point of a basin gets the root's full color.
    Flat,
    /// Points that converge quickly are brighter.  Brightness falls
    /// linearly from 1.0 at zero iterations towards 0.25 at the full
    /// budget.
    ConvergenceSpeed,
}

impl Default for Shading {
    fn default() -> Self {
        Shading::ConvergenceSpeed
    }
}

/// Maps classification indices to colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: BASE_COLORS.to_vec(),
        }
    }
}

impl Palette {
    /// A palette from explicit colors; `colors[0]` is the
    /// non-converged color.
    pub fn new(colors: Vec<Rgb>) -> Result<Palette, RenderError> {
        if colors.is_empty() {
            return Err(RenderError::invalid(
                "palette",
                "needs at least the non-converged color",
            ));
        }
        Ok(Palette { colors })
    }

    /// The default palette, extended with generated hues until it can
    /// color every root of a polynomial of the given degree.
    pub fn for_degree(degree: usize) -> Palette {
        let mut colors = BASE_COLORS.to_vec();
        let extra = (degree + 1).saturating_sub(colors.len());
        colors.extend((0..extra).map(generated_hue));
        Palette { colors }
    }

    /// Number of entries including the non-converged color.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true; a palette always holds the non-converged color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The color of points that did not converge.
    pub fn non_converged(&self) -> Rgb {
        self.colors[0]
    }

    /// Fails unless every root of a degree-`degree` polynomial has a
    /// color.
    pub fn check_degree(&self, degree: usize) -> Result<(), RenderError> {
        if self.colors.len() < degree + 1 {
            return Err(RenderError::PaletteTooSmall {
                entries: self.colors.len(),
                degree,
            });
        }
        Ok(())
    }

    /// The color for one classification.  `max_iterations` is the
    /// run's budget and only matters for speed shading.
    #[inline]
    pub fn color(&self, c: &Classification, shading: Shading, max_iterations: u32) -> Rgb {
        let base = self.colors[c.palette_index()];
        match (shading, c.root) {
            (Shading::Flat, _) | (_, None) => base,
            (Shading::ConvergenceSpeed, Some(_)) => {
                dim(base, brightness(c.iterations, max_iterations))
            }
        }
    }
}

/// Monotone in `iterations`, always within [0.25, 1].
#[inline]
pub fn brightness(iterations: u32, max_iterations: u32) -> f32 {
    let t = clamp(
        (iterations as f32) / ((max_iterations as f32) + 1.0),
        0.0,
        1.0,
    );
    1.0 - 0.75 * t
}

#[inline]
fn dim(color: Rgb, brightness: f32) -> Rgb {
    let b = clamp(brightness, 0.0, 1.0);
    Rgb(
        (f32::from(color.0) * b) as u8,
        (f32::from(color.1) * b) as u8,
        (f32::from(color.2) * b) as u8,
    )
}

// Steps around the hue circle by the golden angle.
fn generated_hue(i: usize) -> Rgb {
    let hue = ((i as f64) * 137.507_764_05).rem_euclid(360.0);
    hsv_to_rgb(hue, 0.85, 0.95)
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    let byte = |v: f64| clamp(((v + m) * 255.0).round(), 0.0, 255.0) as u8;
    Rgb(byte(r), byte(g), byte(b))
}
