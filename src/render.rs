// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Assembles a frame: validates the parameters, builds the root set
//! once, splits the frame into bands of rows, and has a dispatcher
//! run the solver and the palette over every band.

use itertools::iproduct;
use log::{debug, trace};
use num::Complex;

use crate::dispatch::{Dispatcher, Sequential};
use crate::error::RenderError;
use crate::frame::{Band, FrameBuffer};
use crate::palette::{Palette, Shading};
use crate::planes::{ComplexPlane, Pixel, PlaneMapper};
use crate::roots::RootSet;
use crate::solver::{Classification, ConvergenceCheck, Newton};

/// The largest polynomial degree accepted.
pub const MAX_POWER: usize = 32_767;

/// What to render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderParams {
    /// Degree n of z^n - 1.
    pub power: usize,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Newton step budget per pixel.
    pub max_iterations: u32,
    /// Squared distance to a root below which a point has converged.
    pub min_step_squared: f64,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            power: 3,
            width: 10_000,
            height: 10_000,
            max_iterations: 25,
            min_step_squared: 1e-6,
        }
    }
}

impl RenderParams {
    /// Rejects anything the solver cannot run with.  Values are never
    /// clamped.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.power < 1 {
            return Err(RenderError::invalid("power", "must be at least 1"));
        }
        if self.power > MAX_POWER {
            return Err(RenderError::invalid(
                "power",
                format!("must be at most {}", MAX_POWER),
            ));
        }
        if self.width < 1 {
            return Err(RenderError::invalid("width", "must be at least 1"));
        }
        if self.height < 1 {
            return Err(RenderError::invalid("height", "must be at least 1"));
        }
        if self.max_iterations < 1 {
            return Err(RenderError::invalid("max_iterations", "must be at least 1"));
        }
        if self.max_iterations == u32::max_value() {
            return Err(RenderError::invalid(
                "max_iterations",
                format!("must be below {}", u32::max_value()),
            ));
        }
        if !(self.min_step_squared > 0.0) || !self.min_step_squared.is_finite() {
            return Err(RenderError::invalid(
                "min_step_squared",
                format!("must be positive and finite, got {}", self.min_step_squared),
            ));
        }
        Ok(())
    }

    /// Number of pixels in the frame.
    pub fn pixels(&self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

/// How to render.  The defaults reproduce the classic image.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Colors for the roots; `None` picks the default palette,
    /// extended as far as the degree needs.
    pub palette: Option<Palette>,
    /// Whether brightness tracks convergence speed.
    pub shading: Shading,
    /// When the solver looks for a nearby root.
    pub check: ConvergenceCheck,
    /// The region of the complex plane to draw.
    pub domain: ComplexPlane,
    /// Rows in each unit of work handed to the dispatcher.
    pub rows_per_task: usize,
    /// Alignment, in bytes, of each unit's scratch coordinates.
    pub scratch_alignment: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            palette: None,
            shading: Shading::default(),
            check: ConvergenceCheck::default(),
            domain: ComplexPlane::default(),
            rows_per_task: 1,
            scratch_alignment: 64,
        }
    }
}

/// A validated, ready-to-run render.  Building one computes the root
/// set; rendering it any number of times reuses it.
#[derive(Clone, Debug)]
pub struct Renderer {
    params: RenderParams,
    mapper: PlaneMapper,
    newton: Newton,
    palette: Palette,
    shading: Shading,
    rows_per_task: usize,
    scratch_alignment: usize,
}

impl Renderer {
    /// Validates everything up front, so that nothing after this
    /// point needs to.
    pub fn new(params: RenderParams, options: RenderOptions) -> Result<Renderer, RenderError> {
        params.validate()?;
        if options.rows_per_task < 1 {
            return Err(RenderError::invalid("rows_per_task", "must be at least 1"));
        }
        if !options.scratch_alignment.is_power_of_two() {
            return Err(RenderError::invalid(
                "scratch_alignment",
                format!("{} is not a power of two", options.scratch_alignment),
            ));
        }
        let mapper = PlaneMapper::new(params.width, params.height, options.domain)?;
        let palette = options
            .palette
            .unwrap_or_else(|| Palette::for_degree(params.power));
        palette.check_degree(params.power)?;

        let roots = RootSet::new(params.power);
        debug!(
            "renderer ready: {}x{}, power {}, {} iterations, threshold {:e}, {:?}",
            params.width,
            params.height,
            params.power,
            params.max_iterations,
            params.min_step_squared,
            options.check
        );

        Ok(Renderer {
            params,
            mapper,
            newton: Newton::new(
                roots,
                params.max_iterations,
                params.min_step_squared,
                options.check,
            ),
            palette,
            shading: options.shading,
            rows_per_task: options.rows_per_task,
            scratch_alignment: options.scratch_alignment,
        })
    }

    /// The parameters this renderer was built with.
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// The shared root set.
    pub fn roots(&self) -> &RootSet {
        self.newton.roots()
    }

    /// Classifies a single pixel without touching any frame.
    pub fn classify_pixel(&self, x: usize, y: usize) -> Classification {
        self.newton.classify(self.mapper.pixel_to_point(&Pixel(x, y)))
    }

    /// Renders into a newly allocated frame.
    pub fn render<D: Dispatcher>(&self, dispatcher: &D) -> Result<FrameBuffer, RenderError> {
        let mut frame = FrameBuffer::new(self.params.width, self.params.height)?;
        self.render_into(&mut frame, dispatcher)?;
        Ok(frame)
    }

    /// Renders into an existing frame of the right size, overwriting
    /// every pixel.
    pub fn render_into<D: Dispatcher>(
        &self,
        frame: &mut FrameBuffer,
        dispatcher: &D,
    ) -> Result<(), RenderError> {
        if frame.width() != self.params.width || frame.height() != self.params.height {
            return Err(RenderError::invalid(
                "frame",
                format!(
                    "is {}x{}, expected {}x{}",
                    frame.width(),
                    frame.height(),
                    self.params.width,
                    self.params.height
                ),
            ));
        }
        if !frame.planes_intact() {
            return Err(RenderError::invalid(
                "frame",
                format!(
                    "planes hold {}, {} and {} bytes, expected {}",
                    frame.red.len(),
                    frame.green.len(),
                    frame.blue.len(),
                    frame.len()
                ),
            ));
        }
        let bands = frame.bands(self.rows_per_task);
        dispatcher.dispatch(bands, |ctx, band| {
            trace!(
                "band {}/{} (row {}) on thread {}/{}",
                ctx.task_index,
                ctx.task_count,
                band.first_row(),
                ctx.thread_index,
                ctx.thread_count
            );
            self.fill_band(band, dispatcher)
        })
    }

    fn fill_band<D: Dispatcher>(&self, mut band: Band, dispatcher: &D) -> Result<(), RenderError> {
        let width = band.width();
        let rows = band.rows();

        // Column coordinates first, then one imaginary part per row.
        let mut coords = dispatcher.alloc_scratch(width + rows, self.scratch_alignment)?;
        for (x, re) in coords[..width].iter_mut().enumerate() {
            *re = self.mapper.column_to_re(x);
        }
        for (row, im) in coords[width..].iter_mut().enumerate() {
            *im = self.mapper.row_to_im(band.first_row() + row);
        }

        let max_iterations = self.params.max_iterations;
        for (row, x) in iproduct!(0..rows, 0..width) {
            let z0 = Complex::new(coords[x], coords[width + row]);
            let class = self.newton.classify(z0);
            band.put(x, row, self.palette.color(&class, self.shading, max_iterations));
        }
        Ok(())
    }
}

/// Renders with the default options on the calling thread.
pub fn render(
    power: usize,
    width: usize,
    height: usize,
    max_iterations: u32,
    min_step_squared: f64,
) -> Result<FrameBuffer, RenderError> {
    let params = RenderParams {
        power,
        width,
        height,
        max_iterations,
        min_step_squared,
    };
    render_with(params, RenderOptions::default(), &Sequential)
}

/// Renders with explicit options and executor.
pub fn render_with<D: Dispatcher>(
    params: RenderParams,
    options: RenderOptions,
    dispatcher: &D,
) -> Result<FrameBuffer, RenderError> {
    Renderer::new(params, options)?.render(dispatcher)
}
