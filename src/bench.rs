// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Repeats a render to time it.  Root generation and frame
//! allocation happen once, outside the timed region; each timed run
//! is one full dispatch over the frame.  A checksum folded over the
//! runs' frames makes it easy to confirm that two executors drew the
//! same image.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::dispatch::Dispatcher;
use crate::error::RenderError;
use crate::frame::FrameBuffer;
use crate::render::{RenderParams, Renderer};

const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

/// Column names of the CSV report, in order.
pub const CSV_HEADER: &str = "width,height,power,max_iterations,min_step_squared,runs,warmup,\
                              checksum,min_ms,mean_ms,median_ms,stddev_ms,throughput_mpix_s";

/// How many times to render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkConfig {
    /// Timed runs; at least one.
    pub runs: usize,
    /// Untimed runs before the timed ones.
    pub warmup: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig { runs: 10, warmup: 1 }
    }
}

/// Summary of the timed runs.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BenchmarkStats {
    /// Fastest run.
    pub min_ms: f64,
    /// Average run.
    pub mean_ms: f64,
    /// Middle run, or the mean of the middle two.
    pub median_ms: f64,
    /// Population standard deviation.
    pub stddev_ms: f64,
    /// Megapixels per second at the mean duration.
    pub throughput_mpix_s: f64,
}

impl BenchmarkStats {
    /// Derives the statistics from per-run durations in milliseconds.
    pub fn from_durations(ms: &[f64], pixels: usize) -> BenchmarkStats {
        if ms.is_empty() {
            return BenchmarkStats::default();
        }
        let n = ms.len() as f64;
        let min_ms = ms.iter().cloned().fold(std::f64::INFINITY, f64::min);
        let mean_ms = ms.iter().sum::<f64>() / n;

        let mut sorted = ms.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        let median_ms = if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            0.5 * (sorted[mid - 1] + sorted[mid])
        };

        let variance = ms.iter().map(|v| (v - mean_ms) * (v - mean_ms)).sum::<f64>() / n;
        let throughput_mpix_s = if mean_ms > 0.0 {
            (pixels as f64 / 1e6) / (mean_ms / 1000.0)
        } else {
            0.0
        };

        BenchmarkStats {
            min_ms,
            mean_ms,
            median_ms,
            stddev_ms: variance.sqrt(),
            throughput_mpix_s,
        }
    }
}

/// Folds one run's frame hash into the running checksum.
#[inline]
pub fn combine_checksum(checksum: u64, frame_hash: u64, run: u64) -> u64 {
    checksum
        ^ frame_hash
            .wrapping_add(GOLDEN)
            .wrapping_add(run)
            .wrapping_add(checksum << 6)
            .wrapping_add(checksum >> 2)
}

/// One benchmark invocation: what was rendered, how often, and how
/// fast.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkReport {
    /// The rendered parameters.
    pub params: RenderParams,
    /// Timed runs.
    pub runs: usize,
    /// Untimed runs.
    pub warmup: usize,
    /// Checksum over every timed run's frame.
    pub checksum: u64,
    /// Timing summary.
    pub stats: BenchmarkStats,
}

impl BenchmarkReport {
    /// The report as one CSV line, without a trailing newline.
    pub fn csv_record(&self) -> String {
        let p = &self.params;
        let s = &self.stats;
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            p.width,
            p.height,
            p.power,
            p.max_iterations,
            p.min_step_squared,
            self.runs,
            self.warmup,
            self.checksum,
            s.min_ms,
            s.mean_ms,
            s.median_ms,
            s.stddev_ms,
            s.throughput_mpix_s
        )
    }

    /// Appends the record to a CSV file, writing the header first if
    /// the file is new or empty.
    pub fn append_csv(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{}", CSV_HEADER)?;
        }
        writeln!(file, "{}", self.csv_record())
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let p = &self.params;
        let s = &self.stats;
        writeln!(
            f,
            "Benchmark results ({} runs, warmup={})",
            self.runs, self.warmup
        )?;
        writeln!(
            f,
            "  Size: {}x{}  Pixels: {}",
            p.width,
            p.height,
            p.pixels()
        )?;
        writeln!(
            f,
            "  Power: {}  MaxIter: {}  MinStep2: {:e}",
            p.power, p.max_iterations, p.min_step_squared
        )?;
        writeln!(f, "  min:      {:.3} ms", s.min_ms)?;
        writeln!(f, "  mean:     {:.3} ms", s.mean_ms)?;
        writeln!(f, "  median:   {:.3} ms", s.median_ms)?;
        writeln!(f, "  stddev:   {:.3} ms", s.stddev_ms)?;
        writeln!(f, "  thruput:  {:.3} MPix/s", s.throughput_mpix_s)?;
        write!(f, "  checksum: {:#x}", self.checksum)
    }
}

/// Runs `config.warmup` untimed and `config.runs` timed renders.
/// Returns the report and the frame of the last run.
pub fn run_benchmark<D: Dispatcher>(
    renderer: &Renderer,
    dispatcher: &D,
    config: BenchmarkConfig,
) -> Result<(BenchmarkReport, FrameBuffer), RenderError> {
    if config.runs < 1 {
        return Err(RenderError::invalid("runs", "must be at least 1"));
    }
    let params = *renderer.params();
    let mut frame = FrameBuffer::new(params.width, params.height)?;

    for w in 0..config.warmup {
        debug!("warmup {}/{}", w + 1, config.warmup);
        renderer.render_into(&mut frame, dispatcher)?;
    }

    let mut durations = Vec::with_capacity(config.runs);
    let mut checksum = 0u64;
    for r in 0..config.runs {
        let start = Instant::now();
        renderer.render_into(&mut frame, dispatcher)?;
        let elapsed = start.elapsed();
        let ms = elapsed.as_secs() as f64 * 1e3 + f64::from(elapsed.subsec_nanos()) / 1e6;
        debug!("run {}/{}: {:.3} ms", r + 1, config.runs, ms);
        durations.push(ms);
        checksum = combine_checksum(checksum, frame.fnv1a(), r as u64);
    }

    let stats = BenchmarkStats::from_durations(&durations, params.pixels());
    info!(
        "{} runs on {} threads: mean {:.3} ms, {:.3} MPix/s",
        config.runs,
        dispatcher.thread_count(),
        stats.mean_ms,
        stats.throughput_mpix_s
    );

    Ok((
        BenchmarkReport {
            params,
            runs: config.runs,
            warmup: config.warmup,
            checksum,
            stats,
        },
        frame,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Parallel, Sequential};
    use crate::render::RenderOptions;

    fn renderer() -> Renderer {
        let params = RenderParams {
            power: 3,
            width: 24,
            height: 20,
            max_iterations: 30,
            min_step_squared: 1e-6,
        };
        Renderer::new(params, RenderOptions::default()).unwrap()
    }

    #[test]
    fn stats_of_an_odd_sample() {
        let s = BenchmarkStats::from_durations(&[4.0, 1.0, 3.0], 3_000_000);
        assert_eq!(s.min_ms, 1.0);
        assert!((s.mean_ms - 8.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.median_ms, 3.0);
        let var = ((4.0f64 - 8.0 / 3.0).powi(2)
            + (1.0f64 - 8.0 / 3.0).powi(2)
            + (3.0f64 - 8.0 / 3.0).powi(2))
            / 3.0;
        assert!((s.stddev_ms - var.sqrt()).abs() < 1e-12);
        assert!((s.throughput_mpix_s - 3.0 / (8.0 / 3.0 / 1000.0)).abs() < 1e-9);
    }

    #[test]
    fn stats_of_an_even_sample() {
        let s = BenchmarkStats::from_durations(&[2.0, 8.0, 4.0, 6.0], 1);
        assert_eq!(s.median_ms, 5.0);
        assert_eq!(s.mean_ms, 5.0);
        assert_eq!(s.min_ms, 2.0);
        assert!((s.stddev_ms - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_samples_are_all_zero() {
        assert_eq!(
            BenchmarkStats::from_durations(&[], 100),
            BenchmarkStats::default()
        );
    }

    #[test]
    fn checksum_depends_on_run_index() {
        let a = combine_checksum(combine_checksum(0, 11, 0), 22, 1);
        let b = combine_checksum(combine_checksum(0, 11, 0), 22, 2);
        assert_ne!(a, b);
        assert_eq!(a, combine_checksum(combine_checksum(0, 11, 0), 22, 1));
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let r = renderer();
        let config = BenchmarkConfig { runs: 3, warmup: 1 };
        let (seq, seq_frame) = run_benchmark(&r, &Sequential, config).unwrap();
        let (par, par_frame) = run_benchmark(&r, &Parallel::new(4).unwrap(), config).unwrap();
        assert_eq!(seq.checksum, par.checksum);
        assert_eq!(seq_frame, par_frame);
        assert_eq!(seq.runs, 3);
        assert_eq!(seq.warmup, 1);
        assert!(seq.stats.min_ms <= seq.stats.mean_ms);
    }

    #[test]
    fn zero_runs_is_rejected() {
        let config = BenchmarkConfig { runs: 0, warmup: 0 };
        assert!(run_benchmark(&renderer(), &Sequential, config).is_err());
    }

    #[test]
    fn csv_has_every_column() {
        let report = BenchmarkReport {
            params: *renderer().params(),
            runs: 2,
            warmup: 1,
            checksum: 42,
            stats: BenchmarkStats {
                min_ms: 1.0,
                mean_ms: 1.5,
                median_ms: 1.5,
                stddev_ms: 0.5,
                throughput_mpix_s: 0.32,
            },
        };
        let header: Vec<&str> = CSV_HEADER.split(',').collect();
        let record = report.csv_record();
        let fields: Vec<&str> = record.split(',').collect();
        assert_eq!(header.len(), 13);
        assert_eq!(fields.len(), header.len());
        assert_eq!(record, "24,20,3,30,0.000001,2,1,42,1,1.5,1.5,0.5,0.32");
        assert!(report.to_string().contains("checksum: 0x2a"));
    }
}
