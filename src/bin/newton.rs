// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate log;
extern crate newtonfractal;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use log::{error, info};
use num::Complex;
use std::path::Path;
use std::str::FromStr;

use newtonfractal::bench::{run_benchmark, BenchmarkConfig};
use newtonfractal::encode::{save, Format};
use newtonfractal::palette::Shading;
use newtonfractal::planes::ComplexPlane;
use newtonfractal::solver::ConvergenceCheck;
use newtonfractal::{Dispatcher, Executor, RenderOptions, RenderParams, Renderer};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_positive_float(s: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(v) if v > 0.0 && v.is_finite() => Ok(()),
        Ok(_) => Err("Minimum step must be a positive number".to_string()),
        Err(_) => Err("Could not parse minimum step".to_string()),
    }
}

const POWER: &str = "power";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const MAX_ITER: &str = "max-iter";
const MIN_STEP: &str = "min-step";
const OUTPUT: &str = "output";
const PNG: &str = "png";
const PPM: &str = "ppm";
const THREADS: &str = "threads";
const ROWS_PER_TASK: &str = "rows-per-task";
const FLAT: &str = "flat";
const AFTER_LOOP: &str = "after-loop";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const BENCH: &str = "bench";
const WARMUP: &str = "warmup";
const CSV: &str = "csv";
const NO_WRITE: &str = "no-write";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("newton")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Newton fractal renderer for z^n - 1")
        .arg(
            Arg::with_name(POWER)
                .long(POWER)
                .short("p")
                .takes_value(true)
                .default_value("3")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        newtonfractal::render::MAX_POWER,
                        "Could not parse power",
                        "Power must be between 1 and 32767",
                    )
                })
                .help("Polynomial power (number of roots on the unit circle)"),
        )
        .arg(
            Arg::with_name(WIDTH)
                .long(WIDTH)
                .short("W")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        usize::max_value(),
                        "Could not parse width",
                        "Width must be at least 1",
                    )
                })
                .help("Image width in pixels"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .long(HEIGHT)
                .short("H")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        usize::max_value(),
                        "Could not parse height",
                        "Height must be at least 1",
                    )
                })
                .help("Image height in pixels"),
        )
        .arg(
            Arg::with_name(MAX_ITER)
                .long(MAX_ITER)
                .short("i")
                .takes_value(true)
                .default_value("25")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        65_535,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 65535",
                    )
                })
                .help("Maximum Newton iterations per pixel"),
        )
        .arg(
            Arg::with_name(MIN_STEP)
                .long(MIN_STEP)
                .short("m")
                .takes_value(true)
                .default_value("1e-6")
                .validator(|s| validate_positive_float(&s))
                .help("Convergence threshold (squared distance to a root)"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file [default: NEWTON.png or NEWTON.ppm]"),
        )
        .arg(
            Arg::with_name(PNG)
                .long(PNG)
                .conflicts_with(PPM)
                .help("Write PNG (default)"),
        )
        .arg(
            Arg::with_name(PPM)
                .long(PPM)
                .help("Write binary PPM (P6)"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver [default: all cores]"),
        )
        .arg(
            Arg::with_name(ROWS_PER_TASK)
                .long(ROWS_PER_TASK)
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        usize::max_value(),
                        "Could not parse rows per task",
                        "Rows per task must be at least 1",
                    )
                })
                .help("Image rows in each unit of work"),
        )
        .arg(
            Arg::with_name(FLAT)
                .long(FLAT)
                .help("Do not shade by convergence speed"),
        )
        .arg(
            Arg::with_name(AFTER_LOOP)
                .long(AFTER_LOOP)
                .help("Only look for a root after the full iteration budget"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .default_value("-1,-1")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the complex plane"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .default_value("1,1")
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the complex plane"),
        )
        .arg(
            Arg::with_name(BENCH)
                .long(BENCH)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        100_000,
                        "Could not parse benchmark run count",
                        "Benchmark runs must be between 1 and 100000",
                    )
                })
                .help("Enable benchmarking with this many timed runs"),
        )
        .arg(
            Arg::with_name(WARMUP)
                .long(WARMUP)
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        0usize,
                        1000,
                        "Could not parse warmup count",
                        "Warmup runs must be between 0 and 1000",
                    )
                })
                .help("Untimed runs before benchmarking"),
        )
        .arg(
            Arg::with_name(CSV)
                .long(CSV)
                .takes_value(true)
                .help("Append benchmark results to this CSV file"),
        )
        .arg(
            Arg::with_name(NO_WRITE)
                .long(NO_WRITE)
                .help("Skip writing the image"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> T {
    // Every value reaching here has been through its validator.
    match matches.value_of(name).map(T::from_str) {
        Some(Ok(v)) => v,
        _ => fail(&format!("Could not parse {}", name)),
    }
}

fn fail(message: &str) -> ! {
    error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}

fn main() {
    env_logger::init();
    let matches = args();

    let params = RenderParams {
        power: value(&matches, POWER),
        width: value(&matches, WIDTH),
        height: value(&matches, HEIGHT),
        max_iterations: value(&matches, MAX_ITER),
        min_step_squared: value(&matches, MIN_STEP),
    };
    let leftlower = matches
        .value_of(LEFTLOWER)
        .and_then(parse_complex)
        .unwrap_or_else(|| fail("Error parsing left lower point"));
    let rightupper = matches
        .value_of(RIGHTUPPER)
        .and_then(parse_complex)
        .unwrap_or_else(|| fail("Error parsing right upper point"));
    let options = RenderOptions {
        shading: if matches.is_present(FLAT) {
            Shading::Flat
        } else {
            Shading::ConvergenceSpeed
        },
        check: if matches.is_present(AFTER_LOOP) {
            ConvergenceCheck::AfterLoop
        } else {
            ConvergenceCheck::EveryStep
        },
        domain: ComplexPlane(leftlower, rightupper),
        rows_per_task: value(&matches, ROWS_PER_TASK),
        ..RenderOptions::default()
    };
    let format = if matches.is_present(PPM) {
        Format::Ppm
    } else {
        Format::Png
    };
    let output = matches
        .value_of(OUTPUT)
        .unwrap_or_else(|| format.default_filename())
        .to_string();

    let threads = if matches.is_present(THREADS) {
        value(&matches, THREADS)
    } else {
        num_cpus::get()
    };
    let executor = Executor::with_threads(threads)
        .unwrap_or_else(|e| fail(&format!("Render failure: {}", e)));
    let renderer = Renderer::new(params, options)
        .unwrap_or_else(|e| fail(&format!("Render failure: {}", e)));
    info!(
        "rendering {}x{} with power {} on {} threads",
        params.width,
        params.height,
        params.power,
        executor.thread_count()
    );

    let frame = if matches.is_present(BENCH) {
        let config = BenchmarkConfig {
            runs: value(&matches, BENCH),
            warmup: value(&matches, WARMUP),
        };
        let (report, frame) = run_benchmark(&renderer, &executor, config)
            .unwrap_or_else(|e| fail(&format!("Render failure: {}", e)));
        println!("{}", report);
        if let Some(csv) = matches.value_of(CSV) {
            if let Err(e) = report.append_csv(Path::new(csv)) {
                error!("could not append to {}: {}", csv, e);
                eprintln!("Warning: can't open CSV '{}' for append: {}", csv, e);
            }
        }
        frame
    } else {
        renderer
            .render(&executor)
            .unwrap_or_else(|e| fail(&format!("Render failure: {}", e)))
    };

    if matches.is_present(NO_WRITE) {
        return;
    }
    if let Err(e) = save(&frame, Path::new(&output), format) {
        fail(&format!("Write error: {}", e));
    }
    info!("wrote {}", output);
}
