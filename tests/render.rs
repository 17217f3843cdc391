extern crate newtonfractal;
extern crate num;
extern crate rand;
extern crate tempfile;

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;

use num::Complex;
use rand::{Rng, SeedableRng};

use newtonfractal::encode::{read_ppm, save, write_ppm, Format};
use newtonfractal::palette::{Rgb, Shading};
use newtonfractal::roots::RootSet;
use newtonfractal::solver::{ConvergenceCheck, Newton};
use newtonfractal::{
    render, render_with, Executor, FrameBuffer, Parallel, RenderOptions, RenderParams, Sequential,
};

fn dominant(rgb: Rgb) -> Option<usize> {
    let Rgb(r, g, b) = rgb;
    if r == 0 && g == 0 && b == 0 {
        None
    } else if r >= g && r >= b {
        Some(0)
    } else if g >= b {
        Some(1)
    } else {
        Some(2)
    }
}

fn classes(frame: &FrameBuffer) -> HashSet<Option<usize>> {
    let mut found = HashSet::new();
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            found.insert(dominant(frame.pixel(x, y)));
        }
    }
    found
}

#[test]
fn five_by_five_cubic_shows_every_root() {
    let frame = render(3, 5, 5, 50, 1e-4).unwrap();
    assert_eq!(frame.width(), 5);
    assert_eq!(frame.height(), 5);
    assert_eq!(frame.red.len(), 25);
    assert_eq!(frame.green.len(), 25);
    assert_eq!(frame.blue.len(), 25);

    let found = classes(&frame);
    assert!(found.contains(&Some(0)), "no pixel reached the real root");
    assert!(found.contains(&Some(1)), "no pixel reached the upper root");
    assert!(found.contains(&Some(2)), "no pixel reached the lower root");
}

#[test]
fn rendering_twice_is_identical() {
    let a = render(5, 40, 30, 25, 1e-6).unwrap();
    let b = render(5, 40, 30, 25, 1e-6).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fnv1a(), b.fnv1a());
}

#[test]
fn worker_count_does_not_change_the_image() {
    let params = RenderParams {
        power: 4,
        width: 64,
        height: 48,
        max_iterations: 25,
        min_step_squared: 1e-6,
    };
    let reference = render_with(params, RenderOptions::default(), &Sequential).unwrap();
    for &threads in &[1usize, 2, 3, 8] {
        let executor = Executor::with_threads(threads).unwrap();
        let frame = render_with(params, RenderOptions::default(), &executor).unwrap();
        assert_eq!(frame.fnv1a(), reference.fnv1a(), "{} threads", threads);
        assert_eq!(frame, reference, "{} threads", threads);
    }
    let all = render_with(params, RenderOptions::default(), &Parallel::all_cores()).unwrap();
    assert_eq!(all, reference);
}

#[test]
fn degree_one_is_all_one_basin() {
    let options = RenderOptions {
        shading: Shading::Flat,
        ..RenderOptions::default()
    };
    let params = RenderParams {
        power: 1,
        width: 9,
        height: 7,
        ..RenderParams::default()
    };
    let frame = render_with(params, options, &Sequential).unwrap();
    for y in 0..7 {
        for x in 0..9 {
            assert_eq!(frame.pixel(x, y), Rgb(255, 0, 0), "pixel {},{}", x, y);
        }
    }
}

#[test]
fn two_by_two_quadratic() {
    // The pixel grid samples re and im at -1 and 0.  The left column
    // lies in the basin of -1; the right column sits on the imaginary
    // axis, where Newton's method for z^2 - 1 never settles.
    let options = RenderOptions {
        shading: Shading::Flat,
        ..RenderOptions::default()
    };
    let params = RenderParams {
        power: 2,
        width: 2,
        height: 2,
        ..RenderParams::default()
    };
    let frame = render_with(params, options, &Sequential).unwrap();
    for y in 0..2 {
        assert_eq!(frame.pixel(0, y), Rgb(0, 255, 0));
        assert_eq!(frame.pixel(1, y), Rgb(0, 0, 0));
    }
}

#[test]
fn quadratic_quadrant_centers_converge() {
    let roots = RootSet::new(2);
    for &check in &[ConvergenceCheck::EveryStep, ConvergenceCheck::AfterLoop] {
        let newton = Newton::new(roots.clone(), 25, 1e-6, check);
        for &(re, im) in &[(0.5, 0.5), (-0.5, 0.5), (-0.5, -0.5), (0.5, -0.5)] {
            let class = newton.classify(Complex::new(re, im));
            let expected = if re > 0.0 { 0 } else { 1 };
            assert_eq!(class.root, Some(expected), "({}, {}) {:?}", re, im, check);
        }
    }
}

#[test]
fn points_near_a_root_converge_to_it() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let degree = rng.gen_range(1, 24);
        let roots = RootSet::new(degree);
        let newton = Newton::new(roots.clone(), 25, 1e-6, ConvergenceCheck::EveryStep);
        let k = rng.gen_range(0, degree);
        let offset = Complex::new(rng.gen_range(-3e-4, 3e-4), rng.gen_range(-3e-4, 3e-4));
        let class = newton.classify(roots[k] + offset);
        assert_eq!(class.root, Some(k), "degree {} root {}", degree, k);
        assert_eq!(class.iterations, 0);
    }
}

#[test]
fn roots_are_on_the_unit_circle_and_solve_the_polynomial() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let degree = rng.gen_range(1, 200);
        let roots = RootSet::new(degree);
        assert_eq!(roots.len(), degree);
        for root in roots.iter() {
            assert!((root.norm() - 1.0).abs() < 1e-12);
            let z = newtonfractal::complex::power(*root, degree as u32);
            assert!((z - Complex::new(1.0, 0.0)).norm() < 1e-9);
        }
    }
}

#[test]
fn ppm_survives_the_filesystem() {
    let frame = render(3, 33, 21, 25, 1e-6).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newton.ppm");
    save(&frame, &path, Format::Ppm).unwrap();

    let back = read_ppm(File::open(&path).unwrap()).unwrap();
    assert_eq!(back.red, frame.red);
    assert_eq!(back.green, frame.green);
    assert_eq!(back.blue, frame.blue);

    let mut written = vec![];
    File::open(&path)
        .unwrap()
        .read_to_end(&mut written)
        .unwrap();
    let mut direct = vec![];
    write_ppm(&frame, &mut direct).unwrap();
    assert_eq!(written, direct);
}

#[test]
fn truncated_ppm_is_rejected() {
    let frame = render(3, 8, 8, 25, 1e-6).unwrap();
    let mut bytes = vec![];
    write_ppm(&frame, &mut bytes).unwrap();
    bytes.truncate(bytes.len() - 10);
    assert!(read_ppm(&bytes[..]).is_err());
}
