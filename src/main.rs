// Copyright 2020 TwoCookingMice

use silicon_sensor::core::photon::PhotonArray;
use silicon_sensor::core::rng::{RandomSource, UniformDeviate};
use silicon_sensor::core::sensor::Sensor;
use silicon_sensor::math::bitmap::Bitmap;
use silicon_sensor::math::constants::Float;
use silicon_sensor::sensors::silicon::{SiliconSensor, SiliconSettings};
use silicon_sensor::sensors::simple::SimpleSensor;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;

struct SpotStats {
    total: Float,
    peak: Float,
    sigma: Float,
}

fn spot_stats(image: &Bitmap) -> SpotStats {
    let total = image.sum();
    let mut mx = 0.0;
    let mut my = 0.0;
    for iy in image.y_min()..=image.y_max() {
        for ix in image.x_min()..=image.x_max() {
            let w = image.get(ix, iy);
            mx += w * ix as Float;
            my += w * iy as Float;
        }
    }
    mx /= total;
    my /= total;
    let mut second = 0.0;
    for iy in image.y_min()..=image.y_max() {
        for ix in image.x_min()..=image.x_max() {
            let (dx, dy) = (ix as Float - mx, iy as Float - my);
            second += image.get(ix, iy) * (dx * dx + dy * dy);
        }
    }
    SpotStats { total, peak: image.max(), sigma: (second / (2.0 * total)).sqrt() }
}

fn report(e: &dyn std::error::Error) {
    log::error!("{}", e);
    let mut current = e.source();
    while let Some(cause) = current {
        log::error!("Caused by: {}", cause);
        current = cause.source();
    }
}

fn gaussian_spot(count: usize, centre: Float, sigma: Float, rng: &mut dyn RandomSource) -> PhotonArray {
    let mut photons = PhotonArray::new();
    for _ in 0..count {
        photons.push(centre + sigma * rng.gaussian(), centre + sigma * rng.gaussian(), 1.0);
    }
    photons
}

fn main() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config> <vertex_file> [--photons N] [--batches N] [--sigma S] [--size N] \
                   [--num-elec N] [--diff-mult F] [--qdist N] [--nrecalc N] [--seed N] [--photon-log PATH]", args[0]);
        std::process::exit(1);
    }

    let config_path = &args[1];
    let vertex_path = &args[2];
    let mut photon_count: usize = 100000;
    let mut batches: usize = 10;
    let mut sigma: Float = 1.5;
    let mut size: usize = 32;
    let mut num_elec: usize = 80000;
    let mut settings = SiliconSettings::default();
    let mut seed: u64 = 0;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--photons" => {
                i += 1;
                photon_count = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(photon_count);
            }
            "--batches" => {
                i += 1;
                batches = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(batches).max(1);
            }
            "--sigma" => {
                i += 1;
                sigma = args.get(i).and_then(|v| v.parse::<Float>().ok()).unwrap_or(sigma);
            }
            "--size" => {
                i += 1;
                size = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(size);
            }
            "--num-elec" => {
                i += 1;
                num_elec = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(num_elec);
            }
            "--diff-mult" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<Float>().ok()) {
                    settings = settings.with_diff_mult(v);
                }
            }
            "--qdist" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    settings = settings.with_qdist(v);
                }
            }
            "--nrecalc" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    settings = settings.with_nrecalc(v);
                }
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(seed);
            }
            "--photon-log" => {
                i += 1;
                if let Some(v) = args.get(i) {
                    settings = settings.with_photon_file(v);
                }
            }
            other => log::warn!("Ignoring unknown argument {}.", other),
        }
        i += 1;
    }

    let sensor_rng = UniformDeviate::with_seed(seed).shared();
    let mut silicon: SiliconSensor = match SiliconSensor::new(config_path, vertex_path, num_elec, Some(sensor_rng), settings) {
        Ok(sensor) => sensor,
        Err(e) => {
            report(&e);
            std::process::exit(2);
        }
    };
    let mut simple = SimpleSensor::new();
    log::info!("{}", silicon.describe());

    let mut spot_rng = UniformDeviate::with_seed(seed.wrapping_add(1));
    let centre = (size / 2) as Float;
    let mut silicon_image = Bitmap::new(size, size);
    let mut simple_image = Bitmap::new(size, size);

    let progress = ProgressBar::new(batches as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} batches")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for b in 0..batches {
        let count = photon_count / batches + if b < photon_count % batches { 1 } else { 0 };
        let photons = gaussian_spot(count, centre, sigma, &mut spot_rng);
        if let Err(e) = silicon.accumulate(&photons, &mut silicon_image) {
            progress.abandon();
            report(&e);
            std::process::exit(3);
        }
        if let Err(e) = simple.accumulate(&photons, &mut simple_image) {
            report(&e);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    for (name, image) in [("simple", &simple_image), ("silicon", &silicon_image)] {
        let stats = spot_stats(image);
        println!("{}: total = {:.0}, peak = {:.0}, sigma = {} pixels",
                 style(name).bold(), stats.total, stats.peak, style(format!("{:.4}", stats.sigma)).green());
    }
}
