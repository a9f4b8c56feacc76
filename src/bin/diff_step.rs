use silicon_sensor::core::config::load_config;
use silicon_sensor::core::diffusion::{calc_diff_step, DiffusionParams};
use silicon_sensor::io::vertex::expected_vertex_count;
use silicon_sensor::math::constants::Float;
use std::env;

fn main() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config> [--diff-mult F]", args[0]);
        std::process::exit(1);
    }

    let mut diff_mult: Float = 1.0;
    let mut i = 2;
    while i < args.len() {
        if args[i] == "--diff-mult" {
            i += 1;
            diff_mult = args.get(i).and_then(|v| v.parse::<Float>().ok()).unwrap_or(diff_mult);
        }
        i += 1;
    }

    let config = load_config(&args[1]).unwrap_or_else(|e| {
        log::error!("{}", e);
        std::process::exit(2);
    });
    let params = DiffusionParams::from_config(&config).unwrap_or_else(|e| {
        log::error!("{}", e);
        std::process::exit(2);
    });

    match calc_diff_step(&params, diff_mult) {
        Ok(step) => println!("DiffStep: {:.6} um (DiffMult = {})", step, diff_mult),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(3);
        }
    }
    if let (Some(vdiff), Some(area)) = (params.vdiff(), params.collection_area()) {
        println!("Vdiff: {:.4} V", vdiff);
        println!("Collection area: x_min = {:.4}, x_width = {:.4}, y_min = {:.4}, y_width = {:.4}",
                 area.x_min, area.x_width, area.y_min, area.y_width);
    }

    let dims = (config.require_count("PixelBoundaryNx"),
                config.require_count("PixelBoundaryNy"),
                config.require_count("NumVertices"));
    match dims {
        (Ok(nx), Ok(ny), Ok(nv)) => {
            println!("Vertex file: {}x{} pixels, {} vertices per edge, {} values expected",
                     nx, ny, nv, expected_vertex_count(nx, ny, nv));
        }
        _ => log::warn!("Configuration does not describe the vertex grid."),
    }
}
