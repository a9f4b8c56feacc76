// Copyright @yucwang 2021

pub mod config;
pub mod diffusion;
pub mod engine;
pub mod photon;
pub mod rng;
pub mod sensor;
