// Copyright @yucwang 2021

pub mod core;
pub mod engines;
pub mod error;
pub mod io;
pub mod math;
pub mod sensors;

pub use crate::error::SensorError;
