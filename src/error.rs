use crate::core::config::ConfigError;
use crate::io::photon_log::PhotonLogError;
use crate::io::vertex::GeometryError;
use crate::math::constants::Float;

#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("Error in the sensor configuration")]
    Config(#[from] ConfigError),
    #[error("Error in the pixel vertex geometry")]
    Geometry(#[from] GeometryError),
    #[error("Diffusion step is not finite (Vdiff = {vdiff} V)")]
    NonFiniteDiffusion { vdiff: Float },
    #[error("Diffusion multiplier must be non-negative, got {0}")]
    NegativeDiffMult(Float),
    #[error("Failed to write the photon file")]
    PhotonLog(#[from] PhotonLogError),
    #[error("Invalid accumulation engine parameters: {0}")]
    Engine(String),
    #[error("Shared random source is already borrowed")]
    RngBusy,
}
