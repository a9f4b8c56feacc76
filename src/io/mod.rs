pub mod photon_log;
pub mod vertex;
