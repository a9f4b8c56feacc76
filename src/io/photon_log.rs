// Copyright @yucwang 2026

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::photon::PhotonArray;

#[derive(thiserror::Error, Debug)]
#[error("failed to write photon file {path}")]
pub struct PhotonLogError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

pub const PHOTON_FILE_HEADER: &str =
    "ID \t X(pixels) \t Y(pixels) \t dxdz      \t dydz      \t lambda(nm)";

/// Writes one tab separated record per photon, replacing any existing file.
/// Missing angles or wavelengths are written as 0.0.
pub fn write_photon_file<P: AsRef<Path>>(path: P, photons: &PhotonArray) -> Result<(), PhotonLogError> {
    let path = path.as_ref();
    write_records(path, photons).map_err(|source| PhotonLogError { path: path.to_path_buf(), source })?;
    log::debug!("Wrote {} photons to {}.", photons.size(), path.display());
    Ok(())
}

fn write_records(path: &Path, photons: &PhotonArray) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", PHOTON_FILE_HEADER)?;
    for i in 0..photons.size() {
        let dxdz = photons.dxdz(i).unwrap_or(0.0);
        let dydz = photons.dydz(i).unwrap_or(0.0);
        let lambda = photons.wavelength(i).unwrap_or(0.0);
        writeln!(out, "{} \t {:.6} \t {:.6} \t {:.6} \t {:.6} \t {:.6}",
                 i, photons.x(i), photons.y(i), dxdz, dydz, lambda)?;
    }
    out.flush()
}
