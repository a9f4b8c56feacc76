// Copyright @yucwang 2026

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::core::config::{load_config, Config};
use crate::core::diffusion::{calc_diff_step, DiffusionParams};
use crate::core::engine::{AccumulationEngine, EngineParams};
use crate::core::photon::PhotonArray;
use crate::core::rng::{RandomSource, RngHandle};
use crate::core::sensor::Sensor;
use crate::engines::brighter_fatter::BrighterFatterEngine;
use crate::error::SensorError;
use crate::io::photon_log::write_photon_file;
use crate::io::vertex::VertexGeometry;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

/// Construction options of a [`SiliconSensor`].
#[derive(Debug, Clone)]
pub struct SiliconSettings {
    /// Scales the theoretical diffusion; 0.0 turns diffusion off.
    pub diff_mult: Float,
    /// Reach, in pixels, of the brighter-fatter distortion.
    pub qdist: usize,
    /// Photons between recomputations of the pixel shapes.
    pub nrecalc: usize,
    /// When set, every accumulated batch is written here first.
    pub photon_file: Option<PathBuf>,
}

impl Default for SiliconSettings {
    fn default() -> Self {
        Self { diff_mult: 1.0, qdist: 3, nrecalc: 10000, photon_file: None }
    }
}

impl SiliconSettings {
    pub fn with_diff_mult(mut self, diff_mult: Float) -> Self {
        self.diff_mult = diff_mult;
        self
    }

    pub fn with_qdist(mut self, qdist: usize) -> Self {
        self.qdist = qdist;
        self
    }

    pub fn with_nrecalc(mut self, nrecalc: usize) -> Self {
        self.nrecalc = nrecalc;
        self
    }

    pub fn with_photon_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.photon_file = Some(path.into());
        self
    }
}

/// Silicon CCD: photons convert at a random depth and drift to the wells,
/// diffusing thermally and pushed by the charge already collected
/// (brighter-fatter effect).
///
/// The sensor is built from a Poisson simulator configuration file and the
/// matching vertex file; `num_elec` is the charge of the reference pixel in
/// that simulation. Lowering it strengthens the effect.
pub struct SiliconSensor<E: AccumulationEngine = BrighterFatterEngine> {
    config: Config,
    diff_step: Float,
    num_elec: usize,
    pixel_size: Float,
    rng: RngHandle,
    photon_file: Option<PathBuf>,
    engine: E,
}

impl<E: AccumulationEngine> SiliconSensor<E> {
    /// Passing `None` for `rng` gives the sensor its own entropy-seeded
    /// deviate; a shared deviate keeps advancing for the caller as well, and
    /// must not be borrowed by the caller during `accumulate`.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(config_file: P,
                                               vertex_file: Q,
                                               num_elec: usize,
                                               rng: Option<Rc<RefCell<dyn RandomSource>>>,
                                               settings: SiliconSettings) -> Result<Self, SensorError> {
        let rng = RngHandle::resolve(rng);
        let config = load_config(config_file)?;

        let diffusion = DiffusionParams::from_config(&config)?;
        let diff_step = calc_diff_step(&diffusion, settings.diff_mult)?;

        let num_vertices = config.require_count("NumVertices")?;
        let nx = config.require_count("PixelBoundaryNx")?;
        let ny = config.require_count("PixelBoundaryNy")?;
        let pixel_size = config.require_float("PixelSize")?;

        let geometry = VertexGeometry::load(vertex_file, nx, ny, num_vertices)?;

        let engine = E::from_params(EngineParams {
            num_vertices,
            num_elec,
            nx,
            ny,
            qdist: settings.qdist,
            nrecalc: settings.nrecalc,
            diff_step,
            pixel_size,
            geometry: geometry.into_data(),
        })?;
        log::info!("SiliconSensor ready: {}x{} grid, DiffStep = {:.4} um.", nx, ny, diff_step);

        Ok(Self {
            config,
            diff_step,
            num_elec,
            pixel_size,
            rng,
            photon_file: settings.photon_file,
            engine,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Microns.
    pub fn diff_step(&self) -> Float {
        self.diff_step
    }

    pub fn num_elec(&self) -> usize {
        self.num_elec
    }

    pub fn pixel_size(&self) -> Float {
        self.pixel_size
    }

    pub fn photon_file(&self) -> Option<&Path> {
        self.photon_file.as_deref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: AccumulationEngine> Sensor for SiliconSensor<E> {
    fn accumulate(&mut self, photons: &PhotonArray, image: &mut Bitmap) -> Result<Float, SensorError> {
        if let Some(path) = &self.photon_file {
            write_photon_file(path, photons)?;
        }
        let engine = &mut self.engine;
        self.rng.with(|rng| engine.accumulate(photons, rng, image))
    }

    fn describe(&self) -> String {
        format!("SiliconSensor\n  diff_step: {}\n  num_elec: {}\n  pixel_size: {}\n  engine: {}",
                self.diff_step, self.num_elec, self.pixel_size, self.engine.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigError;
    use crate::core::rng::UniformDeviate;
    use crate::engines::brighter_fatter::tests::vertex_values;
    use crate::io::vertex::{expected_vertex_count, GeometryError};
    use std::fs;
    use tempfile::TempDir;

    /// Records how it was built and drops photons straight into the image,
    /// drawing one uniform per photon.
    struct StubEngine {
        params: EngineParams,
        calls: usize,
    }

    impl AccumulationEngine for StubEngine {
        fn from_params(params: EngineParams) -> Result<Self, SensorError> {
            Ok(Self { params, calls: 0 })
        }

        fn accumulate(&mut self, photons: &PhotonArray, rng: &mut dyn RandomSource, image: &mut Bitmap) -> Float {
            self.calls += 1;
            for _ in 0..photons.size() {
                rng.uniform();
            }
            photons.add_to(image)
        }
    }

    const CONFIG: &str = "\
# Poisson simulator settings
CollectingPhases = 1
PixelSize = 10.0          # microns
ChannelStopWidth = 2.0
Vbb = -40.0
Vparallel_lo = -8.0
Vparallel_hi = 4.0
CCDTemperature = 173.0
NumVertices = 2
PixelBoundaryNx = 9
PixelBoundaryNy = 9
Qs = 1000 2000
";

    fn write_inputs(dir: &TempDir, config: &str, vertex_count: usize) -> (PathBuf, PathBuf) {
        let config_path = dir.path().join("bf.cfg");
        fs::write(&config_path, config).unwrap();
        let mut text = String::from("X0 Y0 Theta X Y\n");
        let mut values = vertex_values(9, 9, 2, 10.0, |_, v| v);
        values.resize(vertex_count, 0.0);
        for row in values.chunks(5) {
            let row: Vec<String> = row.iter().map(|v| format!("{:.10}", v)).collect();
            text.push_str(&row.join(" "));
            text.push('\n');
        }
        let vertex_path = dir.path().join("bf.vertices");
        fs::write(&vertex_path, text).unwrap();
        (config_path, vertex_path)
    }

    fn expected_count() -> usize {
        expected_vertex_count(9, 9, 2)
    }

    fn reference_diffusion() -> DiffusionParams {
        DiffusionParams::from_config(&crate::core::config::parse_config(CONFIG)).unwrap()
    }

    #[test]
    fn test_construction_passes_engine_params() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 80000, None, SiliconSettings::default()).unwrap();

        let params = &sensor.engine().params;
        assert_eq!(params.num_vertices, 2);
        assert_eq!(params.num_elec, 80000);
        assert_eq!((params.nx, params.ny), (9, 9));
        assert_eq!(params.qdist, 3);
        assert_eq!(params.nrecalc, 10000);
        assert_eq!(params.pixel_size, 10.0);
        assert_eq!(params.geometry.len(), expected_count());
        assert_eq!(params.diff_step, sensor.diff_step());
        assert!(sensor.photon_file().is_none());
    }

    #[test]
    fn test_diff_step_matches_direct_calculation() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let settings = SiliconSettings::default().with_diff_mult(1.7);
        let sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, settings).unwrap();

        let direct = calc_diff_step(&reference_diffusion(), 1.7).unwrap();
        assert_eq!(sensor.diff_step(), direct);
        assert!(sensor.diff_step() > 0.0);

        let off = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None,
                                                   SiliconSettings::default().with_diff_mult(0.0)).unwrap();
        assert_eq!(off.diff_step(), 0.0);
    }

    #[test]
    fn test_unsupported_phases_still_build() {
        let dir = TempDir::new().unwrap();
        let config = CONFIG.replace("CollectingPhases = 1", "CollectingPhases = 3");
        let (config, vertices) = write_inputs(&dir, &config, expected_count());
        let sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, SiliconSettings::default()).unwrap();
        assert_eq!(sensor.diff_step(), 0.0);
    }

    #[test]
    fn test_short_vertex_file_fails() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count() - 1);
        let result = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, SiliconSettings::default());
        match result {
            Err(SensorError::Geometry(GeometryError::SizeMismatch { expected, found })) => {
                assert_eq!(expected, expected_count());
                assert_eq!(found, expected_count() - 1);
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_inputs_fail() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());

        let result = SiliconSensor::<StubEngine>::new(dir.path().join("nope.cfg"), &vertices, 1000, None,
                                                      SiliconSettings::default());
        assert!(matches!(result, Err(SensorError::Config(ConfigError::NotFound(_)))));

        let result = SiliconSensor::<StubEngine>::new(&config, dir.path().join("nope.dat"), 1000, None,
                                                      SiliconSettings::default());
        assert!(matches!(result, Err(SensorError::Geometry(GeometryError::NotFound(_)))));
    }

    #[test]
    fn test_missing_parameter_fails() {
        let dir = TempDir::new().unwrap();
        let config = CONFIG.replace("PixelBoundaryNy = 9\n", "");
        let (config, vertices) = write_inputs(&dir, &config, expected_count());
        let result = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, SiliconSettings::default());
        assert!(matches!(result,
                         Err(SensorError::Config(ConfigError::MissingParameter(ref name))) if name == "PixelBoundaryNy"));
    }

    #[test]
    fn test_photon_file_written_before_accumulating() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let log_path = dir.path().join("photons.txt");
        let settings = SiliconSettings::default().with_photon_file(&log_path);
        let mut sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, settings).unwrap();

        let photons = PhotonArray::from_positions(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]);
        let mut image = Bitmap::new(5, 5);
        let added = sensor.accumulate(&photons, &mut image).unwrap();

        assert_eq!(added, 3.0);
        assert_eq!(sensor.engine().calls, 1);
        let contents = fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 4);
    }

    #[test]
    fn test_photon_file_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let settings = SiliconSettings::default().with_photon_file(dir.path().join("no_dir").join("photons.txt"));
        let mut sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, settings).unwrap();

        let photons = PhotonArray::from_positions(vec![1.0], vec![1.0]);
        let mut image = Bitmap::new(5, 5);
        let result = sensor.accumulate(&photons, &mut image);

        assert!(matches!(result, Err(SensorError::PhotonLog(_))));
        assert_eq!(sensor.engine().calls, 0);
        assert_eq!(image.sum(), 0.0);
    }

    #[test]
    fn test_shared_rng_is_advanced() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let shared = UniformDeviate::with_seed(42).shared();
        let mut sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, Some(shared.clone()),
                                                          SiliconSettings::default()).unwrap();

        let photons = PhotonArray::from_positions(vec![1.0; 4], vec![1.0; 4]);
        let mut image = Bitmap::new(5, 5);
        sensor.accumulate(&photons, &mut image).unwrap();

        let mut reference = UniformDeviate::with_seed(42);
        for _ in 0..4 {
            reference.uniform();
        }
        assert_eq!(shared.borrow_mut().uniform(), reference.uniform());
    }

    #[test]
    fn test_borrowed_shared_rng_fails_accumulate() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let shared = UniformDeviate::with_seed(42).shared();
        let mut sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, Some(shared.clone()),
                                                          SiliconSettings::default()).unwrap();

        let photons = PhotonArray::from_positions(vec![1.0], vec![1.0]);
        let mut image = Bitmap::new(5, 5);
        let held = shared.borrow_mut();
        let result = sensor.accumulate(&photons, &mut image);
        drop(held);

        assert!(matches!(result, Err(SensorError::RngBusy)));
        assert_eq!(sensor.engine().calls, 0);
        assert_eq!(image.sum(), 0.0);
    }

    #[test]
    fn test_float_and_text_phases() {
        let dir = TempDir::new().unwrap();
        let one = CONFIG.replace("CollectingPhases = 1", "CollectingPhases = 1.0");
        let (config, vertices) = write_inputs(&dir, &one, expected_count());
        let sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, SiliconSettings::default()).unwrap();
        assert_eq!(sensor.diff_step(), calc_diff_step(&reference_diffusion(), 1.0).unwrap());

        let text = CONFIG.replace("CollectingPhases = 1", "CollectingPhases = three");
        let (config, vertices) = write_inputs(&dir, &text, expected_count());
        let sensor = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, SiliconSettings::default()).unwrap();
        assert_eq!(sensor.diff_step(), 0.0);
    }

    #[test]
    fn test_negative_diff_mult_fails() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let settings = SiliconSettings::default().with_diff_mult(-1.0);
        let result = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, settings);
        assert!(matches!(result, Err(SensorError::NegativeDiffMult(_))));
    }

    #[test]
    fn test_oversized_grid_is_a_mismatch() {
        let dir = TempDir::new().unwrap();
        let huge = CONFIG.replace("PixelBoundaryNx = 9", "PixelBoundaryNx = 4000000")
                         .replace("PixelBoundaryNy = 9", "PixelBoundaryNy = 4000000");
        let (config, vertices) = write_inputs(&dir, &huge, expected_count());
        let result = SiliconSensor::<StubEngine>::new(&config, &vertices, 1000, None, SiliconSettings::default());
        match result {
            Err(SensorError::Geometry(GeometryError::SizeMismatch { expected, found })) => {
                assert_eq!(expected, expected_vertex_count(4000000, 4000000, 2));
                assert_eq!(found, expected_count());
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn test_reference_engine_without_diffusion() {
        let dir = TempDir::new().unwrap();
        let (config, vertices) = write_inputs(&dir, CONFIG, expected_count());
        let settings = SiliconSettings::default().with_diff_mult(0.0);
        let mut sensor: SiliconSensor = SiliconSensor::new(&config, &vertices, 1000, None, settings).unwrap();

        let photons = PhotonArray::from_positions(vec![3.0], vec![4.0]);
        let mut image = Bitmap::new(10, 10);
        let added = sensor.accumulate(&photons, &mut image).unwrap();

        assert_eq!(added, 1.0);
        assert_eq!(image.get(3, 4), 1.0);
        assert_eq!(image.sum(), 1.0);
    }
}
