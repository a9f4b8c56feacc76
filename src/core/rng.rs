// Copyright @yucwang 2026

use crate::error::SensorError;
use crate::math::constants::Float;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::cell::RefCell;
use std::rc::Rc;

/// Source of uniform variates driving the stochastic parts of charge
/// collection.
pub trait RandomSource {
    /// Uniform variate in `[0, 1)`.
    fn uniform(&mut self) -> Float;

    /// Standard normal variate.
    fn gaussian(&mut self) -> Float;
}

#[derive(Clone, Debug)]
pub struct UniformDeviate {
    rng: StdRng,
}

impl Default for UniformDeviate {
    fn default() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }
}

impl UniformDeviate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn shared(self) -> Rc<RefCell<dyn RandomSource>> {
        Rc::new(RefCell::new(self))
    }
}

impl RandomSource for UniformDeviate {
    fn uniform(&mut self) -> Float {
        self.rng.random::<Float>()
    }

    fn gaussian(&mut self) -> Float {
        StandardNormal.sample(&mut self.rng)
    }
}

/// Random source held by a sensor: its own deviate, or one shared with the
/// caller who keeps observing the advanced state.
pub enum RngHandle {
    Owned(UniformDeviate),
    Shared(Rc<RefCell<dyn RandomSource>>),
}

impl RngHandle {
    pub fn resolve(rng: Option<Rc<RefCell<dyn RandomSource>>>) -> Self {
        match rng {
            Some(shared) => RngHandle::Shared(shared),
            None => RngHandle::Owned(UniformDeviate::default()),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, RngHandle::Shared(_))
    }

    /// Fails with [`SensorError::RngBusy`] while the caller still borrows a
    /// shared deviate.
    pub fn with<T, F>(&mut self, f: F) -> Result<T, SensorError>
    where
        F: FnOnce(&mut dyn RandomSource) -> T,
    {
        match self {
            RngHandle::Owned(rng) => Ok(f(rng)),
            RngHandle::Shared(rng) => {
                let mut guard = rng.try_borrow_mut().map_err(|_| SensorError::RngBusy)?;
                Ok(f(&mut *guard))
            }
        }
    }
}
