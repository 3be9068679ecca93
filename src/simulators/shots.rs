//! Repeated execution of one compiled program
//!
//! Every shot runs in its own environment with its own circuit and random
//! source. Shot `i` of a seeded batch uses `seed + i`, so results do not
//! depend on whether the batch ran on the rayon pool.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

use crate::config::ExecutionConfig;
use crate::qasm::{compile, Executor, Program, QasmError};

/// Per-address averages over a batch of shots
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSummary {
    pub shots: usize,
    /// `Some(mean)` where every shot left an integer, `None` otherwise
    pub averages: Vec<Option<f64>>,
}

impl ShotSummary {
    /// Fold per-shot memory snapshots into averages
    pub fn from_snapshots(snapshots: &[Vec<Option<i64>>]) -> Self {
        let shots = snapshots.len();
        let width = snapshots.iter().map(Vec::len).max().unwrap_or(0);

        let averages = (0..width)
            .map(|address| {
                let total = snapshots
                    .iter()
                    .map(|snapshot| snapshot.get(address).copied().flatten())
                    .try_fold(0.0, |sum, value| value.map(|v| sum + v as f64))?;
                Some(total / shots as f64)
            })
            .collect();

        ShotSummary { shots, averages }
    }

    /// Averages with the non-integer addresses dropped
    pub fn compact(&self) -> Vec<f64> {
        self.averages.iter().flatten().copied().collect()
    }

    pub fn average_at(&self, address: usize) -> Option<f64> {
        self.averages.get(address).copied().flatten()
    }
}

/// Executes a program `shots` times and aggregates the snapshots
#[derive(Debug, Clone, Default)]
pub struct ShotRunner {
    config: ExecutionConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl ShotRunner {
    pub fn new(config: ExecutionConfig) -> Self {
        ShotRunner { config, cancel: None }
    }

    /// Abort every shot once `flag` is raised
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    fn executor(&self) -> Executor {
        match &self.cancel {
            Some(flag) => Executor::with_cancel_flag(Arc::clone(flag)),
            None => Executor::new(),
        }
    }

    fn rng_for(&self, shot: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(shot as u64)),
            None => StdRng::from_entropy(),
        }
    }

    fn shot(&self, executor: &Executor, program: &Program, index: usize) -> Result<Vec<Option<i64>>, QasmError> {
        executor
            .run(program, self.rng_for(index))
            .map(|env| env.snapshot())
    }

    /// Memory snapshot of every shot, in shot order
    pub fn snapshots(&self, program: &Program) -> Result<Vec<Vec<Option<i64>>>, QasmError> {
        self.config.validate()?;
        let executor = self.executor();
        debug!(
            shots = self.config.shots,
            parallel = self.config.parallel,
            "running shot batch"
        );

        if self.config.parallel {
            (0..self.config.shots)
                .into_par_iter()
                .map(|index| self.shot(&executor, program, index))
                .collect()
        } else {
            (0..self.config.shots)
                .map(|index| self.shot(&executor, program, index))
                .collect()
        }
    }

    pub fn run(&self, program: &Program) -> Result<ShotSummary, QasmError> {
        let snapshots = self.snapshots(program)?;
        Ok(ShotSummary::from_snapshots(&snapshots))
    }

    /// Compile once, then run
    pub fn run_source(&self, source: &str) -> Result<ShotSummary, QasmError> {
        let program = compile(source)?;
        self.run(&program)
    }
}
