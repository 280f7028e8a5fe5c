//! Allocator configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! mode = "collaborative"
//! use_priority = true
//! heterogeneous = true
//! seed = 42
//!
//! [solver]
//! iterations = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dcop::{AssignmentMode, SolverConfig};
use crate::errors::{AllocationError, Result};

/// Options of [`DcopAllocator`](crate::scheduler::DcopAllocator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// One robot per task, or shared tasks.
    pub mode: AssignmentMode,
    /// Run each robot's schedule tightening before reporting to the graph.
    pub tighten_schedule: bool,
    /// Only allocate first-layer tasks that outrank the second layer.
    pub use_priority: bool,
    /// Skip robots lacking a task's required skills.
    pub heterogeneous: bool,
    /// Seed of the function-ownership draw.
    pub seed: u64,
    pub solver: SolverConfig,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            mode: AssignmentMode::Exclusive,
            tighten_schedule: false,
            use_priority: false,
            heterogeneous: false,
            seed: 0,
            solver: SolverConfig::default(),
        }
    }
}

impl AllocatorConfig {
    pub fn with_mode(mut self, mode: AssignmentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_tighten_schedule(mut self, tighten: bool) -> Self {
        self.tighten_schedule = tighten;
        self
    }

    pub fn with_priority(mut self, use_priority: bool) -> Self {
        self.use_priority = use_priority;
        self
    }

    pub fn with_heterogeneous(mut self, heterogeneous: bool) -> Self {
        self.heterogeneous = heterogeneous;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Basic sanity checks.
    pub fn validate(&self) -> Result<()> {
        if self.solver.iterations == 0 {
            return Err(AllocationError::Config(
                "solver.iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads and validates a configuration file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<AllocatorConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    AllocatorConfig::from_toml_str(&contents)
}
