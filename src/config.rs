//! Execution configuration: shot count, seeding and time bound.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::qasm::QasmError;

/// How a compiled program is executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Number of independent executions to aggregate
    pub shots: usize,
    /// Base seed; shot `i` is seeded with `seed + i`. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Wall-clock bound for a whole batch, in milliseconds
    pub timeout_ms: u64,
    /// Run shots on the rayon pool
    pub parallel: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            shots: 1,
            seed: None,
            timeout_ms: 10_000,
            parallel: false,
        }
    }
}

impl ExecutionConfig {
    pub fn new(shots: usize) -> Self {
        Self {
            shots,
            ..Self::default()
        }
    }

    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), QasmError> {
        if self.shots == 0 {
            return Err(QasmError::InvalidConfig("shots must be at least 1".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(QasmError::InvalidConfig("timeout must be at least 1 ms".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ExecutionConfig::default();
        assert_eq!(cfg.shots, 1);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert!(!cfg.parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let cfg = ExecutionConfig::new(50)
            .with_seed(9)
            .with_timeout(Duration::from_millis(250))
            .with_parallel(true);
        assert_eq!(cfg.shots, 50);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.timeout_ms, 250);
        assert!(cfg.parallel);
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(matches!(
            ExecutionConfig::new(0).validate(),
            Err(QasmError::InvalidConfig(_))
        ));
        assert!(ExecutionConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ExecutionConfig = serde_json::from_str(r#"{"shots": 8}"#).unwrap();
        assert_eq!(cfg, ExecutionConfig::new(8));

        let json = serde_json::to_string(&cfg.clone().with_seed(1)).unwrap();
        let back: ExecutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, Some(1));
    }
}
