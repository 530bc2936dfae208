//! Engine configuration.
//!
//! All options have defaults matching the reference behaviour of the model,
//! and every section may be omitted when loading from JSON:
//!
//! ```
//! use miedema_mix::config::EngineConfig;
//! use miedema_mix::DerivativeStrategy;
//!
//! let config = EngineConfig::from_json(r#"{ "activity": { "strategy": "numerical" } }"#).unwrap();
//! assert_eq!(config.activity.strategy, DerivativeStrategy::Numerical);
//! assert_eq!(config.volume.max_iterations, 1000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::activity::DerivativeStrategy;
use crate::{EngineError, EngineResult};

/// Top-level configuration of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Self-consistent volume iteration
    pub volume: VolumeSolverOptions,
    /// Integration of excess Gibbs curves (GSM and UEM2_N)
    pub quadrature: QuadratureOptions,
    /// Activity coefficient derivation
    pub activity: ActivityOptions,
}

impl EngineConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.volume.validate()?;
        Ok(config)
    }
}

/// Stopping policy of the atomic volume fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSolverOptions {
    /// Absolute tolerance on consecutive volume iterates
    pub tolerance: f64,
    /// Maximum number of updates
    pub max_iterations: usize,
    /// Wall-clock budget in seconds
    pub timeout_secs: f64,
}

impl VolumeSolverOptions {
    /// Wall-clock budget as a [`Duration`], saturating at [`Duration::MAX`].
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    fn validate(&self) -> EngineResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(EngineError::Config(format!(
                "volume tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if Duration::try_from_secs_f64(self.timeout_secs).is_err() {
            return Err(EngineError::Config(format!(
                "volume timeout must be a representable non-negative number of seconds, got {}",
                self.timeout_secs
            )));
        }
        Ok(())
    }
}

impl Default for VolumeSolverOptions {
    fn default() -> Self {
        VolumeSolverOptions { tolerance: 1e-6, max_iterations: 1000, timeout_secs: 10.0 }
    }
}

/// Adaptive Gauss-Kronrod settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadratureOptions {
    /// Absolute error target
    pub abs_tol: f64,
    /// Relative error target
    pub rel_tol: f64,
    /// Maximum number of interval bisections
    pub max_subdivisions: usize,
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        QuadratureOptions { abs_tol: 1.49e-8, rel_tol: 1.49e-8, max_subdivisions: 50 }
    }
}

/// Partial molar quantity extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityOptions {
    /// Exact, numerical, or exact with numerical fallback
    pub strategy: DerivativeStrategy,
    /// Upper bound of the finite-difference step
    pub max_step: f64,
    /// Optional cap on the component count of the exact path
    pub max_exact_components: Option<usize>,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        ActivityOptions {
            strategy: DerivativeStrategy::Auto,
            max_step: 1e-6,
            max_exact_components: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.volume.tolerance, 1e-6);
        assert_eq!(config.volume.timeout(), Duration::from_secs(10));
        assert_eq!(config.quadrature.max_subdivisions, 50);
        assert_eq!(config.activity.strategy, DerivativeStrategy::Auto);
        assert_eq!(config.activity.max_exact_components, None);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(
            r#"{ "volume": { "max_iterations": 20 }, "activity": { "max_exact_components": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.volume.max_iterations, 20);
        assert_eq!(config.volume.tolerance, 1e-6);
        assert_eq!(config.activity.max_exact_components, Some(10));
    }

    #[test]
    fn test_invalid_json() {
        let err = EngineConfig::from_json("{ volume: 3 }").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_out_of_range_timeout() {
        for json in [
            r#"{ "volume": { "timeout_secs": 1e30 } }"#,
            r#"{ "volume": { "timeout_secs": -1.0 } }"#,
            r#"{ "volume": { "tolerance": -1e-6 } }"#,
        ] {
            let result = EngineConfig::from_json(json);
            assert!(matches!(result, Err(EngineError::Config(_))), "{}", json);
        }

        let huge = VolumeSolverOptions { timeout_secs: 1e30, ..Default::default() };
        assert_eq!(huge.timeout(), Duration::MAX);
        let nan = VolumeSolverOptions { timeout_secs: f64::NAN, ..Default::default() };
        assert_eq!(nan.timeout(), Duration::ZERO);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
