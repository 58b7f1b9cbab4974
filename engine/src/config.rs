//! Weight and threshold configuration, shared by the change-risk, defect,
//! and TDG analyzers. Follows `TDGConfig`'s/`DuplicateDetectionConfig`'s
//! idiom: plain `serde`-deserializable structs with a hand-written
//! `Default` matching spec.md's numeric defaults, and an explicit
//! `validate()` that either repairs a single bad field or rejects the
//! whole config.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Weights for the change-risk per-commit score. Sum must be `1.0 ± 0.01`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChangeRiskWeights {
    pub is_fix: f64,
    pub entropy: f64,
    pub lines_added: f64,
    pub unique_changes: f64,
    pub num_files: f64,
    pub lines_deleted: f64,
    pub num_developers: f64,
    pub author_experience: f64,
}

impl Default for ChangeRiskWeights {
    fn default() -> Self {
        ChangeRiskWeights {
            is_fix: 0.25,
            entropy: 0.20,
            lines_added: 0.20,
            unique_changes: 0.10,
            num_files: 0.08,
            lines_deleted: 0.07,
            num_developers: 0.05,
            author_experience: 0.05,
        }
    }
}

impl ChangeRiskWeights {
    pub fn sum(&self) -> f64 {
        self.is_fix
            + self.entropy
            + self.lines_added
            + self.unique_changes
            + self.num_files
            + self.lines_deleted
            + self.num_developers
            + self.author_experience
    }

    pub fn validate(&self) -> EngineResult<()> {
        if (self.sum() - 1.0).abs() > 0.01 {
            return Err(EngineError::InvalidConfiguration(format!(
                "change-risk weights sum to {:.4}, expected 1.0 +/- 0.01",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Weights for the defect-probability combiner. Sum must equal `1.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DefectWeights {
    pub churn: f64,
    pub complexity: f64,
    pub duplication: f64,
    pub coupling: f64,
    pub ownership: f64,
}

impl Default for DefectWeights {
    fn default() -> Self {
        DefectWeights {
            churn: 0.30,
            complexity: 0.25,
            duplication: 0.20,
            coupling: 0.10,
            ownership: 0.15,
        }
    }
}

impl DefectWeights {
    pub fn sum(&self) -> f64 {
        self.churn + self.complexity + self.duplication + self.coupling + self.ownership
    }

    pub fn validate(&self) -> EngineResult<()> {
        if (self.sum() - 1.0).abs() > 1e-6 {
            return Err(EngineError::InvalidConfiguration(format!(
                "defect weights sum to {:.6}, expected exactly 1.0",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Thresholds for the architectural-smells analyzer. Non-positive values
/// are silently replaced with defaults rather than rejected, per spec.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SmellThresholds {
    pub hub_fan_total: u32,
    pub god_fan_in: u32,
    pub god_fan_out: u32,
    pub stable_instability: f64,
    pub unstable_instability: f64,
}

impl Default for SmellThresholds {
    fn default() -> Self {
        SmellThresholds {
            hub_fan_total: 20,
            god_fan_in: 10,
            god_fan_out: 10,
            stable_instability: 0.3,
            unstable_instability: 0.7,
        }
    }
}

impl SmellThresholds {
    /// Replace any non-positive field with its default value in place.
    pub fn sanitize(&mut self) {
        let d = SmellThresholds::default();
        if self.hub_fan_total == 0 {
            self.hub_fan_total = d.hub_fan_total;
        }
        if self.god_fan_in == 0 {
            self.god_fan_in = d.god_fan_in;
        }
        if self.god_fan_out == 0 {
            self.god_fan_out = d.god_fan_out;
        }
        if self.stable_instability <= 0.0 {
            self.stable_instability = d.stable_instability;
        }
        if self.unstable_instability <= 0.0 {
            self.unstable_instability = d.unstable_instability;
        }
    }
}

/// Tunables for the duplicate detector. Defaults match spec.md §6/§4.H
/// exactly, mirroring `DuplicateDetectionConfig`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DuplicateConfig {
    pub min_tokens: usize,
    pub similarity_threshold: f64,
    pub shingle_size: usize,
    pub num_hash_functions: usize,
    pub num_bands: usize,
    pub rows_per_band: usize,
    pub min_group_size: usize,
    pub max_file_size: u64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        DuplicateConfig {
            min_tokens: 50,
            similarity_threshold: 0.70,
            shingle_size: 5,
            num_hash_functions: 200,
            num_bands: 20,
            rows_per_band: 10,
            min_group_size: 2,
            max_file_size: 0,
        }
    }
}

impl DuplicateConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.num_bands * self.rows_per_band != self.num_hash_functions {
            return Err(EngineError::InvalidConfiguration(format!(
                "bands({}) * rows_per_band({}) must equal hashes({})",
                self.num_bands, self.rows_per_band, self.num_hash_functions
            )));
        }
        Ok(())
    }
}

/// Top-level configuration composing every analyzer's tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    pub change_risk_weights: ChangeRiskWeights,
    pub defect_weights: DefectWeights,
    pub smell_thresholds: SmellThresholds,
    pub duplicate: DuplicateConfig,
}

impl Config {
    pub fn validate(&self) -> EngineResult<()> {
        self.change_risk_weights.validate()?;
        self.defect_weights.validate()?;
        self.duplicate.validate()?;
        Ok(())
    }

    pub fn from_yaml(text: &str) -> EngineResult<Self> {
        let cfg: Config = serde_yaml::from_str(text)
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> EngineResult<Self> {
        let cfg: Config = serde_json::from_str(text)
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_change_risk_weights_sum_to_one() {
        assert!((ChangeRiskWeights::default().sum() - 1.0).abs() < 0.01);
    }

    #[test]
    fn default_defect_weights_sum_to_one() {
        assert!((DefectWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bad_weight_sum_is_rejected() {
        let mut w = ChangeRiskWeights::default();
        w.is_fix = 10.0;
        assert!(w.validate().is_err());
    }

    #[test]
    fn zeroed_smell_thresholds_sanitize_to_defaults() {
        let mut t = SmellThresholds {
            hub_fan_total: 0,
            god_fan_in: 0,
            god_fan_out: 0,
            stable_instability: -1.0,
            unstable_instability: 0.0,
        };
        t.sanitize();
        assert_eq!(t, SmellThresholds::default());
    }
}
