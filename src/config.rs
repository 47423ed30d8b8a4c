//! Typed configuration for the gate and the router.
//!
//! Every option has an explicit default and effect. Validation runs at
//! case-start and fails loudly: silently defaulting a malformed threshold
//! would silently weaken the evidentiary guarantee, so malformed config is
//! the one error class that aborts evaluation before any finding exists.
//!
//! No process-wide mutable state: configs are plain values passed into
//! each pure function.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be in [0.0, 1.0], got {value}")]
    ThresholdOutOfRange { name: String, value: f32 },

    #[error("{name} must not be NaN")]
    ThresholdNaN { name: String },

    #[error("sample_pages must be >= 1")]
    ZeroSamplePages,

    #[error("field_confidence_floors contains an empty field name")]
    EmptyFloorKey,

    #[error("required_fields contains an empty field name")]
    EmptyRequiredField,
}

// ═══════════════════════════════════════════════════════════
// Extraction gate
// ═══════════════════════════════════════════════════════════

/// Thresholds driving the native-text / OCR / manual-fallback decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Below this char count, native text is not trusted.
    pub direct_text_min_chars: usize,
    /// Below this word count, native text is not trusted.
    pub direct_text_min_words: usize,
    /// OCR results below this mean confidence are never trusted.
    pub ocr_min_confidence: f32,
    /// OCR results with fewer words are treated as extraction failure.
    pub ocr_min_words: usize,
    /// Pages sampled by the gate probe. Must be >= 1.
    pub sample_pages: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            direct_text_min_chars: 200,
            direct_text_min_words: 30,
            ocr_min_confidence: 0.60,
            ocr_min_words: 20,
            sample_pages: 3,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_interval("ocr_min_confidence", self.ocr_min_confidence)?;
        if self.sample_pages == 0 {
            return Err(ConfigError::ZeroSamplePages);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Confidence router
// ═══════════════════════════════════════════════════════════

/// Per-field-type confidence floors and required-field set.
///
/// Different field types carry different financial/legal risk, so the
/// floor is keyed by field type. The shipped values are calibration
/// defaults re-derived per deployment, not structural constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Field type → minimum confidence for `Ok` status.
    pub field_confidence_floors: BTreeMap<String, f32>,
    /// Floor applied to field types absent from the map.
    pub default_floor: f32,
    /// Fields whose abstention alone triggers a WARNING verdict.
    pub required_fields: BTreeSet<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            field_confidence_floors: default_field_floors(),
            default_floor: 0.70,
            required_fields: BTreeSet::new(),
        }
    }
}

/// Calibration defaults from the benchmark dataset. Override per deployment.
pub fn default_field_floors() -> BTreeMap<String, f32> {
    BTreeMap::from([
        ("ruc".to_string(), 0.85),
        ("monto".to_string(), 0.80),
        ("fecha".to_string(), 0.75),
        ("razon_social".to_string(), 0.70),
    ])
}

impl RouterConfig {
    /// Confidence floor for a field, falling back to `default_floor` for
    /// unrecognized field types.
    pub fn floor_for(&self, field_name: &str) -> f32 {
        self.field_confidence_floors
            .get(field_name)
            .copied()
            .unwrap_or(self.default_floor)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_interval("default_floor", self.default_floor)?;
        for (field, floor) in &self.field_confidence_floors {
            if field.trim().is_empty() {
                return Err(ConfigError::EmptyFloorKey);
            }
            validate_unit_interval(&format!("field_confidence_floors[{field}]"), *floor)?;
        }
        for field in &self.required_fields {
            if field.trim().is_empty() {
                return Err(ConfigError::EmptyRequiredField);
            }
        }
        Ok(())
    }
}

fn validate_unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::ThresholdNaN { name: name.to_string() });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { name: name.to_string(), value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_defaults_match_documented_values() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.direct_text_min_chars, 200);
        assert_eq!(cfg.direct_text_min_words, 30);
        assert!((cfg.ocr_min_confidence - 0.60).abs() < f32::EPSILON);
        assert_eq!(cfg.ocr_min_words, 20);
        assert_eq!(cfg.sample_pages, 3);
    }

    #[test]
    fn gate_defaults_validate() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn gate_rejects_out_of_range_confidence() {
        let cfg = GateConfig { ocr_min_confidence: 1.5, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn gate_rejects_nan_confidence() {
        let cfg = GateConfig { ocr_min_confidence: f32::NAN, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ThresholdNaN { .. })));
    }

    #[test]
    fn gate_rejects_zero_sample_pages() {
        let cfg = GateConfig { sample_pages: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroSamplePages)));
    }

    #[test]
    fn router_defaults_validate() {
        assert!(RouterConfig::default().validate().is_ok());
    }

    #[test]
    fn router_floor_lookup_known_field() {
        let cfg = RouterConfig::default();
        assert!((cfg.floor_for("ruc") - 0.85).abs() < f32::EPSILON);
        assert!((cfg.floor_for("monto") - 0.80).abs() < f32::EPSILON);
    }

    #[test]
    fn router_floor_lookup_unknown_field_uses_default() {
        let cfg = RouterConfig::default();
        assert!((cfg.floor_for("glosa") - cfg.default_floor).abs() < f32::EPSILON);
    }

    #[test]
    fn router_rejects_negative_floor() {
        let mut cfg = RouterConfig::default();
        cfg.field_confidence_floors.insert("monto".into(), -0.1);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn router_rejects_empty_floor_key() {
        let mut cfg = RouterConfig::default();
        cfg.field_confidence_floors.insert("  ".into(), 0.5);
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyFloorKey)));
    }

    #[test]
    fn router_rejects_empty_required_field() {
        let mut cfg = RouterConfig::default();
        cfg.required_fields.insert(String::new());
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyRequiredField)));
    }

    #[test]
    fn calibration_floors_ranked_by_risk() {
        let floors = default_field_floors();
        assert!(floors["ruc"] > floors["monto"]);
        assert!(floors["monto"] > floors["fecha"]);
        assert!(floors["fecha"] > floors["razon_social"]);
    }
}
