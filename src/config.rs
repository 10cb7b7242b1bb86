use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const ROWS_RANGE: RangeInclusive<i64> = 1..=20;
pub const COLS_RANGE: RangeInclusive<i64> = 1..=20;
pub const DURATION_RANGE_MS: RangeInclusive<i64> = 10..=2000;

const DEFAULT_ROWS: u32 = 4;
const DEFAULT_COLS: u32 = 4;
const DEFAULT_DURATION_MS: u32 = 100;
const DEFAULT_QUALITY: u32 = 10;
const DEFAULT_WORKERS: usize = 2;

/// Fully resolved grid configuration used by a conversion.
///
/// Only produced by [`PartialGridConfig::resolve`] (after validation) or
/// [`default_config`], so `rows`, `cols` and `frame_duration_ms` are always
/// inside their documented ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
    pub frame_duration_ms: u32,
    /// Encoder tuning; for GIF lower means better quantisation.
    pub quality_hint: u32,
    /// Worker count handed to the encoder backend.
    pub parallelism: usize,
}

impl GridConfig {
    pub fn frame_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            frame_duration_ms: DEFAULT_DURATION_MS,
            quality_hint: DEFAULT_QUALITY,
            parallelism: DEFAULT_WORKERS,
        }
    }
}

/// Grid configuration as supplied by a caller: any field may be missing.
///
/// Field names follow the external contract (`duration`, `quality`,
/// `workers`). Values are signed so that negative input reaches validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialGridConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<i64>,
}

impl PartialGridConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Layer `other` on top of `self`; fields present in `other` win.
    pub fn overlay(self, other: PartialGridConfig) -> PartialGridConfig {
        PartialGridConfig {
            rows: other.rows.or(self.rows),
            cols: other.cols.or(self.cols),
            duration: other.duration.or(self.duration),
            quality: other.quality.or(self.quality),
            workers: other.workers.or(self.workers),
        }
    }

    /// Fill every missing field from [`default_config`].
    pub fn merged_with_defaults(self) -> PartialGridConfig {
        let defaults = default_config();
        PartialGridConfig {
            rows: Some(defaults.rows as i64),
            cols: Some(defaults.cols as i64),
            duration: Some(defaults.frame_duration_ms as i64),
            quality: Some(defaults.quality_hint as i64),
            workers: Some(defaults.parallelism as i64),
        }
        .overlay(self)
    }

    /// Merge over the defaults and validate, reporting every violation.
    pub fn resolve(self) -> Result<GridConfig, ConfigError> {
        let defaults = default_config();
        let rows = self.rows.unwrap_or(defaults.rows as i64);
        let cols = self.cols.unwrap_or(defaults.cols as i64);
        let duration = self.duration.unwrap_or(defaults.frame_duration_ms as i64);

        let violations = validate_config(&PartialGridConfig {
            rows: Some(rows),
            cols: Some(cols),
            duration: Some(duration),
            ..self
        });
        if !violations.is_empty() {
            return Err(ConfigError { violations });
        }

        // Quality and workers are hints; out-of-range values are clamped, not rejected.
        let quality_hint = self
            .quality
            .map_or(defaults.quality_hint, |q| q.clamp(1, u32::MAX as i64) as u32);
        let parallelism = self
            .workers
            .map_or(defaults.parallelism, |w| w.clamp(1, 64) as usize);

        Ok(GridConfig {
            rows: rows as u32,
            cols: cols as u32,
            frame_duration_ms: duration as u32,
            quality_hint,
            parallelism,
        })
    }
}

impl From<GridConfig> for PartialGridConfig {
    fn from(config: GridConfig) -> Self {
        Self {
            rows: Some(config.rows as i64),
            cols: Some(config.cols as i64),
            duration: Some(config.frame_duration_ms as i64),
            quality: Some(config.quality_hint as i64),
            workers: Some(config.parallelism as i64),
        }
    }
}

/// One or more grid/timing parameters are out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {}", .violations.join("; "))]
pub struct ConfigError {
    pub violations: Vec<String>,
}

/// Check the fields that are present and return every violation, in field
/// order. An empty list means the configuration is valid.
pub fn validate_config(config: &PartialGridConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.rows.is_some_and(|rows| !ROWS_RANGE.contains(&rows)) {
        errors.push("Rows must be between 1 and 20".to_string());
    }

    if config.cols.is_some_and(|cols| !COLS_RANGE.contains(&cols)) {
        errors.push("Columns must be between 1 and 20".to_string());
    }

    if config
        .duration
        .is_some_and(|duration| !DURATION_RANGE_MS.contains(&duration))
    {
        errors.push("Duration must be between 10ms and 2000ms".to_string());
    }

    errors
}

/// The documented default configuration.
pub fn default_config() -> GridConfig {
    GridConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = default_config();
        assert_eq!(config.rows, 4);
        assert_eq!(config.cols, 4);
        assert_eq!(config.frame_duration_ms, 100);
        assert_eq!(config.quality_hint, 10);
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.frame_count(), 16);
    }

    #[test]
    fn validation_reports_every_violation() {
        let config = PartialGridConfig {
            rows: Some(0),
            cols: Some(21),
            duration: Some(5),
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(
            errors,
            vec![
                "Rows must be between 1 and 20",
                "Columns must be between 1 and 20",
                "Duration must be between 10ms and 2000ms",
            ]
        );
    }

    #[test]
    fn validation_skips_missing_fields() {
        assert!(validate_config(&PartialGridConfig::default()).is_empty());
        let only_cols = PartialGridConfig {
            cols: Some(-3),
            ..Default::default()
        };
        assert_eq!(validate_config(&only_cols).len(), 1);
    }

    #[test]
    fn validation_accepts_range_bounds() {
        for (rows, cols, duration) in [(1, 1, 10), (20, 20, 2000)] {
            let config = PartialGridConfig {
                rows: Some(rows),
                cols: Some(cols),
                duration: Some(duration),
                ..Default::default()
            };
            assert!(validate_config(&config).is_empty());
        }
    }

    #[test]
    fn duration_above_ui_limit_is_still_valid() {
        let config = PartialGridConfig {
            duration: Some(1500),
            ..Default::default()
        };
        assert_eq!(config.resolve().map(|c| c.frame_duration_ms), Ok(1500));
    }

    #[test]
    fn resolve_merges_over_defaults() {
        let config = PartialGridConfig {
            rows: Some(2),
            workers: Some(8),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(config.rows, 2);
        assert_eq!(config.cols, 4);
        assert_eq!(config.frame_duration_ms, 100);
        assert_eq!(config.parallelism, 8);
    }

    #[test]
    fn resolve_clamps_hints() {
        let config = PartialGridConfig {
            quality: Some(-4),
            workers: Some(0),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(config.quality_hint, 1);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn resolve_rejects_with_all_messages() {
        let err = PartialGridConfig {
            rows: Some(21),
            duration: Some(3000),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.to_string().contains("Rows must be between 1 and 20"));
    }

    #[test]
    fn resolve_rejects_values_outside_u32() {
        let err = PartialGridConfig {
            rows: Some(i64::MAX),
            cols: Some(i64::MIN),
            duration: Some(u32::MAX as i64 + 1),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn resolve_keeps_range_bounds() {
        let config = PartialGridConfig {
            rows: Some(20),
            cols: Some(1),
            duration: Some(2000),
            quality: Some(i64::MAX),
            workers: Some(1_000),
        }
        .resolve()
        .unwrap();
        assert_eq!((config.rows, config.cols, config.frame_duration_ms), (20, 1, 2000));
        assert_eq!(config.quality_hint, u32::MAX);
        assert_eq!(config.parallelism, 64);
    }

    #[test]
    fn json_uses_external_field_names() {
        let config =
            PartialGridConfig::from_json(r#"{"rows": 3, "duration": 250, "workers": 4}"#).unwrap();
        assert_eq!(config.rows, Some(3));
        assert_eq!(config.cols, None);
        assert_eq!(config.duration, Some(250));
        assert_eq!(config.workers, Some(4));

        assert!(PartialGridConfig::from_json(r#"{"frameDurationMs": 100}"#).is_err());
    }

    #[test]
    fn overlay_prefers_later_layer() {
        let file = PartialGridConfig {
            rows: Some(2),
            cols: Some(2),
            ..Default::default()
        };
        let flags = PartialGridConfig {
            cols: Some(5),
            ..Default::default()
        };
        let merged = file.overlay(flags);
        assert_eq!(merged.rows, Some(2));
        assert_eq!(merged.cols, Some(5));
    }
}
