use anyhow::{Context, Result};
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::AnalysisError;
use crate::types::Severity;

/// Top-level configuration loaded from `.lintel.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub layers: LayersConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Compliance thresholds. Missing keys keep the documented defaults; values
/// that would invert verdicts are rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum column cross-section side, meters.
    #[serde(default = "default_min_column_size")]
    pub min_column_size: f64,
    /// Maximum beam clear span, meters.
    #[serde(default = "default_max_beam_span")]
    pub max_beam_span: f64,
    /// Minimum wall area as a fraction of the footprint.
    #[serde(default = "default_min_wall_ratio")]
    pub min_wall_ratio: f64,
    /// Recommended wall area fraction; ratios between the minimum and this
    /// value raise an advisory rather than a failure.
    #[serde(default = "default_recommended_wall_ratio")]
    pub recommended_wall_ratio: f64,
    /// Maximum floor area served by a single column, square meters.
    #[serde(default = "default_max_column_density")]
    pub max_column_density: f64,
    /// Minimum foundations per column.
    #[serde(default = "default_min_foundation_ratio")]
    pub min_foundation_ratio: f64,
    /// Maximum foundations per column before the surplus is flagged.
    #[serde(default = "default_max_foundation_ratio")]
    pub max_foundation_ratio: f64,
    /// Minimum isoperimetric compactness (4πA/P²) for slab outlines.
    #[serde(default = "default_min_slab_compactness")]
    pub min_slab_compactness: f64,
    /// Maximum distance between the column mass center and the median
    /// column center, meters.
    #[serde(default = "default_max_center_deviation")]
    pub max_center_deviation: f64,
}

fn default_min_column_size() -> f64 {
    0.25
}

fn default_max_beam_span() -> f64 {
    8.0
}

fn default_min_wall_ratio() -> f64 {
    0.01
}

fn default_recommended_wall_ratio() -> f64 {
    0.02
}

fn default_max_column_density() -> f64 {
    25.0
}

fn default_min_foundation_ratio() -> f64 {
    1.0
}

fn default_max_foundation_ratio() -> f64 {
    1.2
}

fn default_min_slab_compactness() -> f64 {
    0.5
}

fn default_max_center_deviation() -> f64 {
    2.0
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_column_size: default_min_column_size(),
            max_beam_span: default_max_beam_span(),
            min_wall_ratio: default_min_wall_ratio(),
            recommended_wall_ratio: default_recommended_wall_ratio(),
            max_column_density: default_max_column_density(),
            min_foundation_ratio: default_min_foundation_ratio(),
            max_foundation_ratio: default_max_foundation_ratio(),
            min_slab_compactness: default_min_slab_compactness(),
            max_center_deviation: default_max_center_deviation(),
        }
    }
}

impl ThresholdConfig {
    /// Every threshold must be a finite non-negative number.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let entries = [
            ("min_column_size", self.min_column_size),
            ("max_beam_span", self.max_beam_span),
            ("min_wall_ratio", self.min_wall_ratio),
            ("recommended_wall_ratio", self.recommended_wall_ratio),
            ("max_column_density", self.max_column_density),
            ("min_foundation_ratio", self.min_foundation_ratio),
            ("max_foundation_ratio", self.max_foundation_ratio),
            ("min_slab_compactness", self.min_slab_compactness),
            ("max_center_deviation", self.max_center_deviation),
        ];
        for (key, value) in entries {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::InvalidThreshold {
                    key: key.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Keyword lists matched case-insensitively as substrings against layer and
/// block names. Field order mirrors the classifier's priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_column_keywords")]
    pub column: Vec<String>,
    #[serde(default = "default_beam_keywords")]
    pub beam: Vec<String>,
    #[serde(default = "default_wall_keywords")]
    pub wall: Vec<String>,
    #[serde(default = "default_slab_keywords")]
    pub slab: Vec<String>,
    #[serde(default = "default_foundation_keywords")]
    pub foundation: Vec<String>,
}

fn default_column_keywords() -> Vec<String> {
    vec![
        "kolon".to_string(),
        "column".to_string(),
        "col".to_string(),
        "pillar".to_string(),
        "sütun".to_string(),
    ]
}

fn default_beam_keywords() -> Vec<String> {
    vec![
        "kiriş".to_string(),
        "kiris".to_string(),
        "beam".to_string(),
        "träger".to_string(),
    ]
}

fn default_wall_keywords() -> Vec<String> {
    vec![
        "perde".to_string(),
        "wall".to_string(),
        "duvar".to_string(),
        "shear".to_string(),
    ]
}

fn default_slab_keywords() -> Vec<String> {
    vec![
        "döşeme".to_string(),
        "doseme".to_string(),
        "slab".to_string(),
        "floor".to_string(),
        "plak".to_string(),
        "platte".to_string(),
    ]
}

fn default_foundation_keywords() -> Vec<String> {
    vec![
        "temel".to_string(),
        "foundation".to_string(),
        "footing".to_string(),
        "fundament".to_string(),
    ]
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            column: default_column_keywords(),
            beam: default_beam_keywords(),
            wall: default_wall_keywords(),
            slab: default_slab_keywords(),
            foundation: default_foundation_keywords(),
        }
    }
}

/// Tunables for the geometry-only fallback used when no keyword matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Longest bounding side a column candidate may have, meters.
    #[serde(default = "default_max_column_side")]
    pub max_column_side: f64,
    /// Aspect ratio ceiling for a near-square column candidate.
    #[serde(default = "default_max_column_aspect")]
    pub max_column_aspect: f64,
    /// Aspect ratio floor for a long thin beam candidate.
    #[serde(default = "default_min_beam_aspect")]
    pub min_beam_aspect: f64,
    /// Enclosed area above which a closed outline is wall or slab sized,
    /// square meters.
    #[serde(default = "default_min_slab_area")]
    pub min_slab_area: f64,
    /// Mean thickness (2·area/perimeter) below which a large closed outline
    /// reads as a wall rather than a slab, meters.
    #[serde(default = "default_max_wall_thickness")]
    pub max_wall_thickness: f64,
}

fn default_max_column_side() -> f64 {
    1.0
}

fn default_max_column_aspect() -> f64 {
    1.5
}

fn default_min_beam_aspect() -> f64 {
    5.0
}

fn default_min_slab_area() -> f64 {
    5.0
}

fn default_max_wall_thickness() -> f64 {
    0.5
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_column_side: default_max_column_side(),
            max_column_aspect: default_max_column_aspect(),
            min_beam_aspect: default_min_beam_aspect(),
            min_slab_area: default_min_slab_area(),
            max_wall_thickness: default_max_wall_thickness(),
        }
    }
}

/// Layers dropped from the analysis before classification, as glob patterns
/// matched case-insensitively against the layer name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(default = "default_exclude_patterns")]
    pub exclude: Vec<String>,
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "DEFPOINTS".to_string(),
        "*DIM*".to_string(),
        "*HATCH*".to_string(),
        "*GRID*".to_string(),
        "*AXIS*".to_string(),
    ]
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude_patterns(),
        }
    }
}

/// Rule behavior: per-rule severity overrides and the check failure bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_severities")]
    pub severities: HashMap<String, Severity>,
    /// Minimum severity at which `lintel check` fails.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
}

fn default_severities() -> HashMap<String, Severity> {
    let mut severities = HashMap::new();
    severities.insert("column_min_size".to_string(), Severity::Critical);
    severities.insert("beam_max_span".to_string(), Severity::Warning);
    severities.insert("wall_min_ratio".to_string(), Severity::Critical);
    severities.insert("wall_recommended_ratio".to_string(), Severity::Info);
    severities.insert("column_density".to_string(), Severity::Warning);
    severities.insert("foundation_balance".to_string(), Severity::Warning);
    severities.insert("foundation_excess".to_string(), Severity::Warning);
    severities.insert("slab_compactness".to_string(), Severity::Info);
    severities.insert("column_symmetry".to_string(), Severity::Warning);
    severities
}

fn default_fail_on() -> Severity {
    Severity::Critical
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            severities: default_severities(),
            fail_on: default_fail_on(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `lintel init` to create a valid config file",
                path.display()
            )
        })?;

        config
            .validate()
            .with_context(|| format!("invalid configuration in '{}'", path.display()))?;

        Ok(config)
    }

    /// Find `.lintel.toml` in the given directory or any ancestor. A missing
    /// file means defaults; a file that exists but fails to load is a hard
    /// error, never a silent fallback.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = Some(start.as_path());
        while let Some(candidate) = current {
            let config_path = candidate.join(".lintel.toml");
            if config_path.exists() {
                return Self::load(&config_path);
            }
            current = candidate.parent();
        }
        Ok(Self::default())
    }

    /// Check invariants that deserialization alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        for pattern in &self.layers.exclude {
            Glob::new(pattern).map_err(|e| AnalysisError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// A commented default config file, written by `lintel init`.
    pub fn default_toml() -> String {
        r#"# Lintel configuration
# Classifies structural drawing geometry and checks code compliance.

[thresholds]
# Minimum column cross-section side (m)
min_column_size = 0.25
# Maximum beam clear span (m)
max_beam_span = 8.0
# Minimum wall area as a fraction of the footprint
min_wall_ratio = 0.01
# Recommended wall fraction; ratios below it raise an advisory
recommended_wall_ratio = 0.02
# Maximum floor area served by one column (m²)
max_column_density = 25.0
# Minimum foundations per column
min_foundation_ratio = 1.0
# Maximum foundations per column before the surplus is flagged
max_foundation_ratio = 1.2
# Minimum outline compactness (4πA/P²) for slabs
min_slab_compactness = 0.5
# Maximum drift between the column mass center and median center (m)
max_center_deviation = 2.0

[keywords]
# Substrings matched case-insensitively against layer and block names.
# Earlier lists win when several match.
column = ["kolon", "column", "col", "pillar", "sütun"]
beam = ["kiriş", "kiris", "beam", "träger"]
wall = ["perde", "wall", "duvar", "shear"]
slab = ["döşeme", "doseme", "slab", "floor", "plak", "platte"]
foundation = ["temel", "foundation", "footing", "fundament"]

[fallback]
# Geometry-only classification for shapes with no keyword match
max_column_side = 1.0
max_column_aspect = 1.5
min_beam_aspect = 5.0
min_slab_area = 5.0
max_wall_thickness = 0.5

[layers]
# Layers dropped before classification (glob patterns, case-insensitive)
exclude = ["DEFPOINTS", "*DIM*", "*HATCH*", "*GRID*", "*AXIS*"]

[rules]
# Minimum severity at which `lintel check` fails: info, warning or critical
fail_on = "critical"

[rules.severities]
column_min_size = "critical"
beam_max_span = "warning"
wall_min_ratio = "critical"
wall_recommended_ratio = "info"
column_density = "warning"
foundation_balance = "warning"
foundation_excess = "warning"
slab_compactness = "info"
column_symmetry = "warning"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.thresholds.min_column_size, 0.25);
        assert_eq!(config.thresholds.max_beam_span, 8.0);
        assert_eq!(config.thresholds.min_wall_ratio, 0.01);
        assert_eq!(config.thresholds.recommended_wall_ratio, 0.02);
        assert_eq!(config.thresholds.max_column_density, 25.0);
        assert_eq!(config.thresholds.min_foundation_ratio, 1.0);
        assert_eq!(config.thresholds.max_foundation_ratio, 1.2);
        assert_eq!(config.thresholds.min_slab_compactness, 0.5);
        assert_eq!(config.thresholds.max_center_deviation, 2.0);
    }

    #[test]
    fn test_default_fail_on_is_critical() {
        let config = Config::default();
        assert_eq!(config.rules.fail_on, Severity::Critical);
    }

    #[test]
    fn test_default_severities_cover_all_rules() {
        let severities = default_severities();
        assert_eq!(
            severities.get("column_min_size"),
            Some(&Severity::Critical)
        );
        assert_eq!(severities.get("beam_max_span"), Some(&Severity::Warning));
        assert_eq!(severities.get("slab_compactness"), Some(&Severity::Info));
        assert_eq!(
            severities.get("wall_recommended_ratio"),
            Some(&Severity::Info)
        );
        assert_eq!(
            severities.get("foundation_excess"),
            Some(&Severity::Warning)
        );
        assert_eq!(severities.get("column_symmetry"), Some(&Severity::Warning));
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let toml_str = r#"
[thresholds]
max_beam_span = 10.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.thresholds.max_beam_span, 10.0);
        assert_eq!(config.thresholds.min_column_size, 0.25);
        assert!(!config.keywords.column.is_empty());
    }

    #[test]
    fn test_parse_keyword_override() {
        let toml_str = r#"
[keywords]
column = ["poteau"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.keywords.column, vec!["poteau".to_string()]);
        // Other lists keep their defaults.
        assert!(config.keywords.beam.contains(&"beam".to_string()));
    }

    #[test]
    fn test_parse_severity_override() {
        let toml_str = r#"
[rules]
fail_on = "warning"

[rules.severities]
beam_max_span = "critical"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rules.fail_on, Severity::Warning);
        assert_eq!(
            config.rules.severities.get("beam_max_span"),
            Some(&Severity::Critical)
        );
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = Config {
            thresholds: ThresholdConfig {
                min_column_size: -0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_column_size"));
    }

    #[test]
    fn test_validate_rejects_nan_threshold() {
        let config = Config {
            thresholds: ThresholdConfig {
                max_beam_span: f64::NAN,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let config = Config {
            layers: LayersConfig {
                exclude: vec!["[unclosed".to_string()],
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn test_default_toml_parses_to_defaults() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert_eq!(config.keywords, KeywordConfig::default());
        assert_eq!(config.fallback, FallbackConfig::default());
        assert_eq!(config.layers, LayersConfig::default());
        assert_eq!(config.rules.fail_on, Severity::Critical);
    }

    #[test]
    fn test_load_rejects_invalid_threshold_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".lintel.toml");
        std::fs::write(&path, "[thresholds]\nmin_wall_ratio = -1.0\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("min_wall_ratio"));
    }

    #[test]
    fn test_load_or_default_walks_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("plans").join("floor2");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(".lintel.toml"),
            "[thresholds]\nmax_beam_span = 9.5\n",
        )
        .unwrap();
        let config = Config::load_or_default(&nested).unwrap();
        assert_eq!(config.thresholds.max_beam_span, 9.5);
    }

    #[test]
    fn test_load_or_default_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(config.thresholds.min_column_size, 0.25);
    }
}
