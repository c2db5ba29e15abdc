//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::FerriteConfig;
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file name looked up in a design directory.
pub const CONFIG_FILE_NAME: &str = "ferrite.toml";

/// Loads and validates a `ferrite.toml` configuration.
///
/// `path` may name the file itself or a directory containing
/// [`CONFIG_FILE_NAME`].
pub fn load_config(path: &Path) -> Result<FerriteConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `ferrite.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<FerriteConfig, ConfigError> {
    let config: FerriteConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates value ranges and corner uniqueness.
fn validate_config(config: &FerriteConfig) -> Result<(), ConfigError> {
    let resizer = &config.resizer;
    if !(resizer.target_slew_load_cap_factor > 0.0) {
        return Err(ConfigError::ValidationError(
            "resizer.target_slew_load_cap_factor must be positive".to_string(),
        ));
    }
    if let Some(util) = resizer.max_utilization {
        if !(util > 0.0 && util <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "resizer.max_utilization must be in (0, 1], got {util}"
            )));
        }
    }
    if config.tie.separation_um < 0.0 {
        return Err(ConfigError::ValidationError(
            "tie.separation_um must not be negative".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for (i, corner) in config.corners.iter().enumerate() {
        if corner.name.is_empty() {
            return Err(ConfigError::MissingField(format!("corners[{i}].name")));
        }
        if !names.insert(corner.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate corner '{}'",
                corner.name
            )));
        }
        if corner.delay_scale <= 0.0 || corner.slew_scale <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "corner '{}' scales must be positive",
                corner.name
            )));
        }
        if corner.wire_res_per_um < 0.0 || corner.wire_cap_ff_per_um < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "corner '{}' wire RC must not be negative",
                corner.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParasiticsSource;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(!config.resizer.match_cell_footprint);
        assert!(config.resizer.exclude_clock_buffers);
        assert_eq!(config.resizer.parasitics_source, ParasiticsSource::Placement);
        assert_eq!(config.resizer.target_slew_load_cap_factor, 10.0);
        assert!(config.corners.is_empty());
        assert_eq!(config.tie.separation_um, 0.0);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[resizer]
match_cell_footprint = true
exclude_clock_buffers = false
parasitics_source = "detailed_routing"
target_slew_load_cap_factor = 8.0
dont_use = ["*_DLY*", "CLKBUF_X1"]
max_utilization = 0.7

[tie]
separation_um = 1.5

[[corners]]
name = "ss"
delay_scale = 1.3
slew_scale = 1.25
wire_res_per_um = 3.5
wire_cap_ff_per_um = 0.2

[[corners]]
name = "ff"
delay_scale = 0.8
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.resizer.match_cell_footprint);
        assert!(!config.resizer.exclude_clock_buffers);
        assert!(config.resizer.parasitics_source.is_routing());
        assert_eq!(config.resizer.dont_use.len(), 2);
        assert_eq!(config.resizer.max_utilization, Some(0.7));
        assert_eq!(config.tie.separation_um, 1.5);
        assert_eq!(config.corners.len(), 2);
        assert_eq!(config.corners[0].wire_res_per_um, 3.5);
        assert_eq!(config.corners[1].slew_scale, 1.0);
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn duplicate_corner_errors() {
        let toml = r#"
[[corners]]
name = "tt"
[[corners]]
name = "tt"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_corner_name_errors() {
        let err = load_config_from_str("[[corners]]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn utilization_out_of_range_errors() {
        let err = load_config_from_str("[resizer]\nmax_utilization = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[tie]\nseparation_um = 2.0\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.tie.separation_um, 2.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
