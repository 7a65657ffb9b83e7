//! Loading and validation of the on-disk TOML config.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Failure modes when reading the config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "read failed: {}", e),
            ConfigError::Parse(e) => write!(f, "parse failed: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "invalid configuration: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read a TOML config file and validate the result.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServiceConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/guestbook.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let dir = std::env::temp_dir().join("guestbook-loader-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        fs::write(
            &path,
            r#"
[chain]
rpc_url = "http://127.0.0.1:9999"

[listener]
bind_address = "127.0.0.1:7070"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:9999");
        assert_eq!(config.listener.bind_address, "127.0.0.1:7070");
        assert_eq!(config.chain.chain_id, 31337);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_values_surface_as_validation_errors() {
        let dir = std::env::temp_dir().join("guestbook-loader-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("invalid.toml");
        fs::write(
            &path,
            r#"
[contract]
address = "not-an-address"
"#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        fs::remove_file(&path).ok();
    }
}
