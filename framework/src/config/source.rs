//! Configuration sources
//!
//! Every source produces a flat list of `(key, value)` pairs where nested
//! sections are joined with [`KEY_DELIMITER`]. The builder applies the
//! sources in registration order, so later pairs replace earlier ones.

use super::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Separator between section names in a configuration key
pub const KEY_DELIMITER: &str = ":";

/// Environment variable separator that maps to [`KEY_DELIMITER`]
const ENV_DELIMITER: &str = "__";

/// Environment variable prefixes that map onto `ConnectionStrings:{name}`
const CONNECTION_STRING_PREFIXES: [&str; 4] = [
    "MYSQLCONNSTR_",
    "SQLAZURECONNSTR_",
    "SQLCONNSTR_",
    "CUSTOMCONNSTR_",
];

/// A registered configuration source
#[derive(Debug, Clone)]
pub(crate) enum Source {
    /// A JSON settings file, relative to the builder's base path
    Json { path: PathBuf, optional: bool },
    /// Process environment variables, optionally filtered by a prefix
    EnvironmentVariables { prefix: Option<String> },
    /// Literal pairs
    Memory(Vec<(String, String)>),
}

impl Source {
    /// Human readable description, used in logs
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Json { path, optional } => {
                format!("json:{}{}", path.display(), if *optional { " (optional)" } else { "" })
            }
            Self::EnvironmentVariables { prefix: Some(p) } => format!("env:{}*", p),
            Self::EnvironmentVariables { prefix: None } => "env".to_string(),
            Self::Memory(pairs) => format!("memory:{} keys", pairs.len()),
        }
    }

    /// Read the source into flattened pairs
    ///
    /// Returns `Ok(None)` for an optional file that does not exist.
    pub(crate) fn load(&self) -> Result<Option<Vec<(String, String)>>, ConfigError> {
        match self {
            Self::Json { path, optional } => load_json_file(path, *optional),
            Self::EnvironmentVariables { prefix } => {
                Ok(Some(map_environment(std::env::vars(), prefix.as_deref())))
            }
            Self::Memory(pairs) => Ok(Some(pairs.clone())),
        }
    }
}

fn load_json_file(path: &Path, optional: bool) -> Result<Option<Vec<(String, String)>>, ConfigError> {
    if !path.is_file() {
        if optional {
            return Ok(None);
        }
        return Err(ConfigError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if !value.is_object() {
        return Err(ConfigError::InvalidRoot {
            path: path.to_path_buf(),
        });
    }

    let mut pairs = Vec::new();
    flatten_json(&value, None, &mut pairs);
    Ok(Some(pairs))
}

/// Flatten a JSON document into `section:key` pairs
///
/// Objects nest with `:`, array elements use their index, scalars keep their
/// JSON text (strings unquoted) and `null` becomes the empty string.
pub(crate) fn flatten_json(value: &Value, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{}{}{}", p, KEY_DELIMITER, key),
        None => key.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_json(child, Some(&join(key)), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_json(child, Some(&join(&index.to_string())), out);
            }
        }
        scalar => {
            // Scalars only ever appear below a key
            if let Some(key) = prefix {
                let text = match scalar {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                out.push((key.to_string(), text));
            }
        }
    }
}

/// Map environment variables onto configuration keys
pub(crate) fn map_environment(
    vars: impl IntoIterator<Item = (String, String)>,
    prefix: Option<&str>,
) -> Vec<(String, String)> {
    vars.into_iter()
        .filter_map(|(name, value)| {
            let name = match prefix {
                Some(p) => strip_prefix_ignore_case(&name, p)?,
                None => name.as_str(),
            };
            if name.is_empty() {
                return None;
            }
            Some((environment_key(name), value))
        })
        .collect()
}

fn environment_key(name: &str) -> String {
    for connection_prefix in CONNECTION_STRING_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_case(name, connection_prefix) {
            if !rest.is_empty() {
                return format!(
                    "ConnectionStrings{}{}",
                    KEY_DELIMITER,
                    rest.replace(ENV_DELIMITER, KEY_DELIMITER)
                );
            }
        }
    }
    name.replace(ENV_DELIMITER, KEY_DELIMITER)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}
