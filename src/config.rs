//! The `seafform` configuration file.
//!
//! ```yaml
//! hosts:
//!   home:
//!     url: https://cloud.example.com/
//!     email: user@example.com
//!     token: 0123abcd
//! vocabulary:
//!   kinds: { texte: text, case: check }
//!   view_modes: { tableau: table }
//!   edit: { oui: "yes", non: "no" }
//! ```

use crate::common::{Error, Result};
use crate::form::Vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SEAFFORM_CONFIG";

/// A Seafile server the command line tool may address as `name:REPO/path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub url: String,
    pub email: String,
    /// Token from an earlier session; preferred over `password`
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Localized tokens, each mapping a localized token to a canonical one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub kinds: BTreeMap<String, String>,
    #[serde(default)]
    pub view_modes: BTreeMap<String, String>,
    #[serde(default)]
    pub edit: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub hosts: BTreeMap<String, HostConfig>,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

impl Config {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        log::debug!("Read configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Read the configuration at `path` if given, else at [`default_path`].
    ///
    /// A missing default file is an empty configuration; a missing file
    /// that was asked for explicitly is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn host(&self, name: &str) -> Result<&HostConfig> {
        self.hosts
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown host {:?}", name)))
    }

    /// Build the vocabulary, rejecting aliases of unknown canonical tokens.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        let mut vocabulary = Vocabulary::new();
        for (localized, canonical) in &self.vocabulary.kinds {
            vocabulary = vocabulary.alias_kind(localized, canonical)?;
        }
        for (localized, canonical) in &self.vocabulary.view_modes {
            vocabulary = vocabulary.alias_view_mode(localized, canonical)?;
        }
        for (localized, canonical) in &self.vocabulary.edit {
            vocabulary = vocabulary.alias_edit(localized, canonical)?;
        }
        Ok(vocabulary)
    }
}

/// `$SEAFFORM_CONFIG`, else `~/.config/seafform.yaml`.
pub fn default_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("seafform.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldKind, ViewMode};

    const SAMPLE: &str = r#"
hosts:
  home:
    url: https://cloud.example.com/
    email: user@example.com
    token: 0123abcd
vocabulary:
  kinds:
    texte: text
    case: check
  view_modes:
    tableau: table
  edit:
    oui: "yes"
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let host = config.host("home").unwrap();
        assert_eq!(host.url, "https://cloud.example.com/");
        assert_eq!(host.token.as_deref(), Some("0123abcd"));
        assert_eq!(host.password, None);
        assert!(config.host("work").is_err());

        let vocabulary = config.vocabulary().unwrap();
        assert_eq!(vocabulary.kind("case"), Some(FieldKind::Boolean));
        assert_eq!(vocabulary.view_mode("tableau"), Some(ViewMode::Table));
        assert_eq!(vocabulary.edit("oui"), Some(true));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_yaml_str("").unwrap();
        assert!(config.hosts.is_empty());
        assert!(config.vocabulary().is_ok());
    }

    #[test]
    fn test_unknown_canonical_token() {
        let config = Config::from_yaml_str("vocabulary:\n  kinds:\n    case: checkbox\n").unwrap();
        assert!(matches!(config.vocabulary(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seafform.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(Config::load(&path).unwrap().hosts.len(), 1);
        assert!(Config::load(dir.path().join("missing.yaml")).is_err());
        assert!(Config::load_or_default(Some(&dir.path().join("missing.yaml"))).is_err());
    }
}
