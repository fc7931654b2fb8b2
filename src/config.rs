use crate::boundary::BoundaryWarning;
use crate::domain::commit::DEFAULT_RELEASE_TYPES;
use crate::domain::{Compat, ReleasePolicy, Version};
use crate::error::{Result, VersioningError};
use crate::git::resolve_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Project config file names, searched in order in the current directory
pub const PROJECT_CONFIG_FILES: &[&str] = &[".versioning.toml", "versioning.toml"];

/// Pattern used to rewrite `version` in the config file itself
pub const SOURCE_PATTERN: &str = "version = \"{version}\"";

/// Represents the complete configuration for git-version-bump.
///
/// Holds the current version, the release policy switches, commit grammar
/// settings and the files whose embedded version strings are rewritten.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub version: String,

    #[serde(default = "default_true")]
    pub enable_devreleases: bool,

    #[serde(default = "default_true")]
    pub enable_prereleases: bool,

    #[serde(default = "default_true")]
    pub enable_postreleases: bool,

    #[serde(default)]
    pub autostart_default_release: bool,

    #[serde(default)]
    pub compat: Compat,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub files: Vec<TemplateBinding>,

    /// File the config was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_tag_format() -> String {
    "{version}".to_string()
}

fn default_commit_message() -> String {
    "ci(version): apply {version} updates".to_string()
}

/// Returns the default list of types that trigger an in-phase bump.
fn default_release_types() -> Vec<String> {
    DEFAULT_RELEASE_TYPES.iter().map(|t| t.to_string()).collect()
}

/// Commit grammar settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ParserConfig {
    #[serde(default = "default_release_types")]
    pub types: Vec<String>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub strict: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            types: default_release_types(),
            scopes: Vec::new(),
            strict: false,
        }
    }
}

/// One pattern or a list of them
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

/// A file and the pattern(s) locating its version string.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TemplateBinding {
    pub filepath: PathBuf,

    #[serde(alias = "patterns")]
    pub pattern: Patterns,

    /// Write only the release tuple, without epoch or phases
    #[serde(default)]
    pub release_only: bool,

    /// Render for this file in a different flavor
    #[serde(default)]
    pub compat: Option<Compat>,
}

impl TemplateBinding {
    pub fn new(filepath: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        TemplateBinding {
            filepath: filepath.into(),
            pattern: Patterns::One(pattern.into()),
            release_only: false,
            compat: None,
        }
    }

    pub fn patterns(&self) -> Vec<&str> {
        match &self.pattern {
            Patterns::One(p) => vec![p.as_str()],
            Patterns::Many(ps) => ps.iter().map(|p| p.as_str()).collect(),
        }
    }

    /// Check every pattern carries a `{version}` placeholder
    pub fn validate(&self) -> Result<()> {
        for pattern in self.patterns() {
            if !pattern.contains("{version}") {
                return Err(VersioningError::config(format!(
                    "pattern '{}' for {} has no {{version}} placeholder",
                    pattern,
                    self.filepath.display()
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Parse a config document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(VersioningError::config("'version' must not be empty"));
        }
        if !self.tag_format.contains("{version}") {
            return Err(VersioningError::config(format!(
                "tag_format '{}' has no {{version}} placeholder",
                self.tag_format
            )));
        }
        for binding in &self.files {
            binding.validate()?;
        }
        Ok(())
    }

    /// Release policy for the configured switches
    ///
    /// Numeric compat turns every release class off.
    pub fn release_policy(&self) -> ReleasePolicy {
        ReleasePolicy {
            enable_devreleases: self.enable_devreleases,
            enable_prereleases: self.enable_prereleases,
            enable_postreleases: self.enable_postreleases,
            autostart_default_release: self.autostart_default_release,
            compat: self.compat,
        }
        .normalized()
    }

    /// The configured version, parsed under the release policy
    pub fn current_version(&self) -> Result<Version> {
        Version::parse_with(&self.version, self.release_policy())
    }

    /// Non-fatal issues with the configuration itself
    pub fn boundary_warnings(&self) -> Vec<BoundaryWarning> {
        let mut warnings = Vec::new();
        if !self.compat.allows_release_classes()
            && (self.enable_devreleases || self.enable_prereleases || self.enable_postreleases)
        {
            warnings.push(BoundaryWarning::ReleaseClassesDisabled {
                compat: self.compat.to_string(),
            });
        }
        warnings
    }

    /// Every file binding resolved against `root`, including the config
    /// file's own `version` key
    pub fn bindings(&self, root: &Path) -> Vec<TemplateBinding> {
        let mut bindings: Vec<TemplateBinding> = self
            .files
            .iter()
            .map(|b| TemplateBinding {
                filepath: normalize(&resolve_path(root, &b.filepath)),
                ..b.clone()
            })
            .collect();
        if let Some(source) = &self.source {
            let source = normalize(&resolve_path(root, source));
            if !bindings.iter().any(|b| b.filepath == source) {
                bindings.push(TemplateBinding::new(source, SOURCE_PATTERN));
            }
        }
        bindings
    }

    /// Commit message for a version
    pub fn commit_message_for(&self, version: &str) -> String {
        self.commit_message.replace("{version}", version)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Path of the user-level defaults file, if a config directory exists.
pub fn user_defaults_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("git-version-bump").join("config.toml"))
}

/// Loads configuration from file.
///
/// Attempts to locate the project configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `.versioning.toml` in current directory
/// 3. `versioning.toml` in current directory
///
/// The user defaults file (`<config_dir>/git-version-bump/config.toml`) is
/// merged underneath when present.
///
/// # Returns
/// * `Ok(Config)` - Loaded configuration
/// * `Err` - If no project file exists, or a file cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let project = match config_path {
        Some(path) => path.to_path_buf(),
        None => PROJECT_CONFIG_FILES
            .iter()
            .map(|name| Path::new(".").join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                VersioningError::config(format!(
                    "no configuration file found (looked for {})",
                    PROJECT_CONFIG_FILES.join(", ")
                ))
            })?,
    };

    let defaults = user_defaults_path().filter(|path| path.exists());
    load_config_from(&project, defaults.as_deref())
}

/// Loads a project config file, merged over an optional defaults file.
pub fn load_config_from(project: &Path, user_defaults: Option<&Path>) -> Result<Config> {
    let mut merged = toml::Table::new();
    if let Some(path) = user_defaults {
        debug!(path = %path.display(), "loading user defaults");
        merge_tables(&mut merged, read_table(path)?);
    }
    debug!(path = %project.display(), "loading project config");
    merge_tables(&mut merged, read_table(project)?);

    let mut config: Config = toml::Value::Table(merged).try_into()?;
    config.validate()?;
    config.source = Some(
        project
            .canonicalize()
            .unwrap_or_else(|_| project.to_path_buf()),
    );

    for warning in config.boundary_warnings() {
        warn!("{}", warning);
    }
    Ok(config)
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)?;
    Ok(table)
}

/// Merge `overlay` into `base`; nested tables merge, everything else is replaced
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                    continue;
                }
                base.insert(key, toml::Value::Table(incoming));
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
