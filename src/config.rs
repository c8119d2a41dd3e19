pub mod dialect;

use clap::ValueEnum;
use eyre::{Context, ContextCompat, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use dialect::{Dialect, DialectOverrides, Preset};

/// How a directive nested inside an open directive of the same type is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NestingPolicy {
    /// Rewrite nested blocks silently
    #[default]
    Allow,
    /// Rewrite nested blocks and report a warning
    Warn,
    /// Reject the template
    Deny,
}

/// Main configuration for the directive compiler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Base configuration to extend from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Output dialect preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Preset>,
    /// Template overrides on top of the preset
    #[serde(default)]
    pub overrides: DialectOverrides,
    /// Same-type nesting policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nesting: Option<NestingPolicy>,
    /// File patterns that should be treated as templates
    #[serde(default)]
    pub template_files: Vec<String>,
    /// File patterns to ignore
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path()?,
        };

        if config_file.exists() {
            Self::load_file(&config_file, &mut Vec::new())
        } else if config_path.is_some() {
            Err(eyre::eyre!("Config file not found: {}", config_file.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Load one config file and its `extends` chain; `chain` holds the files already being loaded
    fn load_file(config_file: &Path, chain: &mut Vec<PathBuf>) -> Result<Self> {
        let canonical = config_file
            .canonicalize()
            .with_context(|| format!("Failed to resolve config file: {}", config_file.display()))?;

        if chain.contains(&canonical) {
            return Err(eyre::eyre!(
                "Circular extends: {} is already being loaded",
                config_file.display()
            ));
        }
        chain.push(canonical);

        let content = fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_file.display()))?;

        // Files without `extends` still inherit the defaults
        let base_name = config.extends.clone().unwrap_or_else(|| "default".to_string());
        let base_config = Self::load_base_config(&base_name, config_file, chain)?;
        tracing::debug!(path = %config_file.display(), base = %base_name, "loaded config file");

        config.merge_with_base(base_config)
    }

    /// Load a base configuration by name
    fn load_base_config(base_name: &str, current_config_path: &Path, chain: &mut Vec<PathBuf>) -> Result<Self> {
        match base_name {
            "default" => Ok(Self::default()),
            "strict" => Ok(Self::strict()),
            _ => {
                let base_path = if base_name.starts_with('/') {
                    PathBuf::from(base_name)
                } else {
                    current_config_path
                        .parent()
                        .unwrap_or_else(|| Path::new("."))
                        .join(base_name)
                };

                if base_path.exists() {
                    Self::load_file(&base_path, chain)
                } else {
                    Err(eyre::eyre!("Base configuration '{}' not found", base_name))
                }
            }
        }
    }

    /// Merge this configuration with a base configuration
    fn merge_with_base(mut self, base: Self) -> Result<Self> {
        self.dialect = self.dialect.or(base.dialect);
        self.nesting = self.nesting.or(base.nesting);
        self.overrides = self.overrides.merge_with_base(base.overrides);

        if self.template_files.is_empty() {
            self.template_files = base.template_files;
        }

        if self.ignore.is_empty() {
            self.ignore = base.ignore;
        }

        Ok(self)
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let candidates = vec![
            PathBuf::from(".azd.yaml"),
            PathBuf::from(".azd.yml"),
            PathBuf::from("azd.yaml"),
            PathBuf::from("azd.yml"),
        ];

        for candidate in candidates {
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        let config_dir = dirs::config_local_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .context("Could not determine config directory")?;

        Ok(config_dir.join("azd").join("config.yaml"))
    }

    /// Effective nesting policy
    pub fn nesting(&self) -> NestingPolicy {
        self.nesting.unwrap_or_default()
    }

    /// Build and validate the effective dialect
    pub fn resolve_dialect(&self) -> Result<Dialect> {
        let mut dialect = self.dialect.unwrap_or_default().dialect();
        self.overrides.apply(&mut dialect);
        dialect
            .validate()
            .with_context(|| format!("Invalid '{}' dialect", self.dialect.unwrap_or_default()))?;
        Ok(dialect)
    }

    /// Check if a file should be ignored based on ignore patterns
    pub fn is_file_ignored(&self, file_path: &Path) -> bool {
        let path_str = file_path.to_string_lossy();

        self.ignore.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_matches(pattern, &path_str, false)
            } else {
                path_str.contains(pattern.as_str())
            }
        })
    }

    /// Check if a file should be treated as a template
    pub fn is_template_file(&self, file_path: &Path) -> bool {
        let path_str = file_path.to_string_lossy();

        self.template_files.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_matches(pattern, &path_str, true)
            } else {
                path_str.ends_with(pattern.as_str())
            }
        })
    }

    /// Create a strict configuration preset
    pub fn strict() -> Self {
        Self {
            nesting: Some(NestingPolicy::Deny),
            ..Self::default()
        }
    }
}

/// Simple glob matching: `*` matches any run of characters, everything else is literal
fn glob_matches(pattern: &str, path: &str, anchor_end: bool) -> bool {
    let mut pattern_regex = regex::escape(pattern).replace(r"\*", ".*");
    if anchor_end {
        pattern_regex.push('$');
    }

    regex::Regex::new(&pattern_regex)
        .map(|re| re.is_match(path))
        .unwrap_or(false)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extends: None,
            dialect: Some(Preset::Blade),
            overrides: DialectOverrides::default(),
            nesting: Some(NestingPolicy::Allow),
            template_files: vec!["*.blade.php".to_string()],
            ignore: vec![
                "vendor/**".to_string(),
                "node_modules/**".to_string(),
                "storage/**".to_string(),
                ".git/**".to_string(),
            ],
        }
    }
}
