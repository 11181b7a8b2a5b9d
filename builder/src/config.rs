//! TOML configuration parsing for `site.toml`.

use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use preprocessor::normalize_path;

/// Config file name looked up in the working directory when no explicit
/// path is given.
pub const CONFIG_FILE: &str = "site.toml";

/// Site-wide build settings from `site.toml`.
///
/// Every field has a default, so an empty or absent file yields a working
/// configuration: templates under the current directory, output under
/// `build/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root of the source tree the build walks.
    pub source_dir: PathBuf,
    /// Directory the built site is written to. Wiped and recreated on
    /// every build pass.
    pub output_dir: PathBuf,
    /// File extensions treated as templates and run through the expander.
    /// Listed with or without a leading dot; matching is case-insensitive.
    pub template_extensions: Vec<String>,
    /// Extra path prefixes, relative to `source_dir`, excluded from the
    /// build and from watch-mode change detection.
    pub ignore: Vec<PathBuf>,
    /// Watch-mode tuning, from the `[watch]` section.
    pub watch: WatchConfig,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often the watcher re-scans the source tree, in milliseconds.
    pub poll_interval_ms: u64,
    /// Quiet period after a detected change before the rebuild fires, in
    /// milliseconds. Further changes inside the window coalesce.
    pub debounce_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("build"),
            template_extensions: vec!["html".to_string()],
            ignore: Vec::new(),
            watch: WatchConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            poll_interval_ms: 1000,
            debounce_ms: 500,
        }
    }
}

impl SiteConfig {
    /// Parse a configuration from a `site.toml` file on disk.
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuildError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_string(&content)
    }

    /// Parse a configuration from TOML text.
    pub fn from_string(content: &str) -> Result<Self, BuildError> {
        toml::from_str(content)
            .map_err(|e| BuildError::config(format!("failed to parse {}: {}", CONFIG_FILE, e)))
    }

    /// Resolve the effective configuration for a command invocation.
    ///
    /// An explicit path must name an existing file. With no explicit path,
    /// `site.toml` in the working directory is used when present and the
    /// built-in defaults otherwise. The result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, BuildError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    debug!("no {} found, using built-in defaults", CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(BuildError::config("source_dir must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(BuildError::config("output_dir must not be empty"));
        }
        if normalize_path(&self.source_dir) == normalize_path(&self.output_dir) {
            return Err(BuildError::config(
                "output_dir must differ from source_dir",
            ));
        }
        if self.template_extensions.is_empty() {
            return Err(BuildError::config(
                "template_extensions must list at least one extension",
            ));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(BuildError::config(
                "watch.poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Get a summary of the configuration
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Source dir: {}\n", self.source_dir.display()));
        s.push_str(&format!("Output dir: {}\n", self.output_dir.display()));
        s.push_str(&format!(
            "Template extensions: {}\n",
            self.template_extensions.join(", ")
        ));
        s.push_str(&format!("Ignored prefixes: {}\n", self.ignore.len()));
        s.push_str(&format!(
            "Watch: poll {}ms, debounce {}ms\n",
            self.watch.poll_interval_ms, self.watch.debounce_ms
        ));
        s
    }

    /// True when `path`'s extension marks it as a template.
    pub fn is_template(&self, path: &Path) -> bool {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext,
            None => return false,
        };
        self.template_extensions
            .iter()
            .any(|t| ext.eq_ignore_ascii_case(t.trim_start_matches('.')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
source_dir = "site"
output_dir = "public"
template_extensions = ["html", "htm"]
ignore = ["drafts", "notes/private"]

[watch]
poll_interval_ms = 250
debounce_ms = 100
"#;
        let config = SiteConfig::from_string(toml).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("site"));
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.template_extensions, vec!["html", "htm"]);
        assert_eq!(config.ignore.len(), 2);
        assert_eq!(config.watch.poll_interval_ms, 250);
        assert_eq!(config.watch.debounce_ms, 100);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SiteConfig::from_string("").unwrap();
        assert_eq!(config.source_dir, PathBuf::from("."));
        assert_eq!(config.output_dir, PathBuf::from("build"));
        assert_eq!(config.template_extensions, vec!["html"]);
        assert!(config.ignore.is_empty());
        assert_eq!(config.watch.poll_interval_ms, 1000);
        assert_eq!(config.watch.debounce_ms, 500);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_watch_section() {
        let toml = "[watch]\npoll_interval_ms = 50\n";
        let config = SiteConfig::from_string(toml).unwrap();
        assert_eq!(config.watch.poll_interval_ms, 50);
        assert_eq!(config.watch.debounce_ms, 500);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = SiteConfig::from_string("source_dir = [").unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_same_source_and_output() {
        let toml = "source_dir = \"www\"\noutput_dir = \"./www\"\n";
        let config = SiteConfig::from_string(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("differ"));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let toml = "[watch]\npoll_interval_ms = 0\n";
        let config = SiteConfig::from_string(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_extension_list() {
        let toml = "template_extensions = []\n";
        let config = SiteConfig::from_string(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_template_ignores_case_and_dots() {
        let toml = "template_extensions = [\".html\", \"HTM\"]\n";
        let config = SiteConfig::from_string(toml).unwrap();
        assert!(config.is_template(Path::new("index.html")));
        assert!(config.is_template(Path::new("a/b/PAGE.HTML")));
        assert!(config.is_template(Path::new("old.htm")));
        assert!(!config.is_template(Path::new("style.css")));
        assert!(!config.is_template(Path::new("README")));
    }

    #[test]
    fn test_summary_mentions_dirs() {
        let config = SiteConfig::default();
        let s = config.summary();
        assert!(s.contains("Source dir"));
        assert!(s.contains("build"));
    }
}
