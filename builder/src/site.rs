//! One-shot site build: walk the source tree, expand templates, copy assets.
//!
//! A build pass is stateless. Every pass wipes the output directory, walks
//! the source tree once, runs each template through a fresh expansion, and
//! mirrors everything else byte-for-byte. A template that fails to expand is
//! logged and recorded in [`BuildStats::failures`]; the rest of the tree
//! still builds. Filesystem failures on the output side abort the pass.

use log::{debug, error, info, warn};
use std::fs;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

use crate::config::{SiteConfig, CONFIG_FILE};
use crate::error::BuildError;
use preprocessor::{normalize_path, Expander, ExpansionError, FsReader};

/// Counters and per-page failures from one build pass.
#[derive(Debug, Default)]
pub struct BuildStats {
    /// Templates expanded and written successfully.
    pub pages_built: usize,
    /// Non-template files copied to the output tree.
    pub assets_copied: usize,
    /// Templates that failed to expand, with the engine error for each.
    pub failures: Vec<(PathBuf, ExpansionError)>,
}

impl BuildStats {
    /// One-line human summary for console output.
    pub fn summary(&self) -> String {
        format!(
            "{} page(s), {} asset(s), {} failure(s)",
            self.pages_built,
            self.assets_copied,
            self.failures.len()
        )
    }
}

/// Path prefixes excluded from the walk: the output tree plus every
/// configured `ignore` entry, resolved against `source_dir`.
pub(crate) fn skip_prefixes(config: &SiteConfig) -> Vec<PathBuf> {
    let mut skips = vec![normalize_path(&config.output_dir)];
    for prefix in &config.ignore {
        skips.push(normalize_path(&config.source_dir.join(prefix)));
    }
    skips
}

/// Walk filter shared by the build pass and the watcher.
///
/// Rejects hidden files and directories (leading `.`; the walk root itself
/// is exempt, since a source dir of `.` is routine), anything under a skip
/// prefix, and stray config files.
pub(crate) fn should_visit(entry: &DirEntry, skips: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let hidden = entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false);
    if hidden {
        return false;
    }
    if entry.file_type().is_file() && entry.file_name() == CONFIG_FILE {
        return false;
    }
    let path = normalize_path(entry.path());
    !skips.iter().any(|skip| path.starts_with(skip))
}

/// Run one full build pass.
///
/// The output directory is removed and recreated, then every file under
/// `source_dir` is either expanded (template extensions) or copied (anything
/// else) to its mirrored output path.
pub fn build_site(config: &SiteConfig) -> Result<BuildStats, BuildError> {
    config.validate()?;
    if !config.source_dir.is_dir() {
        return Err(BuildError::config(format!(
            "source_dir '{}' does not exist",
            config.source_dir.display()
        )));
    }

    if config.output_dir.exists() {
        fs::remove_dir_all(&config.output_dir)
            .map_err(|e| BuildError::io(&config.output_dir, e))?;
    }
    fs::create_dir_all(&config.output_dir).map_err(|e| BuildError::io(&config.output_dir, e))?;

    info!(
        "building {} -> {}",
        config.source_dir.display(),
        config.output_dir.display()
    );

    let skips = skip_prefixes(config);
    let expander = Expander::new(FsReader);
    let mut stats = BuildStats::default();

    let walker = WalkDir::new(&config.source_dir)
        .into_iter()
        .filter_entry(|e| should_visit(e, &skips));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let source_path = entry.path();
        let rel = match source_path.strip_prefix(&config.source_dir) {
            Ok(rel) => rel,
            Err(_) => {
                warn!("skipping {} (outside source tree)", source_path.display());
                continue;
            }
        };
        let dest = config.output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
        }

        if config.is_template(source_path) {
            match expander.expand(source_path) {
                Ok(text) => {
                    fs::write(&dest, text).map_err(|e| BuildError::io(&dest, e))?;
                    stats.pages_built += 1;
                    debug!("expanded {} -> {}", source_path.display(), dest.display());
                }
                Err(e) => {
                    error!("failed to expand {}: {}", source_path.display(), e);
                    stats.failures.push((source_path.to_path_buf(), e));
                }
            }
        } else {
            fs::copy(source_path, &dest).map_err(|e| BuildError::io(&dest, e))?;
            stats.assets_copied += 1;
            debug!("copied {} -> {}", source_path.display(), dest.display());
        }
    }

    if stats.pages_built == 0 && stats.assets_copied == 0 && stats.failures.is_empty() {
        warn!(
            "no files found under '{}'; nothing was built",
            config.source_dir.display()
        );
    }
    info!("build finished: {}", stats.summary());
    Ok(stats)
}
