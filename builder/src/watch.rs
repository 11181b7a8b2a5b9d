//! Polling watch mode: rebuild whenever the source tree changes.
//!
//! The watcher re-scans the source tree on a fixed interval and hashes every
//! file's contents, so edits, new files, and deletions all register without
//! OS-specific notification APIs. A detected change starts a debounce
//! window; the rebuild fires once the tree stops moving. Changes that land
//! while a rebuild is running get exactly one follow-up pass.

use chrono::Local;
use fxhash::FxHashMap;
use log::{debug, trace};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::config::SiteConfig;
use crate::error::BuildError;
use crate::site::{self, build_site};
use walkdir::WalkDir;

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Hash every watched file's contents. Files that vanish between the walk
/// and the read are simply absent from the snapshot; the next poll settles
/// them.
pub(crate) fn snapshot(config: &SiteConfig) -> FxHashMap<PathBuf, u64> {
    let skips = site::skip_prefixes(config);
    let mut hashes = FxHashMap::default();
    let walker = WalkDir::new(&config.source_dir)
        .into_iter()
        .filter_entry(|e| site::should_visit(e, &skips));
    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        match fs::read(entry.path()) {
            Ok(bytes) => {
                hashes.insert(entry.path().to_path_buf(), fxhash::hash64(&bytes));
            }
            Err(e) => {
                debug!("could not hash {}: {}", entry.path().display(), e);
            }
        }
    }
    trace!("snapshot: {} file(s) hashed", hashes.len());
    hashes
}

/// Print one line per difference between two snapshots.
fn report_changes(previous: &FxHashMap<PathBuf, u64>, current: &FxHashMap<PathBuf, u64>) {
    for (path, hash) in current {
        match previous.get(path) {
            None => println!("[{}] added: {}", timestamp(), path.display()),
            Some(old) if old != hash => {
                println!("[{}] changed: {}", timestamp(), path.display())
            }
            Some(_) => {}
        }
    }
    for path in previous.keys() {
        if !current.contains_key(path) {
            println!("[{}] removed: {}", timestamp(), path.display());
        }
    }
}

/// Run one build pass and report the outcome. A failing pass keeps the
/// watcher alive.
fn rebuild(config: &SiteConfig) {
    println!("[{}] building...", timestamp());
    match build_site(config) {
        Ok(stats) => {
            if stats.failures.is_empty() {
                println!("[{}] build finished: {}", timestamp(), stats.summary());
            } else {
                println!(
                    "[{}] build finished with errors: {}",
                    timestamp(),
                    stats.summary()
                );
            }
        }
        Err(e) => println!("[{}] build failed: {}", timestamp(), e),
    }
}

/// Build once, then poll for changes until the process is terminated.
pub fn watch(config: &SiteConfig) -> Result<(), BuildError> {
    config.validate()?;
    let poll = Duration::from_millis(config.watch.poll_interval_ms);
    let debounce = Duration::from_millis(config.watch.debounce_ms);

    println!(
        "[{}] watching {} -> {} (poll {}ms)",
        timestamp(),
        config.source_dir.display(),
        config.output_dir.display(),
        config.watch.poll_interval_ms
    );
    rebuild(config);
    let mut previous = snapshot(config);

    loop {
        thread::sleep(poll);
        let current = snapshot(config);
        if current == previous {
            continue;
        }
        report_changes(&previous, &current);

        // Debounce: wait for the tree to stop moving before building.
        let mut settled = current;
        if !debounce.is_zero() {
            loop {
                thread::sleep(debounce);
                let next = snapshot(config);
                if next == settled {
                    break;
                }
                report_changes(&settled, &next);
                settled = next;
            }
        }

        rebuild(config);

        // Changes that landed mid-build get one follow-up pass, not a queue.
        let after = snapshot(config);
        if after != settled {
            debug!("source changed during rebuild, running follow-up pass");
            rebuild(config);
            previous = snapshot(config);
        } else {
            previous = after;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging;
    use tempfile::TempDir;

    fn config_for(root: &std::path::Path) -> SiteConfig {
        SiteConfig {
            source_dir: root.join("site"),
            output_dir: root.join("out"),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_snapshot_hashes_watched_files_only() {
        logging::init_test();
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(site.join(".git")).unwrap();
        fs::write(site.join("page.html"), "<p>x</p>").unwrap();
        fs::write(site.join("logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(site.join(".git/config"), "[core]").unwrap();

        let hashes = snapshot(&config_for(dir.path()));
        assert_eq!(hashes.len(), 2);
        assert!(hashes.contains_key(&site.join("page.html")));
        assert!(hashes.contains_key(&site.join("logo.png")));
    }

    #[test]
    fn test_snapshot_detects_edits_additions_and_deletions() {
        logging::init_test();
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("a.html"), "one").unwrap();
        fs::write(site.join("b.html"), "two").unwrap();
        let config = config_for(dir.path());

        let before = snapshot(&config);
        assert_eq!(before.len(), 2);

        fs::write(site.join("a.html"), "edited").unwrap();
        fs::remove_file(site.join("b.html")).unwrap();
        fs::write(site.join("c.html"), "new").unwrap();
        let after = snapshot(&config);

        assert_ne!(before, after);
        assert_ne!(
            before.get(&site.join("a.html")),
            after.get(&site.join("a.html"))
        );
        assert!(!after.contains_key(&site.join("b.html")));
        assert!(after.contains_key(&site.join("c.html")));
    }

    #[test]
    fn test_snapshot_excludes_output_dir() {
        logging::init_test();
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("page.html"), "<p>x</p>").unwrap();
        let config = SiteConfig {
            source_dir: site.clone(),
            output_dir: site.join("build"),
            ..SiteConfig::default()
        };

        build_site(&config).unwrap();
        let hashes = snapshot(&config);
        assert_eq!(hashes.len(), 1);
        assert!(hashes.contains_key(&site.join("page.html")));
    }

    #[test]
    fn test_identical_trees_produce_equal_snapshots() {
        logging::init_test();
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("page.html"), "<p>stable</p>").unwrap();
        let config = config_for(dir.path());

        assert_eq!(snapshot(&config), snapshot(&config));
    }
}
