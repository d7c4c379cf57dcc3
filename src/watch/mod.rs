//! Re-resolve the plan when the project changes
//!
//! The environment is fixed for the whole session. Every relevant change
//! reloads the config, resolves a fresh plan and hands it off again if its
//! fingerprint differs from the last one handed off.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::new_debouncer;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::bundler;
use crate::config::Config;
use crate::env::Environment;
use crate::plan::Planner;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches a project and keeps its handed-off plan current
pub struct PlanWatcher {
    config_path: PathBuf,
    environment: Environment,
    last_fingerprint: Option<String>,
}

impl PlanWatcher {
    pub fn new(config_path: PathBuf, environment: Environment) -> Self {
        Self {
            config_path,
            environment,
            last_fingerprint: None,
        }
    }

    /// Run until Ctrl+C
    pub async fn run(mut self) -> Result<()> {
        let config = Config::load(&self.config_path)?;
        let config_path = config.root.join(
            self.config_path
                .file_name()
                .context("Config path has no file name")?,
        );
        let source_dir = config.source_dir();
        let output_dir = config.output_dir();

        let mut roots = vec![source_dir.clone()];
        if let Some(pages_dir) = config.page_source().watch_dir() {
            if !pages_dir.starts_with(&source_dir) && pages_dir.is_dir() {
                roots.push(pages_dir.to_path_buf());
            }
        }

        self.refresh().await;

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(DEBOUNCE, tx)?;
        for root in &roots {
            debouncer
                .watcher()
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", root.display()))?;
        }
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", config_path.display()))?;

        // Bridge the blocking debouncer channel into the async loop
        let (changes_tx, mut changes_rx) = mpsc::unbounded_channel::<PathBuf>();
        std::thread::spawn(move || {
            // Keep debouncer alive for the duration of the watcher
            let _debouncer = debouncer;

            loop {
                match rx.recv() {
                    Ok(Ok(events)) => {
                        for event in events {
                            if changes_tx.send(event.path).is_err() {
                                return;
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        error!("Watch error: {:?}", e);
                    }
                    Err(_) => break,
                }
            }
        });

        for root in &roots {
            info!("Watching {}", root.display());
        }

        loop {
            tokio::select! {
                changed = changes_rx.recv() => {
                    let Some(path) = changed else { break };
                    if !is_relevant(&path, &config_path, &roots, &output_dir) {
                        continue;
                    }
                    // Drain the rest of the burst
                    while changes_rx.try_recv().is_ok() {}

                    eprintln!(
                        "  {} Changed: {}",
                        "↻".yellow(),
                        path.display().to_string().dimmed()
                    );
                    self.refresh().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("Stopping watcher");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Resolve and hand off once, logging failures instead of stopping
    async fn refresh(&mut self) {
        match self.try_refresh().await {
            Ok(true) => {}
            Ok(false) => debug!("Plan unchanged, skipping handoff"),
            Err(e) => error!("{:#}", e),
        }
    }

    async fn try_refresh(&mut self) -> Result<bool> {
        let config = Config::load(&self.config_path)?;
        let plan = Planner::new(&config).resolve(self.environment)?;
        let fingerprint = plan.fingerprint()?;

        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return Ok(false);
        }

        let bundler = bundler::from_config(&config, &plan)?;
        let report = bundler.run(&plan).await?;

        eprintln!(
            "  {} Plan {} handed to {} ({} page(s))",
            "✓".green(),
            report.fingerprint.cyan(),
            bundler.name(),
            plan.pages().len()
        );

        self.last_fingerprint = Some(fingerprint);
        Ok(true)
    }
}

/// Whether a changed path can affect the plan
fn is_relevant(path: &Path, config_path: &Path, roots: &[PathBuf], output_dir: &Path) -> bool {
    if path == config_path {
        return true;
    }
    roots.iter().any(|root| path.starts_with(root)) && !path.starts_with(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_relevant() {
        let config = Path::new("/p/pagepack.toml");
        let roots = [PathBuf::from("/p/src"), PathBuf::from("/p/templates")];
        let dist = Path::new("/p/dist");

        assert!(is_relevant(config, config, &roots, dist));
        assert!(is_relevant(Path::new("/p/src/app.js"), config, &roots, dist));
        assert!(is_relevant(Path::new("/p/templates/new.tmpl"), config, &roots, dist));
        assert!(!is_relevant(Path::new("/p/dist/build-plan.json"), config, &roots, dist));
        assert!(!is_relevant(Path::new("/p/README.md"), config, &roots, dist));
    }

    #[test]
    fn test_output_inside_source_is_ignored() {
        let config = Path::new("/p/pagepack.toml");
        let roots = [PathBuf::from("/p")];
        let dist = Path::new("/p/dist");

        assert!(!is_relevant(Path::new("/p/dist/main.js"), config, &roots, dist));
        assert!(is_relevant(Path::new("/p/index.js"), config, &roots, dist));
    }

    #[tokio::test]
    async fn test_refresh_skips_unchanged_plan() {
        use std::fs;

        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("pages")).unwrap();
        fs::write(src.join("index.js"), "").unwrap();
        fs::write(src.join("pages").join("index.tmpl"), "").unwrap();
        let config_path = dir.path().join("pagepack.toml");
        fs::write(&config_path, "[project]\nname = \"site\"\n\n[entries]\nmain = \"index.js\"\n").unwrap();

        let mut watcher = PlanWatcher::new(config_path, Environment::Development);
        assert!(watcher.try_refresh().await.unwrap());
        assert!(!watcher.try_refresh().await.unwrap());

        fs::write(src.join("pages").join("about.tmpl"), "").unwrap();
        assert!(watcher.try_refresh().await.unwrap());
    }
}
