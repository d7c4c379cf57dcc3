//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::CONFIG_FILE;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project name / directory
    #[arg(default_value = ".")]
    pub name: String,

    /// Use TypeScript for the entry script
    #[arg(long)]
    pub typescript: bool,

    /// Template file extension
    #[arg(long, default_value = "tmpl")]
    pub template_ext: String,
}

impl InitCommand {
    pub fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.name);

        eprintln!("{} Initializing new project...\n", "→".blue());

        // Create project directory if needed
        if self.name != "." {
            fs::create_dir_all(project_dir)
                .context("Failed to create project directory")?;
        }

        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }

        fs::write(&config_path, self.generate_config())
            .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;
        eprintln!("  {} Created {}", "✓".green(), CONFIG_FILE.cyan());

        self.generate_sources(project_dir)?;

        eprintln!(
            "\n{} Project initialized successfully!\n",
            "✓".green().bold()
        );

        eprintln!("  Next steps:");
        if self.name != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        }
        eprintln!("    {} NODE_ENV=development pagepack watch", "→".dimmed());
        eprintln!("    {} pagepack build", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn script_ext(&self) -> &str {
        if self.typescript {
            "ts"
        } else {
            "js"
        }
    }

    fn generate_config(&self) -> String {
        format!(
r#"# Pagepack configuration

[project]
name = "{name}"
version = "0.1.0"

[entries]
main = ["./polyfill.js", "./index.{ext}"]

[pages]
dir = "pages"
extension = "{template_ext}"

[output]
dir = "dist"
clean = true

[dev]
port = 4200
hot = true
"#,
            name = if self.name == "." { "my-site" } else { self.name.as_str() },
            ext = self.script_ext(),
            template_ext = self.template_ext,
        )
    }

    fn generate_sources(&self, project_dir: &Path) -> Result<()> {
        let src_dir = project_dir.join("src");
        let pages_dir = src_dir.join("pages");
        let styles_dir = src_dir.join("styles");
        fs::create_dir_all(&pages_dir)?;
        fs::create_dir_all(&styles_dir)?;

        let files = [
            (
                src_dir.join("polyfill.js"),
                "// Loaded before application code\n".to_string(),
            ),
            (
                src_dir.join(format!("index.{}", self.script_ext())),
                "import './styles/main.scss'\n\nconsole.log('ready')\n".to_string(),
            ),
            (
                styles_dir.join("main.scss"),
                "$accent: #3b82f6;\n\nbody {\n  margin: 0;\n  color: $accent;\n}\n".to_string(),
            ),
            (
                pages_dir.join(format!("index.{}", self.template_ext)),
                "doctype html\nhtml\n  head\n    title Home\n  body\n    h1 Home\n".to_string(),
            ),
        ];

        for (path, content) in files {
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let shown = path.strip_prefix(project_dir).unwrap_or(path.as_path());
            eprintln!("  {} Created {}", "✓".green(), shown.display().to_string().cyan());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::Environment;
    use crate::plan::Planner;
    use tempfile::TempDir;

    #[test]
    fn test_scaffold_resolves() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("site");

        let cmd = InitCommand {
            name: target.display().to_string(),
            typescript: true,
            template_ext: "pug".to_string(),
        };
        cmd.execute().unwrap();

        let config = Config::load(target.join(CONFIG_FILE)).unwrap();
        let plan = Planner::new(&config).resolve(Environment::Development).unwrap();

        assert_eq!(plan.pages().len(), 1);
        assert_eq!(plan.pages()[0].name, "index");
        assert_eq!(plan.entries()[0].scripts.len(), 2);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let cmd = InitCommand {
            name: dir.path().display().to_string(),
            typescript: false,
            template_ext: "tmpl".to_string(),
        };
        assert!(cmd.execute().is_err());
    }
}
