//! `recast config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use recast_core::config::{GeneralConfig, RecastConfig};

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::logging;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
pub const SECTIONS: [&str; 4] = ["general", "docker", "run", "filters"];

/// Execute the `config` command.
///
/// Logs go to stderr at `log_level` (default `warn`) since the file being
/// inspected may itself be broken.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    explicit: bool,
    log_level: Option<&str>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let general = GeneralConfig {
        log_level: log_level.unwrap_or("warn").to_owned(),
        ..GeneralConfig::default()
    };
    logging::init_tracing(&general)?;

    match args.action {
        ConfigAction::Validate => {
            let report = validate(config_path, explicit).await;
            writer.render(&report)?;
            if !report.valid {
                return Err(CliError::Config("configuration is invalid".to_owned()));
            }
            Ok(())
        }
        ConfigAction::Show { section } => {
            let report = show(config_path, explicit, section.as_deref()).await?;
            writer.render(&report)
        }
    }
}

/// Load and validate the configuration, collecting the outcome into a report.
pub async fn validate(config_path: &Path, explicit: bool) -> ConfigValidationReport {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match RecastConfig::load_or_default(config_path, explicit).await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };
    ConfigValidationReport {
        source: source_label(config_path),
        valid: errors.is_empty(),
        errors,
    }
}

/// Render the effective configuration (defaults + file + env overrides).
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if the
/// section name is unknown.
pub async fn show(
    config_path: &Path,
    explicit: bool,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = RecastConfig::load_or_default(config_path, explicit).await?;
    let rendered = match section {
        None => toml::to_string_pretty(&config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("docker") => toml::to_string_pretty(&config.docker),
        Some("run") => toml::to_string_pretty(&config.run),
        Some("filters") => toml::to_string_pretty(&config.filters),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: {})",
                SECTIONS.join(", ")
            )));
        }
    };

    Ok(ConfigReport {
        source: source_label(config_path),
        section: section.map(str::to_owned),
        config_toml: rendered.map_err(|e| CliError::Command(format!("serialize config: {e}")))?,
    })
}

fn source_label(config_path: &Path) -> String {
    if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} (not found, defaults)", config_path.display())
    }
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Render>(report: &T) -> String {
        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_config_report_render_text_section() {
        let report = ConfigReport {
            source: "/etc/recast/recast.toml".to_owned(),
            section: Some("run".to_owned()),
            config_toml: "dry_run = false\n".to_owned(),
        };

        let output = render(&report);
        assert!(output.contains("[run]"), "should show section name");
        assert!(output.contains("dry_run"), "should show config content");
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = ConfigReport {
            source: "recast.toml".to_owned(),
            section: None,
            config_toml: "x = 1".to_owned(),
        };

        let json = serde_json::to_string(&report).expect("JSON serialization should succeed");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should parse JSON");

        assert_eq!(parsed["source"].as_str(), Some("recast.toml"));
        assert!(parsed.get("section").is_none());
        assert!(parsed.get("config_toml").is_none());
    }

    #[test]
    fn test_config_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            errors: vec!["invalid value for run.stop_timeout_secs".to_owned()],
        };

        let output = render(&report);
        assert!(output.contains("INVALID"));
        assert!(output.contains("run.stop_timeout_secs"));
    }

    #[test]
    fn test_config_validation_report_valid() {
        let report = ConfigValidationReport {
            source: "recast.toml".to_owned(),
            valid: true,
            errors: Vec::new(),
        };

        let output = render(&report);
        assert!(output.contains("VALID"));
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn test_source_label_marks_missing_file() {
        let label = source_label(Path::new("/nonexistent/recast.toml"));
        assert!(label.contains("defaults"));
    }
}
