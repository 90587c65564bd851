//! Report rendering: text for operators, JSON for scripts.
//!
//! Payloads go to stdout. Log lines never do; they stay on stderr (and the
//! optional log file), so `recast run --output json | jq` always sees clean JSON.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command payloads in the format chosen with `--output`.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.render_to(&mut out, payload)
    }

    /// Render to any writer. JSON is pretty-printed and newline-terminated.
    pub fn render_to<T: Render + Serialize>(
        &self,
        out: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        if let OutputFormat::Json = self.format {
            serde_json::to_writer_pretty(&mut *out, payload)?;
            writeln!(out)?;
        } else {
            payload.render_text(out)?;
        }
        Ok(())
    }
}

/// Human-readable form of a payload.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Notice {
        container: String,
        stop_timeout_secs: u64,
    }

    impl Render for Notice {
        fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
            writeln!(w, "{} (stop timeout {}s)", self.container, self.stop_timeout_secs)
        }
    }

    fn notice(container: &str) -> Notice {
        Notice {
            container: container.to_owned(),
            stop_timeout_secs: 30,
        }
    }

    fn rendered(format: OutputFormat, payload: &Notice) -> String {
        let mut out = Vec::new();
        OutputWriter::new(format)
            .render_to(&mut out, payload)
            .expect("rendering should succeed");
        String::from_utf8(out).expect("valid UTF-8")
    }

    #[test]
    fn test_text_output_uses_render_impl() {
        let output = rendered(OutputFormat::Text, &notice("web"));
        assert_eq!(output, "web (stop timeout 30s)\n");
    }

    #[test]
    fn test_json_output_is_newline_terminated_document() {
        let output = rendered(OutputFormat::Json, &notice("web"));

        assert!(output.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("should parse JSON");
        assert_eq!(parsed["container"].as_str(), Some("web"));
        assert_eq!(parsed["stop_timeout_secs"].as_u64(), Some(30));
    }

    #[test]
    fn test_json_output_escapes_container_names() {
        let output = rendered(OutputFormat::Json, &notice("we\"b 컨테이너"));
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("should parse JSON");
        assert_eq!(parsed["container"].as_str(), Some("we\"b 컨테이너"));
    }
}
