//! Console sink implementation

use crate::core::format::format_text;
use crate::core::{LogRecord, OutputFormat, Result, Sink, TimestampFormat};
use async_trait::async_trait;
use colored::Colorize;

/// Synchronous sink writing each record to stdout, or stderr for error and fatal.
pub struct ConsoleSink {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set the output format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use log_fanout::sinks::ConsoleSink;
    /// use log_fanout::OutputFormat;
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Render a record exactly as `write` would print it
    pub fn render(&self, record: &LogRecord) -> String {
        match self.output_format {
            OutputFormat::Text if self.use_colors => {
                let label = format!("{:5}", record.level.label())
                    .color(record.level.color_code())
                    .to_string();
                format_text(record, &self.timestamp_format, &label)
            }
            _ => self.output_format.format(record, &self.timestamp_format),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let output = self.render(record);

        if record.level.is_severe() {
            eprintln!("{}", output);
        } else {
            println!("{}", output);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, LogLevel, Properties};

    #[test]
    fn test_plain_render() {
        let sink = ConsoleSink::with_colors(false);
        let record = LogRecord::new(Category::from(["app"]), LogLevel::Warning, "disk at 91%")
            .with_properties(Properties::new().with("mount", "/var"));

        let output = sink.render(&record);
        assert!(output.contains("[WARN ] app - disk at 91%"));
        assert!(output.ends_with("mount=/var"));
    }

    #[test]
    fn test_json_render_ignores_colors() {
        let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
        let record = LogRecord::new(Category::from(["app"]), LogLevel::Error, "boom");

        let parsed: serde_json::Value = serde_json::from_str(&sink.render(&record)).unwrap();
        assert_eq!(parsed["level"], "error");
    }

    #[test]
    fn test_write_never_fails() {
        let sink = ConsoleSink::with_colors(false);
        for level in LogLevel::ALL {
            let record = LogRecord::new(Category::from(["app"]), level, "message");
            assert!(sink.write(&record).is_ok());
        }
    }
}
