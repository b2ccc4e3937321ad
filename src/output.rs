use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use parse_display::{Display, FromStr};

use crate::types::ScheduleResult;
use crate::utils::prelude::*;

/// How a schedule is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromStr, serde::Deserialize, serde::Serialize)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
    Text,
}

pub fn render(result: &ScheduleResult, format: OutputFormat, mut writer: impl Write) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, result)?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, result)?,
        OutputFormat::Text => {
            writeln!(writer, "Print order: {}", result.print_order.iter().join(", "))?;
            writeln!(writer, "Total time: {} minutes", result.total_time)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Render to `path`, or to stdout without one
pub fn render_to(result: &ScheduleResult, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            info!(path = %path.display(), %format, "writing schedule");
            render(result, format, BufWriter::new(File::create(path)?))
        }
        None => {
            let stdout = io::stdout();
            let lock = stdout.lock();
            render(result, format, lock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Duration;

    fn result() -> ScheduleResult {
        ScheduleResult {
            print_order: vec!["M2".into(), "M1".into(), "M3".into()],
            total_time: Duration(270.0),
        }
    }

    fn rendered(format: OutputFormat) -> String {
        let mut buf = vec![];
        render(&result(), format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_report() {
        assert_eq!(
            rendered(OutputFormat::Text),
            "Print order: M2, M1, M3\nTotal time: 270 minutes\n"
        );
    }

    #[test]
    fn json_report() {
        let v: serde_json::Value = serde_json::from_str(&rendered(OutputFormat::Json)).unwrap();
        assert_eq!(v["print_order"], serde_json::json!(["M2", "M1", "M3"]));
        assert_eq!(v["total_time"], serde_json::json!(270.0));
    }

    #[test]
    fn yaml_report() {
        let back: ScheduleResult = serde_yaml::from_str(&rendered(OutputFormat::Yaml)).unwrap();
        assert_eq!(back, result());
    }

    #[test]
    fn format_names() {
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        render_to(&result(), OutputFormat::Text, Some(&path)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("Print order: M2"));
    }
}
