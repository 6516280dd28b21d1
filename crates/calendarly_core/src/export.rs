//! Event export to JSON and CSV text.
//!
//! # Responsibility
//! - Render a list of events as downloadable text.
//! - Name the file after the exported month.
//!
//! # Invariants
//! - Dates render as `MM/DD/YYYY`, times as `HH:MM`.
//! - CSV title and description are always quoted with inner quotes doubled.
//! - Output order equals input order.

use crate::model::event::Event;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const CSV_HEADER: &str = "Event ID,Title,Category,Date,Start Time,End Time,Description";

const DATE_FORMAT: &str = "%m/%d/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported export format `{other}`; expected json|csv")),
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Serialize(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize export: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Export text plus the metadata a host needs to offer it as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub content: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ExportId<'a> {
    Number(u64),
    Text(&'a str),
}

#[derive(Serialize)]
struct ExportRow<'a> {
    event_id: ExportId<'a>,
    title: &'a str,
    category: &'static str,
    date: String,
    start_time: String,
    end_time: String,
    description: &'a str,
}

impl<'a> ExportRow<'a> {
    fn from_event(event: &'a Event) -> Self {
        let id = event.id.as_str();
        Self {
            event_id: id
                .parse::<u64>()
                .map_or(ExportId::Text(id), ExportId::Number),
            title: &event.title,
            category: event.category.as_str(),
            date: event.start_time.format(DATE_FORMAT).to_string(),
            start_time: event.start_time.format(TIME_FORMAT).to_string(),
            end_time: event.end_time.format(TIME_FORMAT).to_string(),
            description: event.description.as_deref().unwrap_or(""),
        }
    }

    fn to_csv_line(&self) -> String {
        let id = match self.event_id {
            ExportId::Number(value) => value.to_string(),
            ExportId::Text(value) => value.to_string(),
        };
        [
            id,
            quote(self.title),
            self.category.to_string(),
            self.date.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            quote(self.description),
        ]
        .join(",")
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders `events` in the requested format.
pub fn export_events(events: &[Event], format: ExportFormat) -> Result<String, ExportError> {
    let rows = events.iter().map(ExportRow::from_event).collect::<Vec<_>>();
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(&rows).map_err(ExportError::Serialize),
        ExportFormat::Csv => {
            let mut lines = Vec::with_capacity(rows.len() + 1);
            lines.push(CSV_HEADER.to_string());
            lines.extend(rows.iter().map(ExportRow::to_csv_line));
            Ok(lines.join("\n"))
        }
    }
}

/// `events_<year>_<month>.<ext>`, month 1-based.
pub fn export_file_name(year: i32, month: u32, format: ExportFormat) -> String {
    format!("events_{year}_{month}.{}", format.extension())
}

/// Renders one month's events as a named download.
pub fn export_month(
    events: &[Event],
    year: i32,
    month: u32,
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    Ok(ExportFile {
        file_name: export_file_name(year, month, format),
        content_type: format.content_type(),
        content: export_events(events, format)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{quote, ExportFormat};

    #[test]
    fn quote_doubles_inner_quotes() {
        assert_eq!(quote(r#"say "hi", ok"#), r#""say ""hi"", ok""#);
        assert_eq!(quote(""), r#""""#);
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!(" csv ".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
