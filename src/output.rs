//! Output formatting for scan responses

use crate::auditor::performance::{Impact, PerformanceReport};
use crate::auditor::tech::{ComponentInfo, TechReport};
use crate::auditor::{PerformanceAuditor, TechFingerprintAuditor};
use crate::error::{Error, Result};
use crate::orchestrator::ScanResponse;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL,
};
use serde_json::Value;
use std::io::Write;
use std::str::FromStr;

/// Placeholder for unknown values
const UNKNOWN: &str = "-";

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table output
    #[default]
    Human,
    /// JSON output
    Json,
    /// No output (silent mode)
    None,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            _ => Err(Error::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Output a scan response produced by `auditor`
pub fn output_response<W: Write>(
    auditor: &str,
    response: &ScanResponse,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Human => output_human(auditor, response, writer),
        OutputFormat::Json => output_json(response, writer),
        OutputFormat::None => Ok(()),
    }
}

/// Output JSON format
fn output_json<W: Write>(response: &ScanResponse, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, response)?;
    writeln!(writer).map_err(Error::OutputFailed)?;
    Ok(())
}

/// Output human-readable table format
fn output_human<W: Write>(auditor: &str, response: &ScanResponse, writer: &mut W) -> Result<()> {
    if let Some(error) = &response.error {
        return writeln!(writer, "{}: {}", error.code, error.message).map_err(Error::OutputFailed);
    }

    let data = Value::Object(response.data.clone().unwrap_or_default());
    let table = match auditor {
        PerformanceAuditor::NAME => performance_table(&serde_json::from_value(data)?),
        TechFingerprintAuditor::NAME => tech_table(&serde_json::from_value(data)?),
        _ => return output_json(response, writer),
    };

    writeln!(writer, "{}", table).map_err(Error::OutputFailed)
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn performance_table(report: &PerformanceReport) -> Table {
    let mut table = new_table(&["Category", "Score", "Audit", "Impact"]);

    for (key, audits) in &report.audits {
        let summary = report.categories.get(key);
        let score = summary
            .and_then(|c| c.score)
            .map(|s| format!("{:.0}", s * 100.0))
            .unwrap_or_else(|| UNKNOWN.to_string());
        let title = summary.map_or(key.as_str(), |c| c.title.as_str());

        table.add_row(vec![
            Cell::new(title).add_attribute(Attribute::Bold),
            Cell::new(score).set_alignment(CellAlignment::Right),
            Cell::new(""),
            Cell::new(""),
        ]);

        for audit in audits {
            let score = audit
                .score
                .map_or_else(|| UNKNOWN.to_string(), |s| s.to_string());
            table.add_row(vec![
                Cell::new(""),
                Cell::new(score).set_alignment(CellAlignment::Right),
                Cell::new(&audit.audit),
                impact_cell(audit.impact),
            ]);
        }
    }

    table
}

fn impact_cell(impact: Impact) -> Cell {
    let color = match impact {
        Impact::High => Color::Red,
        Impact::Medium => Color::Yellow,
        Impact::Low => Color::Green,
    };
    Cell::new(impact.to_string())
        .fg(color)
        .set_alignment(CellAlignment::Center)
}

fn tech_table(report: &TechReport) -> Table {
    let mut table = new_table(&["Type", "Name", "Version", "Latest", "Status"]);

    match &report.theme {
        Some(theme) => add_component_row(&mut table, "Theme", theme),
        None => add_not_found_row(&mut table, "Theme"),
    }

    if report.plugins.is_empty() {
        add_not_found_row(&mut table, "Plugin");
    }
    for plugin in report.plugins.values() {
        add_component_row(&mut table, "Plugin", plugin);
    }

    table
}

/// Add a row for a component to the table
fn add_component_row(table: &mut Table, kind: &str, component: &ComponentInfo) {
    let status_cell = match component.outdated {
        Some(false) => Cell::new("Ok").fg(Color::Green),
        Some(true) => Cell::new("Outdated").fg(Color::Yellow),
        None => Cell::new("Unknown").fg(Color::DarkGrey),
    }
    .set_alignment(CellAlignment::Center);

    fn or_unknown(value: Option<&String>) -> &str {
        value.map_or(UNKNOWN, String::as_str)
    }
    let name = component.name.as_ref().or(component.slug.as_ref());

    table.add_row(vec![
        Cell::new(kind),
        Cell::new(or_unknown(name)),
        Cell::new(or_unknown(component.current_version.as_ref())),
        Cell::new(or_unknown(component.new_version.as_ref())),
        status_cell,
    ]);
}

fn add_not_found_row(table: &mut Table, kind: &str) {
    table.add_row(vec![
        Cell::new(kind),
        Cell::new(UNKNOWN),
        Cell::new(UNKNOWN),
        Cell::new(UNKNOWN),
        Cell::new("Not Found")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Center),
    ]);
}
