//! Output formatting: pretty table, CSV, JSON, YAML.
//!
//! Renders entity reports in the format selected by `--format`. Every
//! format works from the same flattened rows (`Entity::to_row`), so list
//! properties always appear as space-joined tokens.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use prtgly_core::{ApplyReport, ChangeSet, Entity, StatusReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

type Row = BTreeMap<String, String>;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render entities in the chosen format.
///
/// Columns are the sorted union of every row's keys. `sort_by` orders the
/// pretty table; the other formats are always sorted row-wise.
pub fn render_entities(
    format: OutputFormat,
    entities: &[&Entity],
    sort_by: Option<&str>,
) -> Result<String, CliError> {
    let rows: Vec<Row> = entities.iter().map(|e| e.to_row()).collect();
    let columns = columns(&rows);

    match format {
        OutputFormat::Pretty => render_table(&columns, &rows, sort_by),
        OutputFormat::Csv => render_csv(&columns, &rows),
        OutputFormat::Json => render_json(&rows),
        OutputFormat::Yaml => render_yaml(&rows),
    }
}

/// Render server status as a two-column listing.
pub fn render_status(format: OutputFormat, status: &StatusReport) -> Result<String, CliError> {
    match format {
        OutputFormat::Pretty => {
            let mut builder = Builder::default();
            builder.push_record(["Key", "Value"]);
            for (key, value) in status {
                builder.push_record([key.as_str(), value.as_str()]);
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Csv => {
            let columns: Vec<String> = status.keys().cloned().collect();
            let row: Row = status.clone();
            render_csv(&columns, std::slice::from_ref(&row))
        }
        OutputFormat::Json => render_json(status),
        OutputFormat::Yaml => render_yaml(status),
    }
}

/// One line per generated query, credential-free.
pub fn render_queries(change_set: &ChangeSet) -> String {
    change_set
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human summary of a reconciliation pass.
pub fn render_summary(change_set: &ChangeSet) -> String {
    format!(
        "{} rule matches, {} objects changed, {} queries",
        change_set.matches,
        change_set.entities_changed,
        change_set.len()
    )
}

/// Human summary of an apply run.
pub fn render_apply_report(report: &ApplyReport, color: bool) -> String {
    let elapsed = report.finished_at - report.started_at;
    let mut out = format!(
        "{} of {} updates applied in {} ms",
        report.succeeded(),
        report.attempted.len(),
        elapsed.num_milliseconds()
    );
    for failure in &report.failures {
        let line = format!(
            "\n  failed: object {} {} = {:?}: {}",
            failure.change.object_id,
            failure.change.property_name,
            failure.change.property_value,
            failure.message
        );
        if color {
            out.push_str(&line.red().to_string());
        } else {
            out.push_str(&line);
        }
    }
    out
}

/// Whether stderr summaries should be colored.
pub fn should_color() -> bool {
    io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn columns(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .flat_map(BTreeMap::keys)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn cells<'a>(columns: &'a [String], row: &'a Row) -> impl Iterator<Item = &'a str> {
    columns
        .iter()
        .map(move |c| row.get(c).map_or("", String::as_str))
}

/// Numeric-aware comparison so `objid` sorts 2 < 10.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

fn render_table(columns: &[String], rows: &[Row], sort_by: Option<&str>) -> Result<String, CliError> {
    let mut ordered: Vec<&Row> = rows.iter().collect();
    if let Some(key) = sort_by {
        if !columns.iter().any(|c| c == key) {
            return Err(CliError::Validation {
                field: "sort-by".into(),
                reason: format!("unknown column '{key}'. Columns: {}", columns.join(", ")),
            });
        }
        ordered.sort_by(|a, b| {
            compare_cells(
                a.get(key).map_or("", String::as_str),
                b.get(key).map_or("", String::as_str),
            )
        });
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(String::as_str));
    for row in ordered {
        builder.push_record(cells(columns, row));
    }
    Ok(builder.build().with(Style::rounded()).to_string())
}

fn render_csv(columns: &[String], rows: &[Row]) -> Result<String, CliError> {
    let mut records: Vec<Vec<&str>> = rows.iter().map(|r| cells(columns, r).collect()).collect();
    records.sort();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns).map_err(output_err)?;
    for record in &records {
        writer.write_record(record).map_err(output_err)?;
    }
    let bytes = writer.into_inner().map_err(output_err)?;
    let text = String::from_utf8(bytes).map_err(output_err)?;
    Ok(text.trim_end().to_owned())
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(data).map_err(output_err)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(output_err)
}

fn output_err(e: impl std::fmt::Display) -> CliError {
    CliError::Output {
        message: e.to_string(),
    }
}
