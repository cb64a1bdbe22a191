use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value as Json};
use sfconfig_diff::FieldDiff;
use sfconfig_types::{ChangeRecord, FieldType};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One field as reported by `inspect`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub value: Json,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub config_version: Option<String>,
    pub sf_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub fields: Vec<FieldEntry>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub success: bool,
    /// `None` on a dry run.
    pub output_path: Option<String>,
    pub config_version: Option<String>,
    pub sf_version: Option<String>,
    pub changes: Vec<ChangeRecord>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub config_version_a: Option<String>,
    pub config_version_b: Option<String>,
    pub sf_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub differences: Vec<FieldDiff>,
    pub total_differences: usize,
}

/// Successful result of a command.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Inspect(InspectReport),
    Build(BuildReport),
    Diff(DiffReport),
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Print a report on stdout.
pub fn print_report(report: &Report, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Text => print!("{}", render_text(report)),
    }
    Ok(())
}

/// The error envelope: `{success: false, error, errorType, details}`.
pub fn error_envelope(err: &CliError) -> Json {
    json!({
        "success": false,
        "error": err.message,
        "errorType": err.kind.as_str(),
        "details": err.details,
    })
}

/// Print an error. JSON envelopes go to stdout with the other results.
pub fn print_error(err: &CliError, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", error_envelope(err)),
        OutputFormat::Text => {
            eprintln!("{} {}", format!("error[{}]:", err.kind).red().bold(), err.message);
            for (key, value) in &err.details {
                eprintln!("  {}: {}", key.dimmed(), scalar_text(value));
            }
        }
    }
}

fn render_text(report: &Report) -> String {
    let mut out = String::new();
    match report {
        Report::Inspect(r) => {
            out += &versions_line(&r.config_version, &r.sf_version);
            if let Some(warning) = &r.warning {
                out += &format!("{} {}\n", "warning:".yellow().bold(), warning);
            }
            for field in &r.fields {
                let marker = if field.editable { "✎".green().to_string() } else { " ".into() };
                out += &format!(
                    "{} {} {} = {}\n",
                    marker,
                    field.path.bold(),
                    format!("({})", field.ty).dimmed(),
                    scalar_text(&field.value)
                );
            }
            out += &format!("{} fields\n", r.fields.len().to_string().bold());
        }
        Report::Build(r) => {
            out += &versions_line(&r.config_version, &r.sf_version);
            for change in &r.changes {
                out += &format!(
                    "  {} {}: {} → {}\n",
                    "~".yellow(),
                    change.path.bold(),
                    scalar_text(&change.before).red(),
                    scalar_text(&change.after).green()
                );
            }
            for warning in &r.warnings {
                out += &format!("{} {}\n", "warning:".yellow().bold(), warning);
            }
            let target = match &r.output_path {
                Some(path) => format!("written to {}", path.bold()),
                None => "dry run, nothing written".dimmed().to_string(),
            };
            out += &format!("{} {} changes, {}\n", "✓".green().bold(), r.changes.len(), target);
        }
        Report::Diff(r) => {
            out += &format!(
                "A: {}  B: {}  SF: {}\n",
                or_unknown(&r.config_version_a).cyan(),
                or_unknown(&r.config_version_b).cyan(),
                or_unknown(&r.sf_version).cyan()
            );
            if let Some(warning) = &r.warning {
                out += &format!("{} {}\n", "warning:".yellow().bold(), warning);
            }
            for diff in &r.differences {
                match diff {
                    FieldDiff::Scalar { path, value_a, value_b } => {
                        out += &format!(
                            "  {} {}: {} → {}\n",
                            "~".yellow(),
                            path.bold(),
                            scalar_text(value_a).red(),
                            scalar_text(value_b).green()
                        );
                    }
                    FieldDiff::List { path, delta } => {
                        out += &format!("  {} {}\n", "~".yellow(), path.bold());
                        for item in &delta.added {
                            out += &format!("      {} {}\n", "+".green(), item);
                        }
                        for item in &delta.removed {
                            out += &format!("      {} {}\n", "-".red(), item);
                        }
                    }
                }
            }
            out += &format!("{} differences\n", r.total_differences.to_string().bold());
        }
    }
    out
}

fn versions_line(config: &Option<String>, sf: &Option<String>) -> String {
    format!(
        "Config version: {}  SF: {}\n",
        or_unknown(config).cyan(),
        or_unknown(sf).cyan()
    )
}

fn or_unknown(version: &Option<String>) -> &str {
    version.as_deref().unwrap_or("unknown")
}

fn scalar_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
