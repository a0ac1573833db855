//! Rendering a [`QueryResult`] for people and pipes.

use super::engine::QueryResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `path<TAB>value` line per match
    #[default]
    Text,
    Json,
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!(
                "unknown output format '{}' (expected text, json or yaml)",
                other
            )),
        }
    }
}

/// Rendering-only knobs; they never change the underlying result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub paths_only: bool,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A query result as an ordered list of `{path, value}` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub success: bool,
    pub count: usize,
    pub entries: Vec<ReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Pairs each path with its value, in result order.
    pub fn from_result(result: &QueryResult) -> Self {
        let entries = result
            .paths
            .iter()
            .enumerate()
            .map(|(idx, path)| ReportEntry {
                path: path.clone(),
                value: result.matches.get(idx).cloned(),
            })
            .collect();
        Self {
            success: result.success,
            count: result.count,
            entries,
            error: result.error.as_ref().map(ToString::to_string),
        }
    }

    /// Renders the report.
    ///
    /// `max_results` truncates the listing only; `count` still reports every
    /// match.
    pub fn render(&self, format: OutputFormat, options: RenderOptions) -> Result<String> {
        let shown = self.visible(options);
        match format {
            OutputFormat::Text => Ok(self.render_text(&shown)),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&shown).context("Failed to serialize report as JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&shown).context("Failed to serialize report as YAML")
            }
        }
    }

    fn visible(&self, options: RenderOptions) -> Report {
        let limit = options.max_results.unwrap_or(usize::MAX);
        let entries = self
            .entries
            .iter()
            .take(limit)
            .map(|entry| ReportEntry {
                path: entry.path.clone(),
                value: if options.paths_only {
                    None
                } else {
                    entry.value.clone()
                },
            })
            .collect();
        Report {
            success: self.success,
            count: self.count,
            entries,
            error: self.error.clone(),
        }
    }

    fn render_text(&self, shown: &Report) -> String {
        if let Some(error) = &self.error {
            return format!("Error: {}\n", error);
        }
        if self.entries.is_empty() {
            return "No matches\n".to_string();
        }

        let mut out = String::new();
        for entry in &shown.entries {
            out.push_str(&entry.path);
            if let Some(value) = &entry.value {
                out.push('\t');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        let hidden = self.entries.len() - shown.entries.len();
        if hidden > 0 {
            out.push_str(&format!("... {} more of {} matches\n", hidden, self.count));
        }
        out
    }
}
