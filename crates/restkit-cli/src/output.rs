//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use restkit_errors::ExceptionRegistry;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// One exception kind as listed by `codes` and the server catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct KindRow {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) code: i64,
    pub(crate) status: u16,
    pub(crate) category: String,
    pub(crate) message: String,
    pub(crate) ambiguous: bool,
}

/// Catalog document served at `/_meta/exceptions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Catalog {
    pub(crate) kinds: Vec<KindRow>,
    pub(crate) tree: Vec<String>,
}

impl Catalog {
    /// Catalog of a locally built registry, shaped like the server's.
    pub(crate) fn from_registry(registry: &ExceptionRegistry) -> Self {
        let kinds = registry
            .iter()
            .map(|kind| KindRow {
                name: kind.name().to_string(),
                parent: kind.parent().map(ToString::to_string),
                code: kind.code(),
                status: kind.status(),
                category: kind.category().as_str().to_string(),
                message: kind.message().to_string(),
                ambiguous: kind.parent().is_some() && registry.is_ambiguous(kind.code()),
            })
            .collect();
        let tree = registry
            .render_tree()
            .map(|line| line.to_string())
            .collect();
        Self { kinds, tree }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn render_tree(lines: &[String], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(lines),
        OutputFormat::Table => Ok(lines.join("\n")),
    }
}

pub(crate) fn render_codes(
    rows: &[KindRow],
    ambiguous_only: bool,
    format: OutputFormat,
) -> CliResult<String> {
    let rows: Vec<&KindRow> = rows
        .iter()
        .filter(|row| !ambiguous_only || row.ambiguous)
        .collect();
    match format {
        OutputFormat::Json => to_json(&rows),
        OutputFormat::Table => {
            let mut lines = vec![format!(
                "{:<12} {:<6} {:<10} {:<6} NAME",
                "CODE", "STATUS", "CATEGORY", "SHARED"
            )];
            for row in rows {
                lines.push(format!(
                    "{:<12} {:<6} {:<10} {:<6} {}",
                    row.code,
                    row.status,
                    row.category,
                    if row.ambiguous { "yes" } else { "no" },
                    row.name
                ));
            }
            Ok(lines.join("\n"))
        }
    }
}

pub(crate) fn render_catalog(catalog: &Catalog, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(catalog),
        OutputFormat::Table => Ok(format!(
            "{}\n\n{}",
            render_tree(&catalog.tree, format)?,
            render_codes(&catalog.kinds, false, format)?
        )),
    }
}
