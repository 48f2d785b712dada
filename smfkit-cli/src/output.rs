use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use smfkit::{DiagnosticSeverity, Diagnostics};

use crate::app::GlobalOptions;

/// Print `data` as JSON (if `--json`) or call `display_fn` for human-readable output.
pub fn print_output<T: Serialize>(
    data: &T,
    opts: &GlobalOptions,
    display_fn: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        display_fn(data);
    }
    Ok(())
}

/// Column alignment for tabular output.
#[derive(Clone, Copy)]
pub enum Align {
    Left,
    Right,
}

/// Borderless, whitespace-aligned table backed by `comfy-table`.
pub struct TabWriter {
    table: Table,
    indent: String,
}

impl TabWriter {
    /// Create a table from `(header, alignment)` column definitions.
    pub fn new(columns: &[(&str, Align)]) -> Self {
        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(columns.iter().map(|(name, _)| *name));

        // Two spaces between columns, none at the outer edges
        let last = columns.len().saturating_sub(1);
        for (i, (_, align)) in columns.iter().enumerate() {
            if let Some(column) = table.column_mut(i) {
                column.set_cell_alignment(match align {
                    Align::Left => CellAlignment::Left,
                    Align::Right => CellAlignment::Right,
                });
                column.set_padding((u16::from(i != 0), u16::from(i != last)));
            }
        }

        Self {
            table,
            indent: String::new(),
        }
    }

    /// Prefix every printed line with `prefix`.
    pub fn indent(mut self, prefix: &str) -> Self {
        self.indent = prefix.to_string();
        self
    }

    /// Add a row in column order.
    pub fn row(&mut self, values: Vec<String>) {
        self.table.add_row(values);
    }

    /// Print the table to stdout.
    pub fn print(&self) {
        for line in self.table.to_string().lines() {
            println!("{}{}", self.indent, line.trim_end());
        }
    }
}

/// Serializable form of one diagnostic.
#[derive(Debug, Serialize)]
pub struct DiagnosticInfo {
    pub severity: String,
    pub category: String,
    pub message: String,
}

/// Collect diagnostics for JSON output.
pub fn collect_diagnostics(diagnostics: &Diagnostics) -> Vec<DiagnosticInfo> {
    diagnostics
        .iter()
        .map(|diagnostic| DiagnosticInfo {
            severity: diagnostic.severity.to_string(),
            category: diagnostic.category.to_string(),
            message: diagnostic.message.clone(),
        })
        .collect()
}

/// Print warnings and errors as a table, if there are any.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    let notable: Vec<_> = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity != DiagnosticSeverity::Info)
        .collect();
    if notable.is_empty() {
        return;
    }

    println!("\nDiagnostics:");
    let mut tw = TabWriter::new(&[
        ("Severity", Align::Left),
        ("Category", Align::Left),
        ("Message", Align::Left),
    ])
    .indent("  ");
    for diagnostic in notable {
        tw.row(vec![
            diagnostic.severity.to_string(),
            diagnostic.category.to_string(),
            diagnostic.message.clone(),
        ]);
    }
    tw.print();
}
