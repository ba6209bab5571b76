use std::fs;
use std::path::Path;

use serde_json::Value;
use vitrina_core::Document;

const REPORT_TITLE: &str = "Lista de Modelos";
const REPORT_WIDTH: usize = 80;
const ENTRIES_PER_PAGE: usize = 15;

/// Renders the listing document: a centered title, one line per record in
/// fixed field order with a blank line between entries, and a form-feed
/// page break every [`ENTRIES_PER_PAGE`] entries.
#[must_use]
pub fn render_report(records: &[Document]) -> String {
    let title = format!("{REPORT_TITLE:^width$}", width = REPORT_WIDTH);
    let mut out = String::new();
    out.push_str(title.trim_end());
    out.push('\n');
    out.push('\n');

    for (index, record) in records.iter().enumerate() {
        if index > 0 && index % ENTRIES_PER_PAGE == 0 {
            out.push('\u{c}');
            out.push('\n');
        }
        out.push_str(&entry_line(record));
        out.push('\n');
        out.push('\n');
    }

    out
}

/// Overwrites the report file with the rendered listing.
///
/// # Errors
/// Returns the I/O error when the file cannot be written; the list handler
/// logs and ignores it so the JSON response is never affected.
pub fn write_report(records: &[Document], path: &Path) -> std::io::Result<()> {
    fs::write(path, render_report(records))
}

fn entry_line(record: &Document) -> String {
    format!(
        "ID: {}, Patreon: {}, Tipo Modelo: {}, Pelicula: {}, Nombre Modelo: {}, \
         Medida: {}, Escala: {}.",
        field_text(record, "id"),
        field_text(record, "Patreon"),
        field_text(record, "Tipo_Modelo"),
        field_text(record, "Pelicula"),
        field_text(record, "Nombre_Modelo"),
        field_text(record, "Medida"),
        field_text(record, "Escala"),
    )
}

fn field_text(record: &Document, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
