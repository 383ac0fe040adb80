use std::io::{self, Write};

use serde::Serialize;

use crate::aggregate::DisplayRecord;
use crate::session::User;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_records(records: &[DisplayRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    pub fn print_user(user: Option<&User>) -> io::Result<()> {
        Self::print_json(&user)
    }

    pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TableOutput;

impl TableOutput {
    const HEADERS: [&'static str; 5] = ["source", "EC number", "protein", "substrate", "kcat"];

    pub fn print_records(records: &[DisplayRecord]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        if records.is_empty() {
            writeln!(stdout, "no records")?;
            return Ok(());
        }
        for line in Self::render(records) {
            writeln!(stdout, "{line}")?;
        }
        Ok(())
    }

    pub fn render(records: &[DisplayRecord]) -> Vec<String> {
        let rows: Vec<[String; 5]> = records.iter().map(Self::row).collect();
        let mut widths = Self::HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let format_row = |cells: &[String]| {
            cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let headers = Self::HEADERS.map(str::to_string);
        let mut lines = vec![format_row(&headers[..])];
        lines.extend(rows.iter().map(|row| format_row(&row[..])));
        lines
    }

    fn row(record: &DisplayRecord) -> [String; 5] {
        let (ec_number, protein) = match record {
            DisplayRecord::Measured(row) => (
                row.ec_number.clone().unwrap_or_default(),
                row.prot_id.clone().unwrap_or_default(),
            ),
            DisplayRecord::Predicted(_) => (String::new(), String::new()),
        };
        [
            record.provenance().to_string(),
            ec_number,
            protein,
            record.substrate_name().unwrap_or_default().to_string(),
            record.formatted_kcat().unwrap_or("n/a").to_string(),
        ]
    }
}
