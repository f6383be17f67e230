//! Human-readable reports.

use std::fmt;
use std::str::FromStr;

use crate::entry::{fmt_hex, ConfEntry};
use crate::status::ValidationStatus;

/// How register columns are rendered in the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    /// Register names and decoded fields.
    #[default]
    Regs,
    /// Raw pointers and values.
    Raw,
}

impl FromStr for TableStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regs" => Ok(Self::Regs),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown table style {other:?} (expected regs or raw)")),
        }
    }
}

impl fmt::Display for TableStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Regs => "regs",
            Self::Raw => "raw",
        })
    }
}

const HEADERS: [&str; 5] = ["E", "Index", "Register", "Fields", "Error"];
const RIGHT_ALIGNED: [bool; 5] = [false, true, false, false, false];

/// Render entries as a plain text table.
///
/// Columns are padded to their widest cell and separated by two spaces, with
/// a dashed rule under the header. The `E` column marks entries with errors.
/// Returns an empty string when there are no entries.
pub fn render_periphconf_table<'a, 'c: 'a>(
    entries: impl IntoIterator<Item = &'a ConfEntry<'c>>,
    style: TableStyle,
) -> String {
    let rows: Vec<[String; 5]> = entries
        .into_iter()
        .map(|entry| {
            let (register, fields) = match style {
                TableStyle::Regs => (entry.name(), entry.field_desc()),
                TableStyle::Raw => (fmt_hex(entry.reg_ptr), fmt_hex(entry.value)),
            };
            let error = if entry.status.is_error() {
                entry.status.to_string()
            } else {
                String::new()
            };
            [
                if entry.status.is_error() { "X" } else { "" }.to_owned(),
                entry.index.to_string(),
                register,
                fields,
                error,
            ]
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = HEADERS.map(str::to_owned);
    let rule = widths.map(|w| "-".repeat(w));

    std::iter::once(&header)
        .chain(std::iter::once(&rule))
        .chain(&rows)
        .map(|row| format_row(row, &widths))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_row(row: &[String; 5], widths: &[usize; 5]) -> String {
    let cells: Vec<String> = row
        .iter()
        .zip(widths)
        .zip(RIGHT_ALIGNED)
        .map(|((cell, &width), right)| {
            if right {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    cells.join("  ").trim_end().to_owned()
}

/// Describe every flag in `status`.
///
/// Each flag is rendered as its name, the description indented by two
/// spaces, and a blank line.
pub fn render_validation_status(status: ValidationStatus) -> String {
    let mut lines = Vec::new();
    for flag in status.iter() {
        lines.push(format!("{}:", flag.name().unwrap_or("?")));
        lines.extend(flag.description().unwrap_or_default().lines().map(|l| format!("  {l}")));
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_parsing() {
        assert_eq!("regs".parse::<TableStyle>().unwrap(), TableStyle::Regs);
        assert_eq!("raw".parse::<TableStyle>().unwrap(), TableStyle::Raw);
        assert!("json".parse::<TableStyle>().is_err());
        assert_eq!(TableStyle::default().to_string(), "regs");
    }

    #[test]
    fn empty_table_is_empty() {
        assert_eq!(render_periphconf_table(&[], TableStyle::Raw), "");
    }

    #[test]
    fn raw_table_layout() {
        let mut bad = ConfEntry::new(12, 0x5F92_0000, 0x1, None).unwrap();
        bad.status = ValidationStatus::UNRECOGNIZED_REGISTER;
        let good = ConfEntry::new(3, 0x0000_1000, 0x2, None).unwrap();

        let table = render_periphconf_table([&bad, &good], TableStyle::Raw);
        let expected = [
            "E  Index  Register     Fields       Error",
            "-  -----  -----------  -----------  ---------------------",
            "X     12  0x5f92_0000  0x0000_0001  UNRECOGNIZED_REGISTER",
            "       3  0x0000_1000  0x0000_0002",
        ]
        .join("\n");
        assert_eq!(table, expected);
    }

    #[test]
    fn status_text_indents_descriptions() {
        let text = render_validation_status(ValidationStatus::UNRECOGNIZED_REGISTER);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "UNRECOGNIZED_REGISTER:");
        assert!(lines[1].starts_with("  The PERIPHCONF entry register address"));
        assert_eq!(lines.last(), Some(&""));
        assert_eq!(render_validation_status(ValidationStatus::SUCCESS), "");
    }
}
