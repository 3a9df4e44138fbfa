//! Bounded textual preview of a record array: the external `TableView`
//! contract. The column-layout algorithm itself is this crate's own
//! implementation detail — the contract leaves it unspecified, only the
//! field descriptor shape and the row-number sentinel are mandated.

use std::fmt;

use crate::record::Record;

/// Sentinel `id` denoting the synthetic row-number column.
pub const ROW_NUMBER_ID: i32 = -1;

/// A per-field callback formatting one cell's text for a given record.
pub type FormatterFunc = fn(id: i32, record: &Record) -> String;

/// One column's metadata: header text and fixed display width.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub header: &'static str,
    pub id: i32,
    pub column_width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableViewError {
    NoFields,
}

impl fmt::Display for TableViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableViewError::NoFields => write!(f, "table view has no fields"),
        }
    }
}
impl std::error::Error for TableViewError {}

pub struct TableView {
    fields: Vec<Field>,
    formatter: FormatterFunc,
}

impl TableView {
    pub fn new(fields: Vec<Field>, formatter: FormatterFunc) -> Result<Self, TableViewError> {
        if fields.is_empty() {
            return Err(TableViewError::NoFields);
        }
        Ok(Self { fields, formatter })
    }

    /// Prints a header row, a ruled separator, then up to `lines_count`
    /// data rows (capped at the data's own length); when the data is
    /// truncated the final separator is an ellipsis row instead of a rule.
    pub fn render(&self, records: &[Record], lines_count: usize) {
        let total_width: usize = self.fields.iter().map(|f| f.column_width + 3).sum();
        let rule = "-".repeat(total_width);

        let header: Vec<String> = self
            .fields
            .iter()
            .map(|f| pad(f.header, f.column_width))
            .collect();
        println!("{}", header.join(" | "));
        println!("{rule}");

        let shown = lines_count.min(records.len());
        for (row, record) in records.iter().take(shown).enumerate() {
            let cells: Vec<String> = self
                .fields
                .iter()
                .map(|field| {
                    let text = if field.id == ROW_NUMBER_ID {
                        row.to_string()
                    } else {
                        (self.formatter)(field.id, record)
                    };
                    pad(&text, field.column_width)
                })
                .collect();
            println!("{}", cells.join(" | "));
        }

        if shown < records.len() {
            println!("{}", center("...", total_width));
        } else {
            println!("{rule}");
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    if text.len() >= width {
        text[..width].to_string()
    } else {
        format!("{text:width$}")
    }
}

fn center(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let left = (width - text.len()) / 2;
    let right = width - text.len() - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Field identifiers used by [`default_formatter`].
pub mod field_id {
    pub const ID: i32 = 0;
    pub const COUNT: i32 = 1;
    pub const COST: i32 = 2;
    pub const PRIMARY: i32 = 3;
    pub const MODE: i32 = 4;
}

fn default_formatter(id: i32, record: &Record) -> String {
    match id {
        field_id::ID => record.id.to_string(),
        field_id::COUNT => record.count.to_string(),
        field_id::COST => format!("{:.4}", record.cost),
        field_id::PRIMARY => record.primary().to_string(),
        field_id::MODE => record.mode().to_string(),
        other => format!("<unknown field {other}>"),
    }
}

fn default_fields() -> Vec<Field> {
    vec![
        Field {
            header: "#",
            id: ROW_NUMBER_ID,
            column_width: 6,
        },
        Field {
            header: "id",
            id: field_id::ID,
            column_width: 12,
        },
        Field {
            header: "count",
            id: field_id::COUNT,
            column_width: 10,
        },
        Field {
            header: "cost",
            id: field_id::COST,
            column_width: 12,
        },
        Field {
            header: "primary",
            id: field_id::PRIMARY,
            column_width: 7,
        },
        Field {
            header: "mode",
            id: field_id::MODE,
            column_width: 5,
        },
    ]
}

/// Renders `records` with the default five-field layout, capped at
/// `lines_count` rows.
pub fn render_default(records: &[Record], lines_count: usize) -> Result<(), TableViewError> {
    let view = TableView::new(default_fields(), default_formatter)?;
    view.render(records, lines_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_field_list() {
        assert_eq!(
            TableView::new(Vec::new(), default_formatter).unwrap_err(),
            TableViewError::NoFields
        );
    }

    #[test]
    fn row_number_sentinel_bypasses_formatter() {
        let view = TableView::new(default_fields(), default_formatter).unwrap();
        let records = vec![Record::new(1, 1, 1.0, true, 1)];
        // Rendering should not panic when a field uses the row-number
        // sentinel instead of calling into the formatter.
        view.render(&records, 10);
    }
}
