//! Spreadsheet reader.

use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

use calamine::Data;
use calamine::DataRef;
use calamine::Reader;
use calamine::Sheets;
use calamine::Xlsx;
use calamine::XlsxError;
use calamine::open_workbook_auto_from_rs;

use super::ContentSample;
use super::Unreadable;
use crate::AdmissionConfig;
use crate::types::ContentType;

/// Renders the header and first `max_sheet_rows` rows of the first
/// non-empty worksheet as tab-separated lines.
///
/// The container is picked from the bytes, never from the file name. XLSX
/// sheets are streamed cell by cell and reading stops after the last sampled
/// row. calamine has no streaming reader for the binary and OpenDocument
/// formats, so those sheets are loaded whole; the size guard bounds them.
pub fn sample(
    path: &Path,
    format: ContentType,
    config: &AdmissionConfig,
) -> Result<ContentSample, Unreadable> {
    let bytes = std::fs::read(path).map_err(|e| Unreadable::new(format!("cannot read file: {e}")))?;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Unreadable::new(format!("workbook does not open: {e}")))?;
    let rows = config.max_sheet_rows.saturating_add(1);

    for name in workbook.sheet_names() {
        let leading = match &mut workbook {
            Sheets::Xlsx(xlsx) => leading_rows_streamed(xlsx, &name, rows).map_err(|e| e.to_string()),
            other => other
                .worksheet_range(&name)
                .map(|range| {
                    let mut leading = LeadingRows::new(rows);
                    for (row, col, cell) in range.used_cells() {
                        let (row, col) = (to_u32(row), to_u32(col));
                        if !leading.push(row, col, cell_text(cell)) {
                            break;
                        }
                    }
                    leading.render()
                })
                .map_err(|e| e.to_string()),
        };

        match leading {
            Ok(Some(text)) => {
                return Ok(ContentSample::from_text(
                    &text,
                    format,
                    config.max_sample_length,
                ));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), sheet = %name, error = %e, "worksheet unreadable");
            }
        }
    }

    Err(Unreadable::new("workbook has no readable non-empty worksheet"))
}

/// Reads XLSX cells in document order until one lies below the sampled rows.
fn leading_rows_streamed<RS: Read + Seek>(
    xlsx: &mut Xlsx<RS>,
    name: &str,
    rows: usize,
) -> Result<Option<String>, XlsxError> {
    let mut cells = xlsx.worksheet_cells_reader(name)?;
    let mut leading = LeadingRows::new(rows);

    while let Some(cell) = cells.next_cell()? {
        if *cell.get_value() == DataRef::Empty {
            continue;
        }
        let (row, col) = cell.get_position();
        if !leading.push(row, col, cell_text(&Data::from(cell.get_value().clone()))) {
            break;
        }
    }

    Ok(leading.render())
}

/// The first rows of a sheet, counted from its first non-empty cell.
struct LeadingRows {
    limit: usize,
    first_row: Option<u32>,
    rows: Vec<Vec<(u32, String)>>,
}

impl LeadingRows {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            first_row: None,
            rows: Vec::new(),
        }
    }

    /// Returns `false` once `row` lies past the last sampled row.
    fn push(&mut self, row: u32, col: u32, text: String) -> bool {
        let first = *self.first_row.get_or_insert(row);
        let offset = row.saturating_sub(first) as usize;
        if offset >= self.limit {
            return false;
        }
        if self.rows.len() <= offset {
            self.rows.resize_with(offset + 1, Vec::new);
        }
        self.rows[offset].push((col, text));
        true
    }

    /// Tab-separated lines spanning the used columns; `None` for an empty
    /// sheet.
    fn render(self) -> Option<String> {
        let cols = self.rows.iter().flatten().map(|(col, _)| *col);
        let first_col = cols.clone().min()?;
        let last_col = cols.max()?;
        let width = (last_col - first_col) as usize + 1;

        let lines: Vec<String> = self
            .rows
            .into_iter()
            .map(|cells| {
                let mut line = vec![String::new(); width];
                for (col, text) in cells {
                    line[(col - first_col) as usize] = text;
                }
                line.join("\t")
            })
            .collect();
        Some(lines.join("\n"))
    }
}

fn to_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
    }
}
