//! Revision history table.

use crate::docx::Docx;
use crate::error::Result;
use crate::frontmatter::Revision;
use crate::model::{Alignment, Paragraph, Run, Table, TableCell, TableRow};

/// Column widths in twips: REV #, DESCRIPTION, ECO #, DATE.
pub const COLUMN_WIDTHS: [u32; 4] = [864, 5040, 1440, 1440];

/// Title row text.
pub const TITLE: &str = "REVISION HISTORY";

/// Header row texts.
pub const HEADERS: [&str; 4] = ["REV #", "DESCRIPTION OF CHANGE", "ECO #", "DATE"];

/// Paragraph written instead of the table when there are no revisions.
pub const EMPTY_TEXT: &str = "No revision history available";

/// Table style of the revision table.
pub const TABLE_STYLE: &str = "TableGrid";

const HEADER_FILL: &str = "C0C0C0";

/// Build the revision history table.
pub fn build_table(revisions: &[Revision]) -> Table {
    let mut table = Table::with_grid(COLUMN_WIDTHS.to_vec());
    table.properties.style = Some(TABLE_STYLE.to_string());
    table.properties.alignment = Some(Alignment::Center);

    let total: u32 = COLUMN_WIDTHS.iter().sum();
    table.add_row(TableRow::new(vec![TableCell::with_run(
        Run::bold(TITLE).size_pt(11),
    )
    .colspan(COLUMN_WIDTHS.len() as u32)
    .width(total)
    .shaded(HEADER_FILL)
    .align(Alignment::Center)]));

    table.add_row(TableRow::new(
        HEADERS
            .iter()
            .zip(COLUMN_WIDTHS)
            .map(|(text, width)| {
                TableCell::with_run(Run::bold(*text).size_pt(9))
                    .width(width)
                    .shaded(HEADER_FILL)
                    .align(Alignment::Center)
            })
            .collect(),
    ));

    for revision in revisions {
        let values = [
            &revision.number,
            &revision.description,
            &revision.eco_number,
            &revision.eco_date,
        ];
        let cells = values
            .iter()
            .zip(COLUMN_WIDTHS)
            .enumerate()
            .map(|(i, (text, width))| {
                let cell = TableCell::with_text(text.as_str()).width(width);
                if i == 1 {
                    cell
                } else {
                    cell.align(Alignment::Center)
                }
            })
            .collect();
        table.add_row(TableRow::new(cells));
    }

    table
}

/// Build the revision part: a blank document holding the table, or a
/// placeholder paragraph when there are no revisions.
pub fn revision_part(revisions: &[Revision]) -> Result<Docx> {
    let mut docx = Docx::blank()?;
    if revisions.is_empty() {
        docx.document_mut().add_paragraph(Paragraph::with_text(EMPTY_TEXT));
    } else {
        docx.document_mut().add_table(build_table(revisions));
    }
    Ok(docx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revisions() -> Vec<Revision> {
        vec![
            Revision::new("A", "Initial release", "ECO-100", "2024-01-15"),
            Revision::new("B", "Added alarms", "ECO-121", "2024-03-02"),
        ]
    }

    #[test]
    fn test_table_layout() {
        let table = build_table(&revisions());

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.style(), Some("TableGrid"));
        assert_eq!(table.properties.alignment, Some(Alignment::Center));

        let title = &table.rows[0].cells[0];
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(title.span(), 4);
        assert_eq!(title.text(), TITLE);
        assert_eq!(title.properties.shading.as_deref(), Some("C0C0C0"));
        let run = title.paragraphs().next().unwrap().first_run().unwrap();
        assert_eq!(run.properties.bold, Some(true));
        assert_eq!(run.properties.size, Some(22));

        assert_eq!(table.rows[1].text(), HEADERS.join("\t"));
        assert_eq!(
            table.rows[1].cells[0].paragraphs().next().unwrap().first_run().unwrap().properties.size,
            Some(18)
        );
    }

    #[test]
    fn test_data_rows_alignment() {
        let table = build_table(&revisions());
        let row = &table.rows[2];
        assert_eq!(row.text(), "A\tInitial release\tECO-100\t2024-01-15");

        let alignments: Vec<_> = row
            .cells
            .iter()
            .map(|c| c.paragraphs().next().unwrap().properties.alignment)
            .collect();
        assert_eq!(
            alignments,
            vec![
                Some(Alignment::Center),
                None,
                Some(Alignment::Center),
                Some(Alignment::Center)
            ]
        );
    }

    #[test]
    fn test_revision_part() {
        let part = revision_part(&revisions()).unwrap();
        assert_eq!(part.document().table_count(), 1);

        let empty = revision_part(&[]).unwrap();
        assert_eq!(empty.document().table_count(), 0);
        assert_eq!(empty.document().text(), EMPTY_TEXT);
    }
}
