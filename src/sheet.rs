//! Worksheet row extraction.
//!
//! Walks `<sheetData>` and materializes a dense grid of [`CellValue`]s. Row
//! numbers from the `r` attribute are honored: skipped rows appear as empty
//! rows so grid indices keep matching spreadsheet row numbers. Within a row,
//! cells land at the column their reference names, falling back to the next
//! position when a cell has no reference.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::ser::{Serialize, Serializer};

use crate::cell_ref::{column_index, row_number};
use crate::dates::{excel_serial_to_datetime, SheetDateTime};
use crate::error::{ImportError, Result};
use crate::styles::StylesInfo;
use crate::xml::{attr_string, attr_u32};

/// A resolved cell value.
///
/// Dates are resolved eagerly: a numeric cell whose style carries a date
/// format becomes `DateTime` here, so downstream consumers never re-derive
/// date-ness from styles.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(SheetDateTime),
}

impl CellValue {
    /// Plain-text rendition used when a cell feeds a text field.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Bool(b) => b.to_string(),
            Self::DateTime(dt) => dt.to_string(),
        }
    }

    /// Whether the value renders as an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_str(""),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::DateTime(dt) => serializer.collect_str(dt),
        }
    }
}

/// Integral numbers print without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Default,
    SharedString,
    Bool,
    FormulaString,
    InlineString,
}

impl CellType {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => Self::SharedString,
            Some("b") => Self::Bool,
            Some("str") => Self::FormulaString,
            Some("inlineStr") => Self::InlineString,
            _ => Self::Default,
        }
    }
}

struct PendingCell {
    column: Option<usize>,
    cell_type: CellType,
    style: Option<u32>,
    text: String,
    saw_value: bool,
}

fn resolve_cell(cell: &PendingCell, shared: &[String], styles: &StylesInfo) -> CellValue {
    if !cell.saw_value {
        return CellValue::Empty;
    }
    match cell.cell_type {
        CellType::SharedString => cell
            .text
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i))
            .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
        CellType::Bool => match cell.text.trim() {
            "1" => CellValue::Bool(true),
            "0" => CellValue::Bool(false),
            _ => CellValue::Empty,
        },
        CellType::FormulaString | CellType::InlineString => CellValue::Text(cell.text.clone()),
        CellType::Default => match cell.text.trim().parse::<f64>() {
            Ok(number) => {
                let is_date = cell.style.is_some_and(|s| styles.is_date_style(s));
                if is_date {
                    excel_serial_to_datetime(number)
                        .map_or(CellValue::Number(number), CellValue::DateTime)
                } else {
                    CellValue::Number(number)
                }
            }
            Err(_) => CellValue::Text(cell.text.clone()),
        },
    }
}

fn place_cell(row: &mut Vec<CellValue>, column: Option<usize>, value: CellValue) {
    let index = column.unwrap_or(row.len());
    if index >= row.len() {
        row.resize(index + 1, CellValue::Empty);
    }
    if let Some(slot) = row.get_mut(index) {
        *slot = value;
    }
}

/// Extract the grid of cell values from a worksheet part.
///
/// Errors with [`ImportError::SheetDataMissing`] when the part has no
/// `<sheetData>` element at all; an empty `<sheetData/>` yields an empty
/// grid.
pub fn extract_sheet_rows(
    xml: &str,
    shared: &[String],
    styles: &StylesInfo,
) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut saw_sheet_data = false;
    let mut in_sheet_data = false;
    let mut current_row: Option<Vec<CellValue>> = None;
    let mut pending: Option<PendingCell> = None;
    // capture text only inside <v> or an inline-string <t>
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"sheetData" => {
                    saw_sheet_data = true;
                    in_sheet_data = true;
                }
                b"row" if in_sheet_data => {
                    // Honor explicit row numbers: emit empty rows for gaps so
                    // grid indices track sheet rows.
                    if let Some(number) = attr_string(e, b"r").as_deref().and_then(row_number) {
                        while rows.len() + 1 < number {
                            rows.push(Vec::new());
                        }
                    }
                    current_row = Some(Vec::new());
                }
                b"c" if current_row.is_some() => {
                    pending = Some(PendingCell {
                        column: attr_string(e, b"r").as_deref().and_then(column_index),
                        cell_type: CellType::from_attr(attr_string(e, b"t").as_deref()),
                        style: attr_u32(e, b"s"),
                        text: String::new(),
                        saw_value: false,
                    });
                }
                b"v" if pending.is_some() => {
                    if let Some(cell) = pending.as_mut() {
                        cell.saw_value = true;
                    }
                    in_value = true;
                }
                b"t" if pending
                    .as_ref()
                    .is_some_and(|c| c.cell_type == CellType::InlineString) =>
                {
                    if let Some(cell) = pending.as_mut() {
                        cell.saw_value = true;
                    }
                    in_inline_text = true;
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"sheetData" => saw_sheet_data = true,
                b"row" if in_sheet_data => {
                    if let Some(number) = attr_string(e, b"r").as_deref().and_then(row_number) {
                        while rows.len() + 1 < number {
                            rows.push(Vec::new());
                        }
                    }
                    rows.push(Vec::new());
                }
                b"c" if current_row.is_some() => {
                    // A self-closing cell is empty but still occupies its
                    // column for positional fallback.
                    if let Some(row) = current_row.as_mut() {
                        let column = attr_string(e, b"r").as_deref().and_then(column_index);
                        place_cell(row, column, CellValue::Empty);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                if in_value || in_inline_text {
                    if let Some(cell) = pending.as_mut() {
                        let text = t.unescape().map_err(ImportError::XmlMalformed)?;
                        cell.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"sheetData" => in_sheet_data = false,
                b"row" => {
                    if let Some(row) = current_row.take() {
                        rows.push(row);
                    }
                }
                b"c" => {
                    if let (Some(cell), Some(row)) = (pending.take(), current_row.as_mut()) {
                        let value = resolve_cell(&cell, shared, styles);
                        place_cell(row, cell.column, value);
                    }
                    in_value = false;
                    in_inline_text = false;
                }
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::XmlMalformed(e)),
            _ => {}
        }
    }

    if !saw_sheet_data {
        return Err(ImportError::SheetDataMissing);
    }

    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::styles::parse_styles;

    fn no_styles() -> StylesInfo {
        StylesInfo::default()
    }

    fn sheet(body: &str) -> String {
        format!("<worksheet><sheetData>{body}</sheetData></worksheet>")
    }

    #[test]
    fn missing_sheet_data_is_an_error() {
        let err = extract_sheet_rows("<worksheet/>", &[], &no_styles()).unwrap_err();
        assert!(matches!(err, ImportError::SheetDataMissing));
    }

    #[test]
    fn empty_sheet_data_yields_no_rows() {
        let rows = extract_sheet_rows(
            "<worksheet><sheetData/></worksheet>",
            &[],
            &no_styles(),
        )
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn numbers_and_formula_strings_resolve() {
        let xml = sheet(
            r#"<row r="1">
                <c r="A1"><v>42</v></c>
                <c r="B1" t="str"><v>=SUM</v></c>
                <c r="C1" t="b"><v>1</v></c>
            </row>"#,
        );
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(
            rows[0],
            vec![
                CellValue::Number(42.0),
                CellValue::Text("=SUM".to_string()),
                CellValue::Bool(true),
            ]
        );
    }

    #[test]
    fn shared_strings_resolve_by_index() {
        let shared = vec!["Trip".to_string(), "Cliente".to_string()];
        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v>1</v></c></row>"#);
        let rows = extract_sheet_rows(&xml, &shared, &no_styles()).unwrap();
        assert_eq!(rows[0][0], CellValue::Text("Cliente".to_string()));
    }

    #[test]
    fn out_of_range_shared_index_becomes_empty() {
        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v>9</v></c></row>"#);
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(rows[0][0], CellValue::Empty);
    }

    #[test]
    fn sparse_cells_land_at_their_column() {
        let xml = sheet(r#"<row r="1"><c r="C1"><v>7</v></c></row>"#);
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(
            rows[0],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Number(7.0)]
        );
    }

    #[test]
    fn skipped_row_numbers_become_empty_rows() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>1</v></c></row>
               <row r="4"><c r="A4"><v>4</v></c></row>"#,
        );
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].is_empty());
        assert!(rows[2].is_empty());
        assert_eq!(rows[3][0], CellValue::Number(4.0));
    }

    #[test]
    fn cells_without_reference_fall_back_to_position() {
        let xml = sheet(r#"<row><c><v>1</v></c><c><v>2</v></c></row>"#);
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(
            rows[0],
            vec![CellValue::Number(1.0), CellValue::Number(2.0)]
        );
    }

    #[test]
    fn inline_strings_concatenate_runs() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="inlineStr"><is>
                <r><t xml:space="preserve">Cita </t></r>
                <r><t>entrega</t></r>
            </is></c></row>"#,
        );
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(rows[0][0], CellValue::Text("Cita entrega".to_string()));
    }

    #[test]
    fn date_styled_numbers_become_datetimes() {
        let styles = parse_styles(
            r#"<styleSheet><cellXfs count="2">
                <xf numFmtId="0"/>
                <xf numFmtId="14"/>
            </cellXfs></styleSheet>"#,
        )
        .unwrap();
        let xml = sheet(r#"<row r="1"><c r="A1" s="1"><v>45000</v></c></row>"#);
        let rows = extract_sheet_rows(&xml, &[], &styles).unwrap();
        assert_eq!(
            rows[0][0].to_plain_string(),
            "2023-03-14T00:00:00".to_string()
        );
    }

    #[test]
    fn cell_without_value_is_empty() {
        let xml = sheet(r#"<row r="1"><c r="A1" s="2"/><c r="B1"><v>5</v></c></row>"#);
        let rows = extract_sheet_rows(&xml, &[], &no_styles()).unwrap();
        assert_eq!(rows[0][0], CellValue::Empty);
        assert_eq!(rows[0][1], CellValue::Number(5.0));
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(CellValue::Number(225124.0).to_plain_string(), "225124");
        assert_eq!(CellValue::Number(1.5).to_plain_string(), "1.5");
    }
}
