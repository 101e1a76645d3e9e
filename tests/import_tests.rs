//! End-to-end worksheet extraction from synthetic XLSX packages.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{inline_rows, PackageBuilder};
use xlcargas::{
    parse_xlsx_rows, parse_xlsx_rows_with, CellValue, ImportError, LibraryArchive, RawArchive,
};

#[test]
fn reads_inline_string_grid() {
    let data = common::xlsx_with_grid(&[
        &["Trip", "Cliente"],
        &["225124", "Acme"],
    ]);
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], CellValue::Text("Trip".to_string()));
    assert_eq!(rows[1][1], CellValue::Text("Acme".to_string()));
}

#[test]
fn resolves_shared_strings() {
    let body = r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#;
    let shared = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>Trip</t></si><si><t>Estatus</t></si></sst>"#;
    let data = PackageBuilder::standard(body).shared_strings(shared).build();
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(
        rows[0],
        vec![
            CellValue::Text("Trip".to_string()),
            CellValue::Text("Estatus".to_string()),
        ]
    );
}

#[test]
fn applies_date_styles_to_numeric_cells() {
    let body = r#"<row r="1"><c r="A1" s="1"><v>45000</v></c><c r="B1" s="0"><v>45000</v></c></row>"#;
    let styles = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs>
</styleSheet>"#;
    let data = PackageBuilder::standard(body).styles(styles).build();
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(rows[0][0].to_plain_string(), "2023-03-14T00:00:00");
    assert_eq!(rows[0][1], CellValue::Number(45000.0));
}

#[test]
fn preserves_row_and_column_gaps() {
    let body = r#"<row r="2"><c r="C2"><v>9</v></c></row>"#;
    let data = PackageBuilder::standard(body).build();
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_empty());
    assert_eq!(
        rows[1],
        vec![CellValue::Empty, CellValue::Empty, CellValue::Number(9.0)]
    );
}

#[test]
fn both_archive_backends_agree() {
    let data = common::xlsx_with_grid(&[
        &["Trip", "Caja"],
        &["225124", "C-7"],
        &["225125", "C-8"],
    ]);

    let mut raw = RawArchive::new(&data).unwrap();
    let via_raw = parse_xlsx_rows_with(&mut raw).unwrap();

    let mut library = LibraryArchive::new(data.clone()).unwrap();
    let via_library = parse_xlsx_rows_with(&mut library).unwrap();

    assert_eq!(via_raw, via_library);
}

#[test]
fn reads_stored_entries() {
    let data = PackageBuilder::standard(&inline_rows(&[&["Trip"], &["225124"]]))
        .stored()
        .build();
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(rows[1][0], CellValue::Text("225124".to_string()));
}

#[test]
fn finds_eocd_behind_a_trailing_comment() {
    let data = PackageBuilder::standard(&inline_rows(&[&["Trip"]]))
        .archive_comment("generado por el sistema de cargas")
        .build();
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(rows[0][0], CellValue::Text("Trip".to_string()));
}

#[test]
fn part_lookup_is_case_insensitive() {
    let data = PackageBuilder::standard(&inline_rows(&[&["Trip"]]))
        .uppercase_paths()
        .build();
    let rows = parse_xlsx_rows(&data).unwrap();
    assert_eq!(rows[0][0], CellValue::Text("Trip".to_string()));
}

#[test]
fn worksheet_without_sheet_data_is_an_error() {
    let data = PackageBuilder::standard("")
        .without_part("xl/worksheets/sheet1.xml")
        .part("xl/worksheets/sheet1.xml", "<worksheet/>")
        .build();
    let err = parse_xlsx_rows(&data).unwrap_err();
    assert!(matches!(err, ImportError::SheetDataMissing));
    assert_eq!(
        err.to_string(),
        "El archivo de Excel no contiene datos en la hoja principal."
    );
}

#[test]
fn garbage_bytes_are_a_corrupt_archive() {
    let err = parse_xlsx_rows(b"no es un archivo de excel").unwrap_err();
    assert!(matches!(err, ImportError::ArchiveCorrupt));
    assert_eq!(
        err.to_string(),
        "El archivo de Excel está dañado o no se reconoce su formato."
    );
}
