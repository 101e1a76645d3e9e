//! Shared fixtures: build valid XLSX packages in memory for the import
//! pipeline tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

pub const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

pub const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Hoja1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

pub const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// In-memory XLSX package builder backed by `zip::ZipWriter`.
pub struct PackageBuilder {
    parts: Vec<(String, String)>,
    comment: Option<String>,
    method: CompressionMethod,
}

impl PackageBuilder {
    /// Start from an empty package (no parts at all).
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            comment: None,
            method: CompressionMethod::Deflated,
        }
    }

    /// Start from a complete single-sheet package whose worksheet part wraps
    /// `rows_body` in `<sheetData>`.
    pub fn standard(rows_body: &str) -> Self {
        Self::empty()
            .part("[Content_Types].xml", CONTENT_TYPES_XML)
            .part("_rels/.rels", PACKAGE_RELS_XML)
            .part("xl/workbook.xml", WORKBOOK_XML)
            .part("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML)
            .part("xl/worksheets/sheet1.xml", &sheet_xml(rows_body))
    }

    pub fn part(mut self, path: &str, xml: &str) -> Self {
        self.parts.push((path.to_string(), xml.to_string()));
        self
    }

    pub fn without_part(mut self, path: &str) -> Self {
        self.parts.retain(|(p, _)| p != path);
        self
    }

    pub fn shared_strings(self, xml: &str) -> Self {
        self.part("xl/sharedStrings.xml", xml)
    }

    pub fn styles(self, xml: &str) -> Self {
        self.part("xl/styles.xml", xml)
    }

    /// Rename every part to uppercase (workbook paths are matched
    /// case-insensitively by the readers).
    pub fn uppercase_paths(mut self) -> Self {
        for (path, _) in &mut self.parts {
            *path = path.to_uppercase();
        }
        self
    }

    /// Trailing archive comment; pushes the EOCD record away from the end.
    pub fn archive_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn stored(mut self) -> Self {
        self.method = CompressionMethod::Stored;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(self.method);
        if let Some(comment) = self.comment {
            zip.set_comment(comment);
        }
        for (path, xml) in self.parts {
            zip.start_file(path, options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

pub fn sheet_xml(rows_body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>{rows_body}</sheetData>
</worksheet>"#
    )
}

fn column_letter(index: usize) -> char {
    assert!(index < 26, "fixture grids stay within A-Z");
    char::from(b'A' + u8::try_from(index).unwrap())
}

/// Render a grid of text values as inline-string rows.
pub fn inline_rows(rows: &[&[&str]]) -> String {
    let mut body = String::new();
    for (row_index, cells) in rows.iter().enumerate() {
        let row_number = row_index + 1;
        body.push_str(&format!(r#"<row r="{row_number}">"#));
        for (col_index, value) in cells.iter().enumerate() {
            let cell_ref = format!("{}{row_number}", column_letter(col_index));
            body.push_str(&format!(
                r#"<c r="{cell_ref}" t="inlineStr"><is><t>{value}</t></is></c>"#
            ));
        }
        body.push_str("</row>");
    }
    body
}

/// Build an XLSX whose first row is the given header row followed by the
/// data rows, all as inline strings.
pub fn xlsx_with_grid(rows: &[&[&str]]) -> Vec<u8> {
    PackageBuilder::standard(&inline_rows(rows)).build()
}
