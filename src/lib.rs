//! Bulk import of shipment-tracking rows from XLSX workbooks.
//!
//! The pipeline opens the workbook container, resolves the first worksheet
//! through the package relationships, materializes a grid of cell values
//! (shared strings and date styles applied), and normalizes the grid into
//! canonical shipment rows with Spanish-language diagnostics ready for the
//! bulk-add backend call.
//!
//! ```no_run
//! use xlcargas::{prepare_upload, BulkRules};
//!
//! # fn main() -> xlcargas::Result<()> {
//! let bytes = std::fs::read("cargas.xlsx").map_err(|source| {
//!     xlcargas::ImportError::PartUnreadable { path: "cargas.xlsx".into(), source }
//! })?;
//! let batch = prepare_upload("cargas.xlsx", &bytes, &BulkRules::relaxed())?;
//! for issue in &batch.issues {
//!     eprintln!("{issue}");
//! }
//! println!("{} filas listas", batch.rows.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod archive;
pub mod bulk;
mod cell_ref;
pub mod dates;
pub mod error;
pub mod package;
pub mod shared_strings;
pub mod sheet;
pub mod styles;
pub mod upload;
mod xml;

pub use archive::{LibraryArchive, RawArchive, SheetArchive};
pub use bulk::{
    normalize_bulk_header, prepare_bulk_records, prepare_bulk_rows, BulkPreparation, BulkRules,
    CanonicalRow,
};
pub use dates::{excel_serial_to_datetime, SheetDateTime};
pub use error::{ImportError, Result};
pub use sheet::CellValue;
pub use upload::{prepare_upload, validate_upload_filename};

use package::{locate_worksheet, resolve_workbook_path};
use shared_strings::parse_shared_strings;
use sheet::extract_sheet_rows;
use styles::{parse_styles, StylesInfo};

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

/// Parse the first worksheet of an XLSX byte buffer into a grid of cells.
///
/// Uses the built-in container reader; [`parse_xlsx_rows_with`] accepts any
/// [`SheetArchive`] implementation.
pub fn parse_xlsx_rows(data: &[u8]) -> Result<Vec<Vec<CellValue>>> {
    let mut archive = RawArchive::new(data)?;
    parse_xlsx_rows_with(&mut archive)
}

/// Parse the first worksheet of an already-opened package.
pub fn parse_xlsx_rows_with<A: SheetArchive>(archive: &mut A) -> Result<Vec<Vec<CellValue>>> {
    let workbook_path = resolve_workbook_path(archive)?;
    let workbook_xml = archive
        .read_text(&workbook_path)
        .map_err(|_| ImportError::WorkbookNotFound)?;

    let sheet_path = locate_worksheet(archive, &workbook_xml)?;
    let sheet_xml = archive
        .read_text(&sheet_path)
        .map_err(|_| ImportError::SheetUnreadable)?;

    let shared = if archive.has(SHARED_STRINGS_PART) {
        parse_shared_strings(&archive.read_text(SHARED_STRINGS_PART)?)?
    } else {
        Vec::new()
    };

    let styles = if archive.has(STYLES_PART) {
        parse_styles(&archive.read_text(STYLES_PART)?)?
    } else {
        StylesInfo::default()
    };

    extract_sheet_rows(&sheet_xml, &shared, &styles)
}
