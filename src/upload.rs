//! Upload-side entry point: filename gate plus the parse-and-normalize
//! pipeline.

use crate::bulk::{prepare_bulk_rows, BulkPreparation, BulkRules};
use crate::error::{ImportError, Result};
use crate::parse_xlsx_rows;

/// Extensions accepted for bulk import, in display order.
const ALLOWED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// Lowercased extension from the final dot of a filename, or empty.
pub fn get_file_extension(filename: &str) -> String {
    let trimmed = filename.trim().to_lowercase();
    match trimmed.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()) => {
            ext.to_string()
        }
        _ => String::new(),
    }
}

/// Spanish list of the allowed extensions: `.a`, `.a o .b`, `.a, .b o .c`.
fn format_allowed_extensions_message() -> String {
    let extensions: Vec<String> = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect();
    match extensions.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} o {second}"),
        [head @ .., tail] => format!("{} o {tail}", head.join(", ")),
    }
}

/// Reject filenames outside the allow-list before any bytes are parsed.
///
/// Legacy `.zip` uploads get their own message; everything else unknown gets
/// the generic allow-list message.
pub fn validate_upload_filename(filename: &str) -> Result<()> {
    let extension = get_file_extension(filename);
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(());
    }
    if extension == "zip" {
        return Err(ImportError::LegacyZipUpload);
    }
    Err(ImportError::DisallowedExtension(
        format_allowed_extensions_message(),
    ))
}

/// Full import pipeline: gate the filename, parse the workbook, normalize.
pub fn prepare_upload(filename: &str, data: &[u8], rules: &BulkRules) -> Result<BulkPreparation> {
    validate_upload_filename(filename)?;
    let grid = parse_xlsx_rows(data)?;
    Ok(prepare_bulk_rows(&grid, rules))
}
