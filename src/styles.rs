//! Styles part loader (`xl/styles.xml`) and date-format classification.
//!
//! Only two pieces of the styles part matter for the import: custom number
//! formats (`<numFmt>`) and the cell-format records (`<xf>` under
//! `<cellXfs>`) that cells point at through their `s` attribute. A cell is a
//! date exactly when its effective number format is a date format, either a
//! builtin date id or a custom format code that reads like one.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ImportError, Result};
use crate::xml::attr_u32;

/// Builtin number-format ids that render dates or times.
const BUILTIN_DATE_FORMAT_IDS: &[u32] = &[
    14, 15, 16, 17, 18, 19, 20, 21, 22, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 45, 46, 47, 50,
    51, 52, 53, 54, 55, 56, 57, 58,
];

/// The slice of the styles part the importer needs.
#[derive(Debug, Default)]
pub struct StylesInfo {
    /// Custom number formats: id to format code.
    num_fmts: HashMap<u32, String>,
    /// `numFmtId` per cell-format record, indexed by a cell's `s` attribute.
    cell_xfs: Vec<Option<u32>>,
}

impl StylesInfo {
    /// Whether the cell format at `style_index` carries a date format.
    pub fn is_date_style(&self, style_index: u32) -> bool {
        let Some(fmt_id) = usize::try_from(style_index)
            .ok()
            .and_then(|i| self.cell_xfs.get(i))
            .copied()
            .flatten()
        else {
            return false;
        };
        if BUILTIN_DATE_FORMAT_IDS.contains(&fmt_id) {
            return true;
        }
        self.num_fmts
            .get(&fmt_id)
            .is_some_and(|code| is_date_format_code(code))
    }
}

/// Parse the styles part. Absent attributes degrade to "not a date"; only
/// malformed XML is an error.
pub fn parse_styles(xml: &str) -> Result<StylesInfo> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut info = StylesInfo::default();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"cellXfs" => in_cell_xfs = true,
                    b"numFmt" => {
                        if let (Some(id), Some(code)) = (
                            attr_u32(e, b"numFmtId"),
                            crate::xml::attr_string(e, b"formatCode"),
                        ) {
                            info.num_fmts.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        info.cell_xfs.push(attr_u32(e, b"numFmtId"));
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"cellXfs" {
                    in_cell_xfs = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::XmlMalformed(e)),
            _ => {}
        }
    }

    Ok(info)
}

/// Heuristic date detection for custom format codes.
///
/// Literal sections (quoted text, bracketed color/locale prefixes) are
/// stripped first so `"mes"` or `[Red]` cannot trigger a false positive. The
/// remainder is a date format when it pairs date/time letters the way real
/// date formats do.
pub fn is_date_format_code(code: &str) -> bool {
    let mut cleaned = String::with_capacity(code.len());
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for inner in chars.by_ref() {
                    if inner == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                }
            }
            _ => cleaned.push(c.to_ascii_lowercase()),
        }
    }

    if cleaned.contains("am/pm") {
        return true;
    }

    let has = |letter: char| cleaned.contains(letter);
    (has('y') && has('m'))
        || (has('d') && has('m'))
        || (has('y') && has('d'))
        || (has('h') && (has('m') || has('d') || has('s')))
        || (has('s') && has('m'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("dd/mm/yyyy", true; "day month year")]
    #[test_case("yyyy-mm-dd hh:mm", true; "iso like")]
    #[test_case("h:mm AM/PM", true; "twelve hour")]
    #[test_case("mm:ss", true; "minutes seconds")]
    #[test_case("0.00", false; "plain decimal")]
    #[test_case("#,##0", false; "thousands")]
    #[test_case("0.00E+00", false; "scientific")]
    #[test_case("\"ymd\" 0.0", false; "quoted literal does not count")]
    #[test_case("[Red]0.00", false; "bracketed prefix does not count")]
    #[test_case("[h]:mm:ss", true; "elapsed hours")]
    fn classifies_format_codes(code: &str, expected: bool) {
        assert_eq!(is_date_format_code(code), expected);
    }

    #[test]
    fn builtin_date_id_marks_the_style() {
        let xml = r#"<styleSheet>
            <cellXfs count="2">
                <xf numFmtId="0" fontId="0"/>
                <xf numFmtId="14" fontId="0"/>
            </cellXfs>
        </styleSheet>"#;
        let styles = parse_styles(xml).unwrap();
        assert!(!styles.is_date_style(0));
        assert!(styles.is_date_style(1));
    }

    #[test]
    fn custom_format_code_is_consulted() {
        let xml = r##"<styleSheet>
            <numFmts count="2">
                <numFmt numFmtId="164" formatCode="dd/mm/yyyy h:mm"/>
                <numFmt numFmtId="165" formatCode="#,##0.00"/>
            </numFmts>
            <cellXfs count="2">
                <xf numFmtId="164"/>
                <xf numFmtId="165"/>
            </cellXfs>
        </styleSheet>"##;
        let styles = parse_styles(xml).unwrap();
        assert!(styles.is_date_style(0));
        assert!(!styles.is_date_style(1));
    }

    #[test]
    fn cell_style_xfs_records_are_ignored() {
        let xml = r#"<styleSheet>
            <cellStyleXfs count="1"><xf numFmtId="14"/></cellStyleXfs>
            <cellXfs count="1"><xf numFmtId="0"/></cellXfs>
        </styleSheet>"#;
        let styles = parse_styles(xml).unwrap();
        assert!(!styles.is_date_style(0));
    }

    #[test]
    fn out_of_range_style_index_is_not_a_date() {
        let styles = parse_styles("<styleSheet/>").unwrap();
        assert!(!styles.is_date_style(7));
    }
}
