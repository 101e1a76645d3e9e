//! OOXML package resolution: find the workbook part, then the worksheet part.
//!
//! `xl/workbook.xml` is a convention, not a guarantee. Well-formed packages
//! may store the workbook elsewhere, so after the conventional fast path both
//! the package relationships (`_rels/.rels`) and the content-types manifest
//! (`[Content_Types].xml`) are consulted before giving up — each one is
//! independently authoritative.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::archive::{normalize_zip_path, SheetArchive};
use crate::error::{ImportError, Result};
use crate::xml::{attr_string, attr_string_local};

/// Conventional workbook part path; covers the overwhelming majority of
/// real files.
const WORKBOOK_PART_DEFAULT: &str = "xl/workbook.xml";

const PACKAGE_RELS_PART: &str = "_rels/.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Relationship type URIs that mark the package's main office document.
const WORKBOOK_RELATIONSHIP_TYPES: [&str; 3] = [
    "http://schemas.openxmlformats.org/officedocument/2006/relationships/officedocument",
    "http://purl.oclc.org/ooxml/officedocument/relationships/officedocument",
    "http://schemas.microsoft.com/office/2006/relationships/officedocument",
];

/// Content types that mark a spreadsheet main document part.
const WORKBOOK_CONTENT_TYPES: [&str; 11] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.addin.main+xml",
    "application/vnd.ms-excel.sheet.macroenabled.main+xml",
    "application/vnd.ms-excel.sheet.macroenabled.main",
    "application/vnd.ms-excel.template.macroenabled.main+xml",
    "application/vnd.ms-excel.template.macroenabled.main",
    "application/vnd.ms-excel.addin.macroenabled.main+xml",
    "application/vnd.ms-excel.addin.macroenabled.main",
    "application/vnd.ms-excel.sheet.binary.macroenabled.main",
    "application/vnd.ms-excel.sheet.binary.macroenabled.main+xml",
];

pub(crate) fn is_workbook_relationship_type(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    !normalized.is_empty() && WORKBOOK_RELATIONSHIP_TYPES.contains(&normalized.as_str())
}

pub(crate) fn is_workbook_content_type(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if WORKBOOK_CONTENT_TYPES.contains(&normalized.as_str()) {
        return true;
    }
    matches_spreadsheet_main(&normalized) || matches_macro_enabled_main(&normalized)
}

/// `application/vnd.openxmlformats-officedocument.spreadsheetml.{sheet|template|addin}.main+xml`
fn matches_spreadsheet_main(content_type: &str) -> bool {
    content_type
        .strip_prefix("application/vnd.openxmlformats-officedocument.spreadsheetml.")
        .and_then(|rest| rest.strip_suffix(".main+xml"))
        .is_some_and(|kind| matches!(kind, "sheet" | "template" | "addin"))
}

/// Macro-enabled variants from either vendor prefix, with or without the
/// `spreadsheetml.` infix and the `+xml` suffix.
fn matches_macro_enabled_main(content_type: &str) -> bool {
    let rest = if let Some(r) =
        content_type.strip_prefix("application/vnd.openxmlformats-officedocument.")
    {
        r
    } else if let Some(r) = content_type.strip_prefix("application/vnd.ms-excel.") {
        r
    } else {
        return false;
    };
    let rest = rest.strip_prefix("spreadsheetml.").unwrap_or(rest);
    let rest = rest.strip_suffix("+xml").unwrap_or(rest);
    let Some(kind) = rest.strip_suffix(".macroenabled.main") else {
        return false;
    };
    matches!(kind, "sheet" | "template" | "addin" | "sheet.binary")
}

/// One `<Relationship>` element from a `.rels` part.
#[derive(Debug, Default)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Parse all `<Relationship>` elements of a relationships part.
pub(crate) fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    relationships.push(Relationship {
                        id: attr_string(e, b"Id").unwrap_or_default(),
                        rel_type: attr_string(e, b"Type").unwrap_or_default(),
                        target: attr_string(e, b"Target").unwrap_or_default(),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::XmlMalformed(e)),
            _ => {}
        }
    }

    Ok(relationships)
}

/// Parse `<Override PartName=".." ContentType=".."/>` entries.
fn parse_content_type_overrides(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut overrides = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Override" {
                    let part_name = attr_string(e, b"PartName").unwrap_or_default();
                    let content_type = attr_string(e, b"ContentType").unwrap_or_default();
                    if !part_name.is_empty() {
                        overrides.push((part_name, content_type));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::XmlMalformed(e)),
            _ => {}
        }
    }

    Ok(overrides)
}

fn add_candidate(candidates: &mut Vec<String>, raw: &str) {
    let normalized = normalize_zip_path(raw.trim());
    if normalized.is_empty() {
        return;
    }
    if !candidates.contains(&normalized) {
        candidates.push(normalized.clone());
    }
    // Candidates must resolve under xl/; try a prefixed twin for relative
    // targets that omit it.
    if !normalized.to_lowercase().starts_with("xl/") {
        let prefixed = format!("xl/{normalized}");
        if !candidates.contains(&prefixed) {
            candidates.push(prefixed);
        }
    }
}

/// Locate the workbook part inside the package.
///
/// Strategy order: conventional path, package relationships, content-type
/// overrides. Unreadable or malformed fallback parts are skipped rather than
/// failing the resolution — the remaining strategies may still succeed.
pub fn resolve_workbook_path<A: SheetArchive>(archive: &mut A) -> Result<String> {
    if archive.has(WORKBOOK_PART_DEFAULT) {
        return Ok(WORKBOOK_PART_DEFAULT.to_string());
    }

    let mut candidates: Vec<String> = Vec::new();

    if archive.has(PACKAGE_RELS_PART) {
        if let Ok(xml) = archive.read_text(PACKAGE_RELS_PART) {
            if let Ok(relationships) = parse_relationships(&xml) {
                for rel in relationships {
                    if is_workbook_relationship_type(&rel.rel_type) && !rel.target.is_empty() {
                        add_candidate(&mut candidates, &rel.target);
                    }
                }
            }
        }
    }

    if archive.has(CONTENT_TYPES_PART) {
        if let Ok(xml) = archive.read_text(CONTENT_TYPES_PART) {
            if let Ok(overrides) = parse_content_type_overrides(&xml) {
                for (part_name, content_type) in overrides {
                    if is_workbook_content_type(&content_type) {
                        add_candidate(&mut candidates, &part_name);
                    }
                }
            }
        }
    }

    candidates
        .into_iter()
        .find(|candidate| archive.has(candidate))
        .ok_or(ImportError::WorkbookNotFound)
}

/// Normalize a worksheet relationship target to an absolute archive path.
pub(crate) fn resolve_sheet_path(target: &str) -> String {
    let trimmed = target.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return String::new();
    }
    let prefixed = if trimmed.to_lowercase().starts_with("xl/") {
        trimmed.to_string()
    } else {
        format!("xl/{trimmed}")
    };
    normalize_zip_path(&prefixed)
}

/// Resolve the first `<sheet>` of the workbook part to its worksheet path.
///
/// Each stage fails with its own error so callers always learn which step
/// broke: no sheets, missing relationship id, unreadable relationships part,
/// missing relationship entry.
pub fn locate_worksheet<A: SheetArchive>(archive: &mut A, workbook_xml: &str) -> Result<String> {
    let rel_id = first_sheet_relationship_id(workbook_xml)?;

    let rels_xml = archive
        .read_text(WORKBOOK_RELS_PART)
        .map_err(|_| ImportError::RelationshipsUnreadable)?;
    let relationships = parse_relationships(&rels_xml)?;

    let target = relationships
        .into_iter()
        .find(|rel| rel.id == rel_id)
        .map(|rel| rel.target)
        .filter(|target| !target.is_empty())
        .ok_or(ImportError::RelationshipMissing)?;

    let path = resolve_sheet_path(&target);
    if path.is_empty() {
        return Err(ImportError::RelationshipMissing);
    }
    Ok(path)
}

/// Find the first `<sheet>` element and return its `r:id`.
fn first_sheet_relationship_id(workbook_xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(workbook_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    // r:id carries a namespace prefix; match on the local name.
                    return attr_string_local(e, b"id")
                        .filter(|id| !id.is_empty())
                        .ok_or(ImportError::SheetIdMissing);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::XmlMalformed(e)),
            _ => {}
        }
    }

    Err(ImportError::NoSheets)
}
