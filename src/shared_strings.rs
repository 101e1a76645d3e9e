//! Shared-strings table loader (`xl/sharedStrings.xml`).
//!
//! Each `<si>` item becomes one table entry. Rich-text items carry several
//! `<r>` runs whose `<t>` fragments concatenate in document order; phonetic
//! `<rPh>` runs are presentation hints and are excluded. Whitespace inside
//! `<t>` is significant, so text is never trimmed here.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ImportError, Result};

/// Parse the shared-strings part into its indexed string table.
///
/// The part is optional in a package; callers supply an empty table when it
/// is absent.
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut table = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth: u32 = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" if phonetic_depth == 0 => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"si" {
                    table.push(String::new());
                }
            }
            Ok(Event::Text(ref t)) => {
                if in_text {
                    if let Some(item) = current.as_mut() {
                        let text = t.unescape().map_err(ImportError::XmlMalformed)?;
                        item.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    if let Some(item) = current.take() {
                        table.push(item);
                    }
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::XmlMalformed(e)),
            _ => {}
        }
    }

    Ok(table)
}
