//! Bulk-row normalization and validation.
//!
//! Turns a raw worksheet grid (or pre-keyed records) into canonical shipment
//! rows plus a list of Spanish-language diagnostics. Validation never aborts
//! a batch: bad rows are dropped and reported, good rows go through. All
//! diagnostic strings here are rendered verbatim by the UI, so wording is
//! part of the contract.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::dates::{excel_serial_to_datetime, to_api_date_value};
use crate::sheet::CellValue;

pub const TRIP_HEADER: &str = "Trip";

/// Text fields in output order.
const TEXT_HEADERS: [&str; 12] = [
    "Ejecutivo",
    "Caja",
    "Referencia",
    "Cliente",
    "Destino",
    "Estatus",
    "Segmento",
    "TR-MX",
    "TR-USA",
    "Comentarios",
    "Docs",
    "Tracking",
];

/// Date fields in output order.
const DATE_HEADERS: [&str; 4] = [
    "Cita carga",
    "Llegada carga",
    "Cita entrega",
    "Llegada entrega",
];

const NO_DATA_MESSAGE: &str = "El archivo no contiene filas con datos.";

/// Map a raw header cell to its canonical label.
///
/// Matching is trim- and case-insensitive and tolerates the spacing and
/// separator variants that show up in real files. Unknown headers map to
/// `None` and their columns are ignored.
pub fn normalize_bulk_header(name: &str) -> Option<&'static str> {
    let normalized = name.trim().to_lowercase();
    match normalized.as_str() {
        "trip" => Some("Trip"),
        "ejecutivo" => Some("Ejecutivo"),
        "caja" => Some("Caja"),
        "referencia" => Some("Referencia"),
        "cliente" => Some("Cliente"),
        "destino" => Some("Destino"),
        "estatus" | "status" => Some("Estatus"),
        "segmento" => Some("Segmento"),
        "tr-mx" => Some("TR-MX"),
        "tr-usa" => Some("TR-USA"),
        "comentarios" => Some("Comentarios"),
        "docs" => Some("Docs"),
        "tracking" => Some("Tracking"),
        "cita carga" | "citacarga" | "cita de carga" | "cita_carga" => Some("Cita carga"),
        "llegada carga" => Some("Llegada carga"),
        "cita entrega" | "citaentrega" | "cita de entrega" | "cita_entrega" => {
            Some("Cita entrega")
        }
        "llegada entrega" => Some("Llegada entrega"),
        _ => None,
    }
}

/// Validation profile for a batch.
///
/// The relaxed profile requires only `Trip`; the strict profile additionally
/// requires `Ejecutivo` per row and as a column.
#[derive(Debug, Clone, Copy)]
pub struct BulkRules {
    required_headers: &'static [&'static str],
    require_ejecutivo: bool,
    min_trip: u64,
}

impl BulkRules {
    /// Trip is the only mandatory column.
    pub const fn relaxed() -> Self {
        Self {
            required_headers: &["Trip"],
            require_ejecutivo: false,
            min_trip: 225_000,
        }
    }

    /// Trip and Ejecutivo are both mandatory.
    pub const fn strict() -> Self {
        Self {
            required_headers: &["Trip", "Ejecutivo"],
            require_ejecutivo: true,
            min_trip: 225_000,
        }
    }
}

impl Default for BulkRules {
    fn default() -> Self {
        Self::relaxed()
    }
}

/// One normalized shipment row, serialized with the exact wire labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalRow {
    #[serde(rename = "Trip")]
    pub trip: String,
    #[serde(rename = "Ejecutivo")]
    pub ejecutivo: String,
    #[serde(rename = "Caja")]
    pub caja: String,
    #[serde(rename = "Referencia")]
    pub referencia: String,
    #[serde(rename = "Cliente")]
    pub cliente: String,
    #[serde(rename = "Destino")]
    pub destino: String,
    #[serde(rename = "Estatus")]
    pub estatus: String,
    #[serde(rename = "Segmento")]
    pub segmento: String,
    #[serde(rename = "TR-MX")]
    pub tr_mx: String,
    #[serde(rename = "TR-USA")]
    pub tr_usa: String,
    #[serde(rename = "Comentarios")]
    pub comentarios: String,
    #[serde(rename = "Docs")]
    pub docs: String,
    #[serde(rename = "Tracking")]
    pub tracking: String,
    #[serde(rename = "Cita carga")]
    pub cita_carga: String,
    #[serde(rename = "Llegada carga")]
    pub llegada_carga: String,
    #[serde(rename = "Cita entrega")]
    pub cita_entrega: String,
    #[serde(rename = "Llegada entrega")]
    pub llegada_entrega: String,
}

impl CanonicalRow {
    fn set(&mut self, label: &str, value: String) {
        match label {
            "Trip" => self.trip = value,
            "Ejecutivo" => self.ejecutivo = value,
            "Caja" => self.caja = value,
            "Referencia" => self.referencia = value,
            "Cliente" => self.cliente = value,
            "Destino" => self.destino = value,
            "Estatus" => self.estatus = value,
            "Segmento" => self.segmento = value,
            "TR-MX" => self.tr_mx = value,
            "TR-USA" => self.tr_usa = value,
            "Comentarios" => self.comentarios = value,
            "Docs" => self.docs = value,
            "Tracking" => self.tracking = value,
            "Cita carga" => self.cita_carga = value,
            "Llegada carga" => self.llegada_carga = value,
            "Cita entrega" => self.cita_entrega = value,
            "Llegada entrega" => self.llegada_entrega = value,
            _ => {}
        }
    }
}

/// Outcome of normalizing a batch: accepted rows plus diagnostics for
/// everything that was dropped.
#[derive(Debug, Default, Serialize)]
pub struct BulkPreparation {
    pub rows: Vec<CanonicalRow>,
    pub issues: Vec<String>,
}

fn no_data() -> BulkPreparation {
    BulkPreparation {
        rows: Vec::new(),
        issues: vec![NO_DATA_MESSAGE.to_string()],
    }
}

/// Normalize a raw grid whose first row is the header row.
///
/// Data rows are numbered from 2 (spreadsheet convention) in diagnostics.
pub fn prepare_bulk_rows(grid: &[Vec<CellValue>], rules: &BulkRules) -> BulkPreparation {
    let Some(header_row) = grid.first() else {
        return no_data();
    };

    let header_map: Vec<Option<&'static str>> = header_row
        .iter()
        .map(|cell| normalize_bulk_header(&cell.to_plain_string()))
        .collect();
    let header_set: HashSet<&'static str> = header_map.iter().flatten().copied().collect();

    if grid.len() <= 1 {
        return no_data();
    }

    let records = grid
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, row)| {
            let mut record: HashMap<&'static str, CellValue> = HashMap::new();
            for (column, canonical) in header_map.iter().enumerate() {
                if let (Some(label), Some(cell)) = (canonical, row.get(column)) {
                    record.insert(label, cell.clone());
                }
            }
            (index + 1, record)
        })
        .collect::<Vec<_>>();

    process_records(&records, &header_set, rules)
}

/// Normalize pre-keyed records (one map per row, arbitrary header spellings).
///
/// Rows are numbered from 2, mirroring where they would sit under a header
/// row in a worksheet.
pub fn prepare_bulk_records(
    records: &[HashMap<String, CellValue>],
    rules: &BulkRules,
) -> BulkPreparation {
    if records.is_empty() {
        return no_data();
    }

    let mut header_set = HashSet::new();
    let keyed = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut normalized: HashMap<&'static str, CellValue> = HashMap::new();
            for (key, value) in record {
                if let Some(label) = normalize_bulk_header(key) {
                    header_set.insert(label);
                    normalized.insert(label, value.clone());
                }
            }
            (index + 2, normalized)
        })
        .collect::<Vec<_>>();

    process_records(&keyed, &header_set, rules)
}

fn process_records(
    records: &[(usize, HashMap<&'static str, CellValue>)],
    header_set: &HashSet<&'static str>,
    rules: &BulkRules,
) -> BulkPreparation {
    let missing: Vec<&str> = rules
        .required_headers
        .iter()
        .filter(|label| !header_set.contains(**label))
        .copied()
        .collect();
    if !missing.is_empty() {
        return BulkPreparation {
            rows: Vec::new(),
            issues: vec![format!(
                "Faltan las columnas obligatorias: {}.",
                missing.join(", ")
            )],
        };
    }

    let mut prepared = Vec::new();
    let mut issues = Vec::new();

    for (row_number, record) in records {
        // Fully blank rows are skipped without a diagnostic.
        if record.values().all(CellValue::is_blank) {
            continue;
        }

        let mut row_issues: Vec<String> = Vec::new();
        let mut output = CanonicalRow::default();

        let trip = plain_trimmed(record.get(TRIP_HEADER));
        if trip.is_empty() {
            row_issues.push("Trip vacío".to_string());
        } else if !trip.bytes().all(|b| b.is_ascii_digit()) {
            row_issues.push("Trip inválido".to_string());
        } else if trip.parse::<u64>().is_ok_and(|n| n < rules.min_trip) {
            row_issues.push(format!("Trip menor a {}", rules.min_trip));
        }
        output.trip = trip;

        if rules.require_ejecutivo && plain_trimmed(record.get("Ejecutivo")).is_empty() {
            row_issues.push("Ejecutivo vacío".to_string());
        }

        for label in TEXT_HEADERS {
            output.set(label, plain_trimmed(record.get(label)));
        }

        for label in DATE_HEADERS {
            let (value, error) = convert_bulk_date_value(record.get(label));
            if let Some(error) = error {
                row_issues.push(format!("{label}: {error}"));
            }
            output.set(label, value);
        }

        if row_issues.is_empty() {
            prepared.push(output);
        } else {
            issues.push(format!("Fila {row_number}: {}.", row_issues.join(", ")));
        }
    }

    BulkPreparation {
        rows: prepared,
        issues,
    }
}

fn plain_trimmed(value: Option<&CellValue>) -> String {
    value
        .map(|v| v.to_plain_string().trim().to_string())
        .unwrap_or_default()
}

/// Digits with at most one interior decimal point, the only text shape that
/// is treated as an Excel serial rather than a written date.
fn is_serial_like(text: &str) -> bool {
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(integer) && fraction.is_none_or(digits)
}

/// Convert one date-field cell to its wire value.
///
/// Returns the value plus an optional diagnostic; an error always pairs with
/// an empty value so the row output stays well-formed.
pub fn convert_bulk_date_value(value: Option<&CellValue>) -> (String, Option<&'static str>) {
    const INVALID: &str = "Fecha inválida";
    const UNRECOGNIZED: &str = "Formato de fecha no reconocido";

    let Some(value) = value else {
        return (String::new(), None);
    };

    match value {
        CellValue::Empty => (String::new(), None),
        CellValue::DateTime(dt) => (dt.to_string(), None),
        CellValue::Number(n) => match excel_serial_to_datetime(*n) {
            Some(dt) => (dt.to_string(), None),
            None => (String::new(), Some(INVALID)),
        },
        CellValue::Bool(_) => (String::new(), Some(UNRECOGNIZED)),
        CellValue::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return (String::new(), None);
            }
            if is_serial_like(trimmed) {
                if let Some(dt) = trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(excel_serial_to_datetime)
                {
                    return (dt.to_string(), None);
                }
            }
            match to_api_date_value(trimmed) {
                Some(iso) => (iso, None),
                None => (String::new(), Some(UNRECOGNIZED)),
            }
        }
    }
}
