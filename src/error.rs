//! Structured error types for the import pipeline.
//!
//! The `Display` text of every structural variant is part of the contract:
//! the surrounding UI renders these Spanish messages verbatim, so the wording
//! must not drift. Per-row validation problems are not errors — they are
//! collected as diagnostics by the bulk normalizer and never abort a batch.

/// All structural failures that abort an import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// End-of-central-directory record not found in the trailing scan window.
    #[error("El archivo de Excel está dañado o no se reconoce su formato.")]
    ArchiveCorrupt,

    /// Central directory signature or layout mismatch.
    #[error("El archivo de Excel está dañado (directorio central inválido).")]
    CentralDirectoryCorrupt,

    /// Local file header signature mismatch for an indexed entry.
    #[error("El archivo de Excel está dañado (cabecera local inválida).")]
    LocalHeaderCorrupt,

    /// Entry payload runs past the end of the archive bytes.
    #[error("El archivo de Excel está incompleto.")]
    ArchiveTruncated,

    /// Compression method other than stored (0) or DEFLATE (8).
    #[error("El archivo de Excel usa un método de compresión no soportado.")]
    UnsupportedCompression { method: u16 },

    /// Requested part is absent from the archive index.
    #[error("El archivo de Excel no contiene el recurso \"{0}\".")]
    EntryMissing(String),

    /// Entry exists in the index but decompression or decoding failed.
    #[error("No se pudo descomprimir el recurso \"{path}\" del archivo de Excel.")]
    PartUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Every workbook-path resolution strategy was exhausted.
    #[error("El archivo de Excel no contiene la información del libro.")]
    WorkbookNotFound,

    /// Workbook part has no `<sheet>` elements.
    #[error("El archivo de Excel no contiene hojas de cálculo.")]
    NoSheets,

    /// First sheet carries no relationship id.
    #[error("No se pudo determinar la hoja principal del archivo.")]
    SheetIdMissing,

    /// `xl/_rels/workbook.xml.rels` is absent or unreadable.
    #[error("El archivo de Excel no contiene la información de relaciones necesaria.")]
    RelationshipsUnreadable,

    /// Sheet relationship id has no entry in the workbook relationships.
    #[error("No se encontró la hoja principal del archivo.")]
    RelationshipMissing,

    /// Worksheet part could not be read.
    #[error("No se pudo leer la hoja principal del archivo.")]
    SheetUnreadable,

    /// Worksheet part has no `<sheetData>` element.
    #[error("El archivo de Excel no contiene datos en la hoja principal.")]
    SheetDataMissing,

    /// The underlying XML parser reported an error.
    #[error("El archivo de Excel contiene datos XML no válidos.")]
    XmlMalformed(#[source] quick_xml::Error),

    /// ZIP error from the library-backed archive implementation.
    #[error("El archivo de Excel está dañado o no se reconoce su formato.")]
    Zip(#[from] zip::result::ZipError),

    /// Legacy `.zip` uploads are named rejections, not silent failures.
    #[error(
        "Los archivos ZIP ya no son compatibles con la carga masiva. Utiliza un archivo .xlsx."
    )]
    LegacyZipUpload,

    /// Extension outside the allow-list; the argument is the pre-formatted
    /// allowed-extensions list (e.g. ".xlsx o .xlsm").
    #[error("El archivo debe estar en formato {0}.")]
    DisallowedExtension(String),

    /// Request payload could not be serialized.
    #[error("No se pudieron preparar los datos de la carga masiva.")]
    PayloadSerialization(#[source] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ImportError>;
