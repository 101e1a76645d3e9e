//! CLI tool for xlcargas - normalizes an XLSX bulk-import file and outputs
//! the prepared rows and diagnostics as JSON
//!
//! Usage:
//!   xlcargas_cli <archivo.xlsx>                   # Output JSON to stdout
//!   xlcargas_cli <archivo.xlsx> -o salida.json    # Output JSON to file
//!   xlcargas_cli <archivo.xlsx> --strict          # Require Trip and Ejecutivo

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use xlcargas::{prepare_upload, BulkRules};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: xlcargas_cli <archivo.xlsx> [-o salida.json] [--strict]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let mut output_path: Option<&String> = None;
    let mut rules = BulkRules::relaxed();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" if i + 1 < args.len() => {
                output_path = Some(&args[i + 1]);
                i += 2;
            }
            "--strict" => {
                rules = BulkRules::strict();
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    // Read input file
    let data = match fs::read(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    // Gate the filename, parse and normalize
    let batch = match prepare_upload(input_path, &data, &rules) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Serialize to JSON
    let json = match serde_json::to_string_pretty(&batch) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
