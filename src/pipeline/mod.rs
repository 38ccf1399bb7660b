// Pipeline module declarations
// Each phase is a separate module; `generate` runs the local phases in order

pub mod dump;      // Phase 0: Run the external dumper
pub mod scan;      // Phase 1: Find declaration headers
pub mod parse;     // Phase 2: Extract offsets per file
pub mod aggregate; // Phase 3: Merge into one table
pub mod emit;      // Phase 4: JSON, struct stub, assignment stub
pub mod publish;   // Phase 5: Push the JSON to GitHub

use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

/// What the local phases produced.
#[derive(Debug)]
pub struct GenerateResult {
    pub files_parsed: usize,
    pub namespaces: usize,
    pub offsets: usize,
    pub overrides: usize,
    pub json_file: PathBuf,
    pub type_stub_file: PathBuf,
    pub assignment_stub_file: PathBuf,
}

/// Scan, parse, merge and emit all three artifacts.
///
/// Any I/O failure aborts before the next artifact is written. Identifier
/// collisions are detected before anything is written at all.
pub fn generate(config: &Config) -> Result<GenerateResult> {
    let mut parsed = Vec::new();
    for path in scan::scan(&config.output_dir, &config.input_extension)? {
        parsed.push(parse::parse_file(&path?)?);
    }
    log::info!("Parsed {} header files", parsed.len());

    let merged = aggregate::aggregate(parsed);
    let table = merged.table;
    log::info!(
        "Merged {} offsets across {} namespaces ({} overridden)",
        table.symbol_count(),
        table.namespace_count(),
        merged.overrides
    );

    emit::check_identifiers(&table)?;

    emit::write_json(&table, &config.json_file)?;
    emit::write_type_stub(&table, &config.type_stub_file)?;
    emit::write_assignment_stub(
        &config.json_file,
        &config.assignment_stub_file,
        &config.accessor(),
    )?;

    Ok(GenerateResult {
        files_parsed: merged.files_merged,
        namespaces: table.namespace_count(),
        offsets: table.symbol_count(),
        overrides: merged.overrides,
        json_file: config.json_file.clone(),
        type_stub_file: config.type_stub_file.clone(),
        assignment_stub_file: config.assignment_stub_file.clone(),
    })
}
