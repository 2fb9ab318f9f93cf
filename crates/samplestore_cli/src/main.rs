//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `samplestore_core` linkage and report the core version.
//! - With a database path argument, open (and migrate) that database and
//!   print the sample count and registered sample types.

use samplestore_core::{
    core_version, open_db, DefaultSampleNamingScheme, SampleService, SampleStoreConfig,
    SampleStores,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("samplestore_core version={}", core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match report(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("samplestore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn report(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let service = SampleService::new(
        SampleStores::sqlite(),
        Arc::new(DefaultSampleNamingScheme::new()),
        None,
        &SampleStoreConfig::default(),
    );

    println!("samples={}", service.count(&conn)?);
    println!("sample_types={}", service.list_sample_types(&conn)?.join(","));
    Ok(())
}
