//! Print the introspection snapshot of the default catalog as pretty JSON.

use ice_api::{init_tracing, CatalogSnapshot, TelemetryConfig};
use ice_catalog::Catalog;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = init_tracing(&TelemetryConfig::from_env()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let catalog = match Catalog::with_defaults() {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "Failed to assemble default catalog");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&CatalogSnapshot::from(&catalog)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize catalog snapshot");
            ExitCode::FAILURE
        }
    }
}
