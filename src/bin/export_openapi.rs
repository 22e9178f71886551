//! Export an OpenAPI document as JSON
//!
//! Usage:
//!   cargo run --bin export_openapi > public.json
//!   cargo run --bin export_openapi -- --admin --output docs/admin.json

use paygate::gateway::openapi::{AdminApiDoc, PublicApiDoc};
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let admin = args.iter().any(|a| a == "--admin");
    let output_path = args
        .iter()
        .position(|a| a == "--output")
        .and_then(|i| args.get(i + 1));

    let spec = if admin {
        AdminApiDoc::openapi()
    } else {
        PublicApiDoc::openapi()
    };
    let json = spec.to_pretty_json()?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &json)?;
            eprintln!("OpenAPI spec exported to: {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
