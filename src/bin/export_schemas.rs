//! Emit JSON Schemas of the documents exchanged with the renderer and
//! template authors.
//!
//! Usage:
//!   cargo run --features cli --bin export_schemas -- breakdown --pretty
//!   cargo run --features cli --bin export_schemas -- template > template.schema.json

use anyhow::Context;
use clap::{Parser, ValueEnum};
use estimate_engine::domain::entities::{LineSpec, Template};
use estimate_engine::domain::services::ExportBreakdown;
use schemars::schema_for;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Document {
    /// Render-ready export breakdown.
    Breakdown,
    /// Estimate template document.
    Template,
    /// Raw line input.
    LineSpec,
}

#[derive(Parser, Debug)]
#[command(name = "export_schemas", about = "Print JSON Schemas of estimate documents", version)]
struct Args {
    /// Document to describe.
    #[arg(value_enum, default_value_t = Document::Breakdown)]
    document: Document,

    /// Pretty-print the schema.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let schema = match args.document {
        Document::Breakdown => schema_for!(ExportBreakdown),
        Document::Template => schema_for!(Template),
        Document::LineSpec => schema_for!(LineSpec),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&schema)
    } else {
        serde_json::to_string(&schema)
    }
    .context("failed to serialize schema")?;

    println!("{json}");
    Ok(())
}
