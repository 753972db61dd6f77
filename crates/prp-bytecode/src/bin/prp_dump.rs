//! Dumps a PRP file as JSON.
//!
//! Usage: `prp-dump <file.prp> [reader-options.json]`
//!
//! Set `RUST_LOG=debug` to see region summaries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use prp_bytecode::{PrpReader, ReaderOptions, ZDefinitionValue};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "prp-dump", about = "Dump a PRP file as JSON")]
struct Cli {
    /// PRP file to read
    file: PathBuf,

    /// JSON reader options (`requireEndOfStream`, `allowTrailingBytes`,
    /// `maxInstructions`)
    options: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let options = match &cli.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ReaderOptions::from_json_str(&text)
                .with_context(|| format!("parsing reader options {}", path.display()))?
        }
        None => ReaderOptions::default(),
    };

    let data =
        std::fs::read(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let reader = PrpReader::with_options(&data, &options).map_err(|err| {
        let region = err.region();
        anyhow::Error::new(err).context(format!(
            "decoding {} ({region} region)",
            cli.file.display()
        ))
    })?;

    let definitions: Vec<Value> = reader
        .definitions()
        .iter()
        .map(|def| {
            let value = match def.value() {
                Some(ZDefinitionValue::IntArray(v)) => json!(v),
                Some(ZDefinitionValue::FloatArray(v)) => json!(v),
                Some(ZDefinitionValue::StringRef(v)) | Some(ZDefinitionValue::StringRefTab(v)) => {
                    json!(v)
                }
                None => Value::Null,
            };
            json!({"name": def.name, "type": format!("{:?}", def.declared), "value": value})
        })
        .collect();

    let header = reader.header();
    let out = json!({
        "header": {
            "rawView": header.raw_view,
            "flags": header.flags.bits(),
            "totalKeys": header.total_keys,
            "zdefsOffset": header.zdefs_offset,
        },
        "objectCount": reader.object_count(),
        "definitions": definitions,
        "instructions": reader.instructions().iter().map(|i| i.to_json()).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
