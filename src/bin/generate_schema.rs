//! Print the JSON schema of the ruler configuration to stdout

use annotation_ruler::RulerConfig;

fn main() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(RulerConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
