use anyhow::Result;

fn main() -> Result<()> {
    let schema = alchemy::Config::json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
