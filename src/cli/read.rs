use std::{error::Error, io::Read, path::Path};

use deltapatch::Delta;

pub fn load_json_file(path: &Path) -> Result<serde_json::Value, Box<dyn Error>> {
    let data = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&data)?;
    Ok(json)
}

pub fn read_from_stdin() -> Result<serde_json::Value, Box<dyn Error>> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    let json: serde_json::Value = serde_json::from_str(&buffer)?;
    Ok(json)
}

/// Read a delta from `path`, or from stdin when there is none.
pub fn load_delta(path: Option<&Path>) -> Result<Delta, Box<dyn Error>> {
    let value = match path {
        Some(path) => load_json_file(path)?,
        None => read_from_stdin()?,
    };
    Ok(Delta::from_value(&value)?)
}
