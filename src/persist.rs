//! Save and load small sets of named values as JSON.
//!
//! Handy for keeping ad-hoc state (calibration values, capture settings)
//! next to a recording. Not part of the container format.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Named values, kept in key order on disk.
pub type NamedValues = BTreeMap<String, serde_json::Value>;

/// Write `values` to `path`, replacing any existing file.
pub fn save<P: AsRef<Path>>(path: P, values: &NamedValues) -> io::Result<()> {
    let json = serde_json::to_string_pretty(values)?;
    fs::write(path, json)
}

/// Load values previously written by [`save`].
pub fn load<P: AsRef<Path>>(path: P) -> io::Result<NamedValues> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
