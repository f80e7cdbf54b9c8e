use astc_encoder_api::QualityPreset;
use std::fs;
use std::path::{Path, PathBuf};

/// Parses a block footprint written as `WxH`, e.g. `6x6`.
pub fn parse_block_footprint(value: &str) -> Result<(usize, usize), String> {
    let invalid = || format!("Invalid block footprint: {value}. Expected WIDTHxHEIGHT, e.g. 6x6");
    let (width, height) = value
        .to_lowercase()
        .split_once('x')
        .map(|(width, height)| (width.trim().parse(), height.trim().parse()))
        .ok_or_else(invalid)?;
    Ok((width.map_err(|_| invalid())?, height.map_err(|_| invalid())?))
}

/// Parses a quality preset name.
pub fn parse_preset(value: &str) -> Result<QualityPreset, String> {
    QualityPreset::from_name(&value.to_lowercase()).ok_or_else(|| {
        let names: Vec<&str> = QualityPreset::all_values()
            .iter()
            .map(|preset| preset.name())
            .collect();
        format!(
            "Invalid preset: {value}. Valid presets are: {}",
            names.join(", ")
        )
    })
}

/// Accepts an output path, creating its parent directory if needed.
pub fn prepare_output_path(value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {e}"))?;
    }
    Ok(path.to_path_buf())
}

/// Accepts an input path that must exist.
pub fn existing_input_path(value: &str) -> Result<PathBuf, String> {
    fs::canonicalize(value).map_err(|e| format!("Invalid path: {e}"))
}
