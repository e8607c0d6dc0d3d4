//! Input discovery and pack directory naming.

use anyhow::Result;
use soundpack_audio::is_audio;
use soundpack_core::sourcemap::SOURCEMAP_FILE;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

fn extension_in(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| set.iter().any(|s| s.eq_ignore_ascii_case(e)))
}

/// Regular files in `dir`, sorted by lower-cased file name
fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort_by_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}

/// Audio files in `dir`, sorted by name
pub fn list_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_files(dir)?
        .into_iter()
        .filter(|p| is_audio(p))
        .collect())
}

/// First file whose name starts with `license` (any case)
pub fn find_license_file(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(sorted_files(dir)?.into_iter().find(|p| {
        p.file_name()
            .is_some_and(|n| n.to_string_lossy().to_lowercase().starts_with("license"))
    }))
}

/// First image file, used as the pack icon
pub fn find_icon_file(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(sorted_files(dir)?
        .into_iter()
        .find(|p| extension_in(p, IMAGE_EXTENSIONS)))
}

/// Pack directory for a source directory: `<output_root>/<dir name>`
pub fn resolve_target_dir(output_root: &Path, input_dir: &Path) -> PathBuf {
    match input_dir.file_name() {
        Some(name) => output_root.join(name),
        None => output_root.join("soundpack"),
    }
}

/// A sourcemap path, or a directory containing one
pub fn resolve_sourcemap_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join(SOURCEMAP_FILE)
    } else {
        input.to_path_buf()
    }
}

/// The pack directory for `pack -i`.
///
/// Accepts a sourcemap path, a pack directory, or a source directory whose
/// pack lives under `output_root`.
pub fn resolve_pack_dir(input: &Path, output_root: &Path) -> Result<PathBuf> {
    if input.is_file() {
        return input
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow::anyhow!("Could not determine pack directory of {}", input.display()));
    }
    if input.is_dir() {
        if input.join(SOURCEMAP_FILE).exists() || has_config_variant(input)? {
            return Ok(input.to_path_buf());
        }
        return Ok(resolve_target_dir(output_root, input));
    }
    anyhow::bail!("Pack source not found at {}", input.display())
}

fn has_config_variant(dir: &Path) -> Result<bool> {
    Ok(sorted_files(dir)?.iter().any(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .is_some_and(|n| n.starts_with("config.") && n.ends_with(".json"))
    }))
}

/// Pack id: trimmed, whitespace runs become `-`, lower case
pub fn to_id(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase()
}

/// Pack title: `-`/`_` runs become spaces, words capitalised
pub fn to_title(raw: &str) -> String {
    raw.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
