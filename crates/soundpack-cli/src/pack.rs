//! `pack`: zip a pack directory with one selected config variant.
//!
//! The archive is written next to the pack directory as
//! `<dir>.<variant>.zip`, with every entry under `<dir>/`. The selected
//! `config.<variant>.json` is stored as `config.json`; the sourcemap and the
//! other variants stay out. v2 packs are file based, so the audio blob is
//! replaced by one WAV per sound the config references.

use anyhow::{Context, Result};
use serde_json::Value;
use soundpack_audio::AudioBuffer;
use soundpack_core::sourcemap::SOURCEMAP_FILE;
use soundpack_core::split::{half_of, parse_derived};
use soundpack_core::{Pattern, SchemaVersion, Sourcemap, TimeRange};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Pick the variant to pack: the requested one, else the first built one
pub fn select_variant(pack_dir: &Path, requested: Option<SchemaVersion>) -> Result<SchemaVersion> {
    if let Some(version) = requested {
        return Ok(version);
    }
    SchemaVersion::ALL
        .into_iter()
        .find(|v| pack_dir.join(v.config_file_name()).exists())
        .with_context(|| format!("No config.*.json found in {} (run build first)", pack_dir.display()))
}

/// Write `<pack_dir>.<variant>.zip` and return its path
pub fn pack_target(pack_dir: &Path, variant: SchemaVersion) -> Result<PathBuf> {
    if !pack_dir.is_dir() {
        anyhow::bail!("Pack directory not found at {}", pack_dir.display());
    }
    let dir_name = pack_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Pack directory has no name")?;

    let variant_path = pack_dir.join(variant.config_file_name());
    if !variant_path.exists() {
        anyhow::bail!(
            "Config variant not found: {} (run build with --schema {} or all)",
            variant_path.display(),
            variant
        );
    }

    let assets = if variant == SchemaVersion::V2 {
        let config: Value = serde_json::from_str(&fs::read_to_string(&variant_path)?)
            .with_context(|| format!("Failed to parse {}", variant_path.display()))?;
        materialize_v2_assets(pack_dir, &config)?
    } else {
        BTreeMap::new()
    };
    let blob_name = if variant == SchemaVersion::V2 {
        Some(audio_file_name(pack_dir)?)
    } else {
        None
    };

    let zip_path = pack_dir.with_file_name(format!("{}.{}.zip", dir_name, variant));
    let file = File::create(&zip_path).with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in walk_files(pack_dir)? {
        let relative = path
            .strip_prefix(pack_dir)
            .context("Walked outside the pack directory")?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if is_excluded(&relative, blob_name.as_deref()) || assets.contains_key(&relative) {
            continue;
        }
        zip.start_file(format!("{}/{}", dir_name, relative), options)?;
        zip.write_all(&fs::read(&path)?)?;
    }

    for (name, data) in &assets {
        zip.start_file(format!("{}/{}", dir_name, name), options)?;
        zip.write_all(data)?;
    }

    zip.start_file(format!("{}/config.json", dir_name), options)?;
    zip.write_all(&fs::read(&variant_path)?)?;
    zip.finish()?;

    log::info!(
        "Packed {} ({} materialized sound(s))",
        zip_path.display(),
        assets.len()
    );
    Ok(zip_path)
}

fn is_excluded(relative: &str, blob_name: Option<&str>) -> bool {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    name == SOURCEMAP_FILE
        || name == "config.json"
        || (name.starts_with("config.") && name.ends_with(".json"))
        || blob_name.is_some_and(|blob| relative == blob)
}

/// All regular files under `dir`, sorted
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn audio_file_name(pack_dir: &Path) -> Result<String> {
    Ok(load_sourcemap(pack_dir)?.audio_file)
}

fn load_sourcemap(pack_dir: &Path) -> Result<Sourcemap> {
    let path = pack_dir.join(SOURCEMAP_FILE);
    if !path.exists() {
        anyhow::bail!("{} not found (run prepare first)", path.display());
    }
    Sourcemap::load(&path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Names a v2 config references: `sound`, `soundup` and every define value
fn referenced_sounds(config: &Value) -> Vec<String> {
    let mut names: Vec<String> = ["sound", "soundup"]
        .iter()
        .filter_map(|k| config.get(k).and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    if let Some(defines) = config.get("defines").and_then(Value::as_object) {
        names.extend(defines.values().filter_map(Value::as_str).map(str::to_string));
    }
    names.retain(|n| !n.is_empty());
    names.sort();
    names.dedup();
    names
}

/// Slice every sound a v2 config references out of the audio blob.
///
/// A name is resolved as a sourcemap file, then as a split-derived name of
/// one (`1-up.wav`, `1-up-2.wav`), then as a pattern over sourcemap files. Names that
/// resolve to nothing are accepted only if the file already exists in the
/// pack directory.
pub fn materialize_v2_assets(pack_dir: &Path, config: &Value) -> Result<BTreeMap<String, Vec<u8>>> {
    let sourcemap = load_sourcemap(pack_dir)?;
    let files = sourcemap.filenames();
    if files.is_empty() {
        anyhow::bail!("No files found in {}", SOURCEMAP_FILE);
    }

    let mut needed: BTreeMap<String, Vec<TimeRange>> = BTreeMap::new();
    for name in referenced_sounds(config) {
        let resolved = resolve_asset(&name, &sourcemap, &files);
        if resolved.is_empty() {
            if pack_dir.join(&name).exists() {
                continue;
            }
            anyhow::bail!("Config references '{}', but it matches no files in {}", name, SOURCEMAP_FILE);
        }
        needed.extend(resolved);
    }
    if needed.is_empty() {
        return Ok(BTreeMap::new());
    }

    let blob_path = pack_dir.join(&sourcemap.audio_file);
    let blob = AudioBuffer::read(&blob_path)
        .with_context(|| format!("Failed to read audio file {}", blob_path.display()))?;

    let mut assets = BTreeMap::new();
    for (name, ranges) in needed {
        let mut clip = AudioBuffer::empty(blob.spec());
        for range in ranges {
            clip.append(&blob.slice_ms(range.start, range.end)?, &name)?;
        }
        assets.insert(name, clip.to_wav_bytes()?);
    }
    Ok(assets)
}

fn resolve_asset(name: &str, sourcemap: &Sourcemap, files: &[String]) -> Vec<(String, Vec<TimeRange>)> {
    if files.iter().any(|f| f == name) {
        return vec![(name.to_string(), sourcemap.timings_of(name))];
    }

    if let Some((base, half)) = parse_derived(name) {
        if files.contains(&base) {
            let ranges = sourcemap
                .timings_of(&base)
                .into_iter()
                .map(|r| half_of(r, half))
                .collect();
            return vec![(name.to_string(), ranges)];
        }
    }

    Pattern::compile(name)
        .select(files)
        .into_iter()
        .map(|file| (file.clone(), sourcemap.timings_of(file)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{run_build, BuildOptions};
    use crate::prepare::run_prepare;
    use crate::prepare::tests::write_wav;
    use std::io::Read;
    use zip::ZipArchive;

    fn built_pack(dir: &Path, rule: Option<&str>, split: bool, schemas: &[SchemaVersion]) -> PathBuf {
        let source = dir.join("pack");
        fs::create_dir(&source).unwrap();
        write_wav(&source.join("1.wav"), 200, 1);
        write_wav(&source.join("key1.wav"), 100, 2);
        write_wav(&source.join("key2.wav"), 100, 3);
        fs::write(source.join("license.txt"), "MIT").unwrap();

        let sourcemap = run_prepare(&source, &dir.join("target").join("pack")).unwrap();
        let rule = rule.map(|text| {
            let path = dir.join("rule.json");
            fs::write(&path, text).unwrap();
            path
        });
        let options = BuildOptions {
            rule,
            split,
            schemas: schemas.to_vec(),
            seed: Some(3),
            ..Default::default()
        };
        run_build(&sourcemap, &options).unwrap();
        sourcemap.parent().unwrap().to_path_buf()
    }

    fn entry_names(zip_path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_pack_v1_layout() {
        let dir = tempfile::tempdir().unwrap();
        let pack = built_pack(dir.path(), None, false, &SchemaVersion::ALL);

        let zip_path = pack_target(&pack, SchemaVersion::V1).unwrap();
        assert_eq!(zip_path, dir.path().join("target").join("pack.v1.zip"));
        assert_eq!(
            entry_names(&zip_path),
            vec!["pack/config.json", "pack/license.txt", "pack/sound.wav"]
        );

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut config = String::new();
        archive.by_name("pack/config.json").unwrap().read_to_string(&mut config).unwrap();
        assert_eq!(config, fs::read_to_string(pack.join("config.v1.json")).unwrap());
    }

    #[test]
    fn test_pack_v2_materializes_sounds() {
        let dir = tempfile::tempdir().unwrap();
        let pack = built_pack(
            dir.path(),
            Some(r#"{"map": {"key{1-2}.wav": ["Enter"], "1.wav": ["*"]}}"#),
            true,
            &[SchemaVersion::V2],
        );

        let zip_path = pack_target(&pack, SchemaVersion::V2).unwrap();
        let names = entry_names(&zip_path);
        assert!(!names.contains(&"pack/sound.wav".to_string()));
        assert!(!names.contains(&"pack/sourcemap.json".to_string()));
        for expected in ["pack/key1.wav", "pack/key2.wav", "pack/1-down.wav", "pack/1-up.wav"] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut bytes = Vec::new();
        archive.by_name("pack/1-up.wav").unwrap().read_to_end(&mut bytes).unwrap();
        let path = dir.path().join("1-up.wav");
        fs::write(&path, bytes).unwrap();
        assert_eq!(AudioBuffer::read(&path).unwrap().frames(), 100);
    }

    #[test]
    fn test_pack_v2_keeps_split_half_apart_from_real_up_clip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("pack");
        fs::create_dir(&source).unwrap();
        write_wav(&source.join("enter.wav"), 200, 1);
        write_wav(&source.join("enter-up.wav"), 300, 2);
        let sourcemap = run_prepare(&source, &dir.path().join("target").join("pack")).unwrap();
        let options = BuildOptions {
            split: true,
            schemas: vec![SchemaVersion::V2],
            seed: Some(3),
            ..Default::default()
        };
        run_build(&sourcemap, &options).unwrap();
        let pack = sourcemap.parent().unwrap().to_path_buf();

        let config: Value = serde_json::from_str(&fs::read_to_string(pack.join("config.v2.json")).unwrap()).unwrap();
        assert_eq!(config["defines"]["28-up"], "enter-up-2.wav");

        let zip_path = pack_target(&pack, SchemaVersion::V2).unwrap();
        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut bytes = Vec::new();
        archive.by_name("pack/enter-up-2.wav").unwrap().read_to_end(&mut bytes).unwrap();
        let path = dir.path().join("enter-up-2.wav");
        fs::write(&path, bytes).unwrap();
        assert_eq!(AudioBuffer::read(&path).unwrap().frames(), 100);
    }

    #[test]
    fn test_select_variant() {
        let dir = tempfile::tempdir().unwrap();
        assert!(select_variant(dir.path(), None).is_err());
        fs::write(dir.path().join("config.dx.json"), "{}").unwrap();
        assert_eq!(select_variant(dir.path(), None).unwrap(), SchemaVersion::Dx);
        assert_eq!(
            select_variant(dir.path(), Some(SchemaVersion::V1)).unwrap(),
            SchemaVersion::V1
        );
    }

    #[test]
    fn test_unresolvable_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pack = built_pack(dir.path(), None, false, &SchemaVersion::ALL);
        let config = serde_json::json!({"sound": "missing.wav", "defines": {}});
        assert!(materialize_v2_assets(&pack, &config).is_err());
    }
}
