//! `build`: allocate sounds to keys and write one config per schema.

use crate::paths::{find_icon_file, find_license_file, to_id, to_title};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use soundpack_core::schema::DxOptions;
use soundpack_core::{Engine, KeyRegistry, PackMeta, RuleSet, SchemaVersion, Sourcemap, UpSelectorPolicy};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything `build` needs besides the sourcemap
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub rule: Option<PathBuf>,
    pub split: bool,
    pub schemas: Vec<SchemaVersion>,
    pub dx_compatible: bool,
    pub seed: Option<u64>,
    pub up_policy: UpSelectorPolicy,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub includes_numpad: bool,
    pub dx_options: DxOptions,
    pub dx_overrides: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            rule: None,
            split: false,
            schemas: SchemaVersion::ALL.to_vec(),
            dx_compatible: false,
            seed: None,
            up_policy: UpSelectorPolicy::default(),
            author: None,
            tags: Vec::new(),
            includes_numpad: true,
            dx_options: DxOptions::default(),
            dx_overrides: None,
        }
    }
}

/// Compile configs for the sourcemap at `sourcemap_path`.
///
/// Configs are written next to the sourcemap as `config.<version>.json`;
/// the license and icon found in the source directory are copied along.
/// Returns the written config paths in schema order.
pub fn run_build(sourcemap_path: &Path, options: &BuildOptions) -> Result<Vec<(SchemaVersion, PathBuf)>> {
    if !sourcemap_path.exists() {
        anyhow::bail!(
            "{} not found (run prepare first)",
            sourcemap_path.display()
        );
    }
    let sourcemap = Sourcemap::load(sourcemap_path)
        .with_context(|| format!("Failed to read {}", sourcemap_path.display()))?;
    let target_dir = sourcemap_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let pool = sourcemap.pool()?;

    let rules = match &options.rule {
        Some(path) => {
            log::info!("Loading rules from {}", path.display());
            RuleSet::load(path).with_context(|| format!("Failed to load rule file: {}", path.display()))?
        }
        None => RuleSet::default(),
    };
    let engine = Engine::new(KeyRegistry::standard())
        .with_rules(rules)
        .with_up_policy(options.up_policy);

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let allocation = engine.allocate(pool, &mut rng);
    for file in &allocation.unused {
        log::debug!("Unused: {}", file.file);
    }

    let source_dir = sourcemap
        .source_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| target_dir.clone());
    let (icon, license) = if source_dir.is_dir() {
        (find_icon_file(&source_dir)?, find_license_file(&source_dir)?)
    } else {
        log::warn!("Source directory {} not found, skipping icon and license", source_dir.display());
        (None, None)
    };
    let icon = copy_source_asset(icon.as_deref(), &target_dir)?;
    copy_source_asset(license.as_deref(), &target_dir)?;

    let raw_name = target_dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "soundpack".to_string());
    let meta = PackMeta {
        author: options.author.clone(),
        icon,
        tags: options.tags.clone(),
        includes_numpad: options.includes_numpad,
        dx_compatible: options.dx_compatible,
        audio_file: sourcemap.audio_file.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
        options: options.dx_options.clone(),
        ..PackMeta::new(to_id(&raw_name), to_title(&raw_name))
    };

    let overrides = options
        .dx_overrides
        .as_deref()
        .map(load_overrides)
        .transpose()?;

    let mut written = Vec::new();
    for &version in &options.schemas {
        let compiled = engine
            .build(&allocation, version, options.split, &meta)
            .with_context(|| format!("Failed to build {} config", version))?;
        let value = compiled.to_value(overrides.as_ref())?;

        let path = target_dir.join(version.config_file_name());
        fs::write(&path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
        written.push((version, path));
    }
    Ok(written)
}

/// Copy a discovered source file into the pack directory; returns its name
fn copy_source_asset(found: Option<&Path>, target_dir: &Path) -> Result<Option<String>> {
    let Some(path) = found else {
        return Ok(None);
    };
    let Some(name) = path.file_name() else {
        return Ok(None);
    };
    let dest = target_dir.join(name);
    fs::copy(&path, &dest).with_context(|| format!("Failed to copy {}", path.display()))?;
    log::debug!("Copied {}", name.to_string_lossy());
    Ok(Some(name.to_string_lossy().into_owned()))
}

fn load_overrides(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dx overrides: {}", path.display()))?;
    soundpack_core::relaxed_json::from_str(&text)
        .with_context(|| format!("Failed to parse dx overrides: {}", path.display()))
}
