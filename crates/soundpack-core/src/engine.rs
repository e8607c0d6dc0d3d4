//! The allocation pipeline.
//!
//! ```text
//! pool ──► rules ──► defaults ──► fallbacks ──► Allocation
//!                                                  │
//!                 per schema: strip key-up / split ▼
//!                                               compile
//! ```
//!
//! Allocation runs once per build; each schema then gets its own copy of the
//! assignment, shaped for what that format can express.

use crate::allocator::allocate_defaults;
use crate::assignment::{Assignment, Direction};
use crate::error::Result;
use crate::fallback::apply_fallbacks;
use crate::keys::KeyRegistry;
use crate::resolver::resolve_rules;
use crate::rules::RuleSet;
use crate::schema::{dx, v1, v2, DxConfig, PackMeta, SchemaVersion, V1Config, V2Config};
use crate::sound::SoundFile;
use crate::split::{apply_split, derive_half, half_of, Half};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to do with key-up slots when compiling for a format without them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpSelectorPolicy {
    /// Drop them silently
    #[default]
    Ignore,
    /// Drop them and log a warning per key
    Warn,
}

/// Result of running rules, defaults and fallbacks over a pool
#[derive(Debug, Clone)]
pub struct Allocation {
    pub assignment: Assignment,
    /// Files no stage used
    pub unused: Vec<SoundFile>,
    /// `(file, pattern)` pairs consumed by rules
    pub consumed: Vec<(String, String)>,
    /// First file of the input pool
    pub first_file: Option<SoundFile>,
}

/// An assignment shaped for one schema version
#[derive(Debug, Clone)]
pub struct Prepared {
    pub version: SchemaVersion,
    pub assignment: Assignment,
    /// Whether the timing splitter ran
    pub split: bool,
    pub first_file: Option<String>,
    /// Derived up half of the first file, when split without a `*` fallback
    pub first_up: Option<String>,
    /// `(key, sound)` key-up slots dropped for this version
    pub stripped: Vec<(String, String)>,
}

/// A compiled config document
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledConfig {
    V1(V1Config),
    V2(V2Config),
    Dx(DxConfig),
}

impl CompiledConfig {
    pub fn version(&self) -> SchemaVersion {
        match self {
            CompiledConfig::V1(_) => SchemaVersion::V1,
            CompiledConfig::V2(_) => SchemaVersion::V2,
            CompiledConfig::Dx(_) => SchemaVersion::Dx,
        }
    }

    /// JSON document; `dx_overrides` is merged into dx documents only
    pub fn to_value(&self, dx_overrides: Option<&Value>) -> Result<Value> {
        match self {
            CompiledConfig::V1(config) => Ok(serde_json::to_value(config)?),
            CompiledConfig::V2(config) => Ok(serde_json::to_value(config)?),
            CompiledConfig::Dx(config) => config.to_value_with_overrides(dx_overrides),
        }
    }
}

/// Rule set, key registry and policy bundled for repeated use
#[derive(Debug, Clone, Default)]
pub struct Engine {
    rules: RuleSet,
    registry: KeyRegistry,
    up_policy: UpSelectorPolicy,
}

impl Engine {
    pub fn new(registry: KeyRegistry) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_up_policy(mut self, policy: UpSelectorPolicy) -> Self {
        self.up_policy = policy;
        self
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run rules, default allocation and fallbacks over `pool`
    pub fn allocate<R: Rng + ?Sized>(&self, pool: Vec<SoundFile>, rng: &mut R) -> Allocation {
        let first_file = pool.first().cloned();
        let source_names: Vec<String> = pool.iter().map(|f| f.file.clone()).collect();
        let resolution = resolve_rules(&self.rules, pool, &self.registry);
        let mut assignment = resolution.assignment;
        assignment.reserve_names(&source_names);

        let defaults = allocate_defaults(&mut assignment, resolution.residual, &self.registry, rng);
        let (fallback_down, fallback_up) = apply_fallbacks(&mut assignment, &self.registry);

        log::info!(
            "Allocated {} key-down and {} key-up slot(s): {} by rule, {} direct, {} balanced, {}/{} fallback",
            assignment.count(Direction::Down),
            assignment.count(Direction::Up),
            resolution.consumed.len(),
            defaults.direct,
            defaults.balanced,
            fallback_down,
            fallback_up
        );
        if !defaults.unused.is_empty() {
            log::info!("{} file(s) unused", defaults.unused.len());
        }

        Allocation {
            assignment,
            unused: defaults.unused,
            consumed: resolution.consumed,
            first_file,
        }
    }

    /// Shape an allocation for one schema version.
    ///
    /// v1 and dx lose their key-up slots; dx is always split, v2 only when
    /// `split` is set, v1 never.
    pub fn prepare(&self, allocation: &Allocation, version: SchemaVersion, split: bool) -> Prepared {
        let mut assignment = allocation.assignment.clone();

        let mut stripped = Vec::new();
        if !version.supports_keyup() {
            stripped = assignment.strip_keyup();
            for (key, sound) in &stripped {
                match self.up_policy {
                    UpSelectorPolicy::Warn => {
                        log::warn!("{}: ignoring key-up sound '{}' for key '{}'", version, sound, key)
                    }
                    UpSelectorPolicy::Ignore => {
                        log::debug!("{}: dropped key-up sound '{}' for key '{}'", version, sound, key)
                    }
                }
            }
        }

        let split = match version {
            SchemaVersion::V1 => false,
            SchemaVersion::V2 => split,
            SchemaVersion::Dx => true,
        };
        let mut first_up = None;
        if split {
            apply_split(&mut assignment, &self.registry);
            if assignment.fallback_down.is_none() {
                let first = allocation.first_file.as_ref();
                if let Some((file, range)) = first.and_then(|f| f.timing.map(|range| (&f.file, range))) {
                    let up = derive_half(&assignment, file, Half::Up, half_of(range, Half::Up));
                    first_up = Some(assignment.register(up));
                }
            }
        }

        Prepared {
            version,
            assignment,
            split,
            first_file: allocation.first_file.as_ref().map(|f| f.file.clone()),
            first_up,
            stripped,
        }
    }

    /// Compile a prepared assignment
    pub fn compile(&self, prepared: &Prepared, meta: &PackMeta) -> Result<CompiledConfig> {
        let config = match prepared.version {
            SchemaVersion::V1 => CompiledConfig::V1(v1::compile(&prepared.assignment, &self.registry, meta)?),
            SchemaVersion::V2 => {
                let defaults = v2::V2Defaults {
                    first_file: prepared.first_file.clone(),
                    first_up: prepared.first_up.clone(),
                };
                CompiledConfig::V2(v2::compile(&prepared.assignment, &self.registry, meta, &defaults)?)
            }
            SchemaVersion::Dx => CompiledConfig::Dx(dx::compile(&prepared.assignment, &self.registry, meta)?),
        };
        Ok(config)
    }

    /// Prepare and compile in one step
    pub fn build(
        &self,
        allocation: &Allocation,
        version: SchemaVersion,
        split: bool,
        meta: &PackMeta,
    ) -> Result<CompiledConfig> {
        let prepared = self.prepare(allocation, version, split);
        self.compile(&prepared, meta)
    }
}
