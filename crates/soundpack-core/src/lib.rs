//! Soundpack Core - Rule-driven key sound allocation and config compilation.
//!
//! This crate turns a pool of audio clips into keyboard soundpack configs:
//!
//! - **Patterns** - Exact, brace-range, regex and glob file matching
//! - **Rules** - Ordered `pattern -> keys` rules that consume files
//! - **Allocation** - Direct name matches and balanced random distribution
//! - **Fallbacks** - `*` / `*_UP` sounds for keys nothing else claimed
//! - **Split** - Deriving key-down/key-up halves from one timing range
//! - **Schemas** - v1, v2 and dx config documents
//! - **Sourcemap** - The intermediate clip/timing document
//!
//! # Architecture
//!
//! The [`Engine`] threads a shrinking file pool through the rule resolver and
//! the default allocator, producing an [`Assignment`] of keys to
//! [`VirtualSound`]s. Each schema version then receives its own copy of the
//! assignment (key-up slots stripped or timings split as the format needs)
//! before compilation. Randomness is always supplied by the caller.

pub mod allocator;
pub mod assignment;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod keys;
pub mod pattern;
pub mod relaxed_json;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod sound;
pub mod sourcemap;
pub mod split;

pub use assignment::{Assignment, Direction, Provenance, Slot};
pub use engine::{Allocation, CompiledConfig, Engine, Prepared, UpSelectorPolicy};
pub use error::{Error, Result};
pub use keys::{KeyDef, KeyRegistry};
pub use pattern::Pattern;
pub use rules::{Rule, RuleSet, Selector};
pub use schema::{parse_schema_selection, PackMeta, SchemaVersion};
pub use sound::{SoundFile, TimeRange, VirtualSound};
pub use sourcemap::Sourcemap;
pub use split::Half;
