//! Default allocation for files no rule consumed.
//!
//! Two passes over the residual pool:
//!
//! 1. files named after a key (`enter.wav` -> `Enter`) go straight to that key
//! 2. the rest are shuffled and dealt round-robin over the keys that still
//!    have no key-down sound, so every file is used `floor(N/M)` or
//!    `ceil(N/M)` times
//!
//! The second pass is skipped when a rule designated a `*` fallback; that
//! sound owns every remaining key. Key-up slots are never touched here.

use crate::assignment::{Assignment, Direction, Provenance};
use crate::keys::KeyRegistry;
use crate::sound::{SoundFile, VirtualSound};
use rand::seq::SliceRandom;
use rand::Rng;

/// Summary of the default pass
#[derive(Debug, Clone, Default)]
pub struct DefaultAllocation {
    /// Keys filled by name match
    pub direct: usize,
    /// Keys filled by balanced distribution
    pub balanced: usize,
    /// Files that ended up on no key
    pub unused: Vec<SoundFile>,
}

/// Run both default passes.
///
/// `rng` decides tie-breaking among equally eligible files; pass a seeded
/// generator for reproducible output.
pub fn allocate_defaults<R: Rng + ?Sized>(
    assignment: &mut Assignment,
    residual: Vec<SoundFile>,
    registry: &KeyRegistry,
    rng: &mut R,
) -> DefaultAllocation {
    let mut report = DefaultAllocation::default();

    let mut remaining = Vec::with_capacity(residual.len());
    for file in residual {
        let target = registry
            .names()
            .find(|key| key.eq_ignore_ascii_case(&file.name) && !assignment.is_assigned(key, Direction::Down));
        match target {
            Some(key) => {
                let name = assignment.register(VirtualSound::single(&file));
                assignment.claim(key, Direction::Down, &name, Provenance::Direct);
                report.direct += 1;
            }
            None => remaining.push(file),
        }
    }

    // Key-named files stay reserved for their key even when a rule took it.
    let (reserved, mut pool): (Vec<SoundFile>, Vec<SoundFile>) =
        remaining.into_iter().partition(|f| registry.contains(&f.name));
    if !reserved.is_empty() {
        log::debug!("{} key-named file(s) withheld from distribution", reserved.len());
    }
    report.unused.extend(reserved);

    if assignment.fallback_down.is_some() {
        report.unused.extend(pool);
        return report;
    }

    let open_keys: Vec<&'static str> = registry
        .names()
        .filter(|key| !assignment.is_assigned(key, Direction::Down))
        .collect();
    if pool.is_empty() || open_keys.is_empty() {
        report.unused.extend(pool);
        return report;
    }

    pool.shuffle(rng);
    for (i, key) in open_keys.iter().enumerate() {
        let file = &pool[i % pool.len()];
        let name = assignment.register(VirtualSound::single(file));
        assignment.claim(key, Direction::Down, &name, Provenance::Balanced);
        report.balanced += 1;
    }
    if pool.len() > open_keys.len() {
        report.unused.extend(pool.split_off(open_keys.len()));
    }

    log::debug!(
        "Default allocation: {} direct, {} balanced, {} unused",
        report.direct,
        report.balanced,
        report.unused.len()
    );
    report
}
