//! Process-wide skill table with whole-snapshot hot reload.
//!
//! The registry never mutates a table in place. A reload validates the new
//! table, then swaps the `Arc` in one step. Cast sessions and ground groups
//! hold an `Arc<SkillDefinition>` captured when they started, so anything in
//! flight keeps reading the values it began with.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::skill::{CastKind, SkillDefinition, SkillId};

/// Errors raised while building a [`SkillTable`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("skill {0} is defined more than once")]
    DuplicateSkill(SkillId),

    #[error("skill {skill} declares max level {max_level} (allowed 1..={limit})")]
    InvalidMaxLevel {
        skill: SkillId,
        max_level: u8,
        limit: u8,
    },

    #[error("skill {skill} table `{field}` has {len} entries for {max_level} levels")]
    TableTooLong {
        skill: SkillId,
        field: &'static str,
        len: usize,
        max_level: u8,
    },

    #[error("ground skill {0} has no footprint definition")]
    MissingUnitSpec(SkillId),

    #[error("targeted skill {0} cannot define a footprint")]
    UnexpectedUnitSpec(SkillId),

    #[error("channel status on skill {0} requires a footprint")]
    ChannelWithoutUnit(SkillId),
}

impl GameError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateSkill(_) => "REGISTRY_DUPLICATE_SKILL",
            Self::InvalidMaxLevel { .. } => "REGISTRY_INVALID_MAX_LEVEL",
            Self::TableTooLong { .. } => "REGISTRY_TABLE_TOO_LONG",
            Self::MissingUnitSpec(_) => "REGISTRY_MISSING_UNIT_SPEC",
            Self::UnexpectedUnitSpec(_) => "REGISTRY_UNEXPECTED_UNIT_SPEC",
            Self::ChannelWithoutUnit(_) => "REGISTRY_CHANNEL_WITHOUT_UNIT",
        }
    }
}

/// Validated, immutable set of skill definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkillTable {
    skills: BTreeMap<SkillId, Arc<SkillDefinition>>,
}

impl SkillTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates and indexes `definitions`.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = SkillDefinition>,
    ) -> Result<Self, RegistryError> {
        let mut skills = BTreeMap::new();
        for definition in definitions {
            validate(&definition)?;
            let id = definition.id;
            if skills.insert(id, Arc::new(definition)).is_some() {
                return Err(RegistryError::DuplicateSkill(id));
            }
        }
        Ok(Self { skills })
    }

    pub fn get(&self, id: SkillId) -> Option<&Arc<SkillDefinition>> {
        self.skills.get(&id)
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.skills.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SkillDefinition>> {
        self.skills.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.skills.keys().copied()
    }

    /// SHA-256 over every definition in id order.
    #[cfg(feature = "serde")]
    pub fn digest(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for definition in self.skills.values() {
            hasher.update(definition_digest(definition));
        }
        hasher.finalize().into()
    }
}

/// SHA-256 of one definition's bincode encoding.
#[cfg(feature = "serde")]
pub fn definition_digest(definition: &SkillDefinition) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    // Encoding plain data into a Vec cannot fail.
    let bytes = bincode::serialize(definition).unwrap_or_default();
    Sha256::digest(&bytes).into()
}

fn validate(definition: &SkillDefinition) -> Result<(), RegistryError> {
    let id = definition.id;
    let limit = GameConfig::MAX_SKILL_LEVEL;
    if definition.max_level == 0 || definition.max_level > limit {
        return Err(RegistryError::InvalidMaxLevel {
            skill: id,
            max_level: definition.max_level,
            limit,
        });
    }

    let (len, field) = definition.longest_table();
    if len > usize::from(definition.max_level) {
        return Err(RegistryError::TableTooLong {
            skill: id,
            field,
            len,
            max_level: definition.max_level,
        });
    }

    match (definition.cast_kind, definition.unit.is_some()) {
        (CastKind::Ground, false) => return Err(RegistryError::MissingUnitSpec(id)),
        (CastKind::Targeted, true) => return Err(RegistryError::UnexpectedUnitSpec(id)),
        _ => {}
    }

    if definition.channel.is_some() && definition.unit.is_none() {
        return Err(RegistryError::ChannelWithoutUnit(id));
    }

    Ok(())
}

/// What changed between two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReloadSummary {
    pub generation: u64,
    pub added: Vec<SkillId>,
    pub removed: Vec<SkillId>,
    pub changed: Vec<SkillId>,
    pub unchanged: usize,
    /// Hex digest of the new table.
    pub digest: String,
}

/// Owner of the current skill table snapshot.
#[derive(Clone, Debug, Default)]
pub struct SkillRegistry {
    current: Arc<SkillTable>,
    generation: u64,
}

impl SkillRegistry {
    pub fn new(table: SkillTable) -> Self {
        Self {
            current: Arc::new(table),
            generation: 0,
        }
    }

    /// Cheap handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<SkillTable> {
        Arc::clone(&self.current)
    }

    pub fn get(&self, id: SkillId) -> Option<Arc<SkillDefinition>> {
        self.current.get(id).cloned()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Swaps in `table` and reports which skills differ.
    ///
    /// Definitions equal to the previous snapshot keep their old `Arc`, so
    /// holders of an unchanged skill observe no difference at all.
    pub fn reload(&mut self, table: SkillTable) -> ReloadSummary {
        let previous = Arc::clone(&self.current);
        let mut summary = ReloadSummary::default();
        let mut skills = BTreeMap::new();

        for (id, definition) in table.skills {
            match previous.get(id) {
                Some(old) if **old == *definition => {
                    summary.unchanged += 1;
                    skills.insert(id, Arc::clone(old));
                }
                Some(_) => {
                    summary.changed.push(id);
                    skills.insert(id, definition);
                }
                None => {
                    summary.added.push(id);
                    skills.insert(id, definition);
                }
            }
        }
        summary.removed = previous
            .ids()
            .filter(|id| !skills.contains_key(id))
            .collect();

        self.current = Arc::new(SkillTable { skills });
        self.generation += 1;
        summary.generation = self.generation;
        summary.digest = self.digest_hex();

        tracing::info!(
            target: "skill::registry",
            generation = self.generation,
            added = summary.added.len(),
            removed = summary.removed.len(),
            changed = summary.changed.len(),
            unchanged = summary.unchanged,
            digest = %summary.digest,
            "skill table reloaded"
        );

        summary
    }

    #[cfg(feature = "serde")]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.current.digest())
    }

    #[cfg(not(feature = "serde"))]
    pub fn digest_hex(&self) -> String {
        String::new()
    }
}
