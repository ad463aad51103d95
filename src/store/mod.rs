//! Program and value storage
//!
//! `ActionStore` holds the compiled, read-shared program definitions.
//! `OverrideStore` holds per-group override sets. `ValueStore` is the
//! document store contract operation handlers read and write through.

pub mod memory;
pub mod value;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::types::{Block, Override, Program, ProgramFile, Sequence};

pub use memory::MemoryValueStore;
pub use value::{
    compose_id, DeleteOptions, DeleteResult, GetOptions, GetResult, SetOptions, SetResult,
    UpdateMethod, UpdateOptions, ValueStore,
};

/* ===================== Action Store ===================== */

/// Read-only store of blocks, sequences and actions
///
/// Entries are handed out as `Arc`s so concurrent dispatches share them
/// without copying.
#[derive(Debug, Clone, Default)]
pub struct ActionStore {
    blocks: HashMap<String, Arc<Block>>,
    sequences: HashMap<String, Arc<Sequence>>,
    actions: HashMap<String, Arc<Program>>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a program file, dropping its override sets
    ///
    /// Use [`ActionStore::split_file`] to keep them.
    pub fn from_file(file: ProgramFile) -> Self {
        Self::split_file(file).0
    }

    /// Build a store and an override store from one program file
    pub fn split_file(file: ProgramFile) -> (Self, OverrideStore) {
        let mut store = Self::new();
        for (id, block) in file.blocks {
            store.insert_block(id, block);
        }
        for (id, sequence) in file.sequences {
            store.insert_sequence(id, sequence);
        }
        for (id, program) in file.actions {
            store.insert_action(id, program);
        }

        let overrides = OverrideStore::new();
        for set in file.overrides {
            overrides.set(&set.group_id, &set.action_id, set.overrides);
        }

        (store, overrides)
    }

    pub fn from_json(source: &str) -> Result<(Self, OverrideStore)> {
        let file: ProgramFile =
            serde_json::from_str(source).context("Failed to parse program file")?;
        Ok(Self::split_file(file))
    }

    pub fn load(path: &Path) -> Result<(Self, OverrideStore)> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read program file {}", path.display()))?;
        Self::from_json(&source)
    }

    pub fn insert_block(&mut self, id: impl Into<String>, mut block: Block) {
        let id = id.into();
        block.id = id.clone();
        self.blocks.insert(id, Arc::new(block));
    }

    pub fn insert_sequence(&mut self, id: impl Into<String>, sequence: Sequence) {
        self.sequences.insert(id.into(), Arc::new(sequence));
    }

    pub fn insert_action(&mut self, id: impl Into<String>, program: Program) {
        self.actions.insert(id.into(), Arc::new(program));
    }

    pub fn block(&self, id: &str) -> Option<Arc<Block>> {
        self.blocks.get(id).cloned()
    }

    pub fn sequence(&self, id: &str) -> Option<Arc<Sequence>> {
        self.sequences.get(id).cloned()
    }

    pub fn action(&self, id: &str) -> Option<Arc<Program>> {
        self.actions.get(id).cloned()
    }

    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

/* ===================== Override Store ===================== */

/// Override sets keyed by (group id, action id)
#[derive(Debug, Default)]
pub struct OverrideStore {
    sets: RwLock<HashMap<(String, String), Arc<Vec<Override>>>>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the overrides a group applies to an action
    pub fn set(&self, group_id: &str, action_id: &str, overrides: Vec<Override>) {
        let mut sets = self.sets.write().unwrap_or_else(|e| e.into_inner());
        sets.insert(
            (group_id.to_string(), action_id.to_string()),
            Arc::new(overrides),
        );
    }

    pub fn remove(&self, group_id: &str, action_id: &str) -> bool {
        let mut sets = self.sets.write().unwrap_or_else(|e| e.into_inner());
        sets.remove(&(group_id.to_string(), action_id.to_string()))
            .is_some()
    }

    /// Overrides for a group/action pair; empty when none are registered
    pub fn get(&self, group_id: Option<&str>, action_id: &str) -> Arc<Vec<Override>> {
        let Some(group_id) = group_id else {
            return Arc::default();
        };
        let sets = self.sets.read().unwrap_or_else(|e| e.into_inner());
        sets.get(&(group_id.to_string(), action_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}
