//! Workspace store: arena of layout entries keyed by display id.
//!
//! Every mutation goes through a named operation and is persisted before the
//! operation returns. The store never holds references into itself; callers
//! address displays by [`DisplayId`].

use std::collections::HashMap;

use super::storage::Storage;
use super::{DisplayId, Position, Size, VisualizationType, WorkspaceLayoutEntry};
use crate::error::WorkspaceError;
use crate::shared::Symbol;

/// Offset between successively opened displays.
pub const CASCADE_STEP: f64 = 24.0;

/// Floating-display layout for one workspace.
#[derive(Debug)]
pub struct Workspace<S: Storage> {
    id: String,
    storage: S,
    entries: HashMap<DisplayId, WorkspaceLayoutEntry>,
    next_z: u32,
}

impl<S: Storage> Workspace<S> {
    /// Empty workspace. Nothing is written until the first mutation.
    pub fn new(id: impl Into<String>, storage: S) -> Self {
        Self {
            id: id.into(),
            storage,
            entries: HashMap::new(),
            next_z: 1,
        }
    }

    /// Load a workspace from storage.
    ///
    /// A missing key yields an empty workspace. Unparseable data is moved to
    /// `<key>_old` so it can be recovered by hand, and the workspace starts empty.
    pub fn restore(id: impl Into<String>, storage: S) -> Result<Self, WorkspaceError> {
        let mut workspace = Self::new(id, storage);
        let key = workspace.storage_key();

        let Some(raw) = workspace.storage.load(&key)? else {
            tracing::debug!("No saved layout under '{}'", key);
            return Ok(workspace);
        };

        match serde_json::from_str::<Vec<WorkspaceLayoutEntry>>(&raw) {
            Ok(entries) => {
                for mut entry in entries {
                    entry.size = entry.size.clamped();
                    workspace.next_z = workspace.next_z.max(entry.z_index.saturating_add(1));
                    workspace.entries.insert(entry.id, entry);
                }
                tracing::info!("Restored {} display(s) from '{}'", workspace.entries.len(), key);
            }
            Err(e) => {
                let backup = format!("{key}_old");
                tracing::warn!(
                    "Corrupted layout under '{}' ({}); backing up to '{}'",
                    key,
                    e,
                    backup
                );
                workspace.storage.store(&backup, &raw)?;
                workspace.storage.remove(&key)?;
            }
        }

        Ok(workspace)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Storage key the layout is persisted under.
    pub fn storage_key(&self) -> String {
        format!("workspace-{}", self.id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &DisplayId) -> Option<&WorkspaceLayoutEntry> {
        self.entries.get(id)
    }

    /// Entries in paint order, bottom to top.
    pub fn entries(&self) -> Vec<&WorkspaceLayoutEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| e.z_index);
        entries
    }

    /// The display drawn on top, if any.
    pub fn topmost(&self) -> Option<&WorkspaceLayoutEntry> {
        self.entries.values().max_by_key(|e| e.z_index)
    }

    // ─── Operations ──────────────────────────────────────────────────────

    /// Open a new display on top of the others, cascaded from the topmost one.
    pub fn add_display(
        &mut self,
        symbol: Symbol,
        visualization: VisualizationType,
    ) -> Result<DisplayId, WorkspaceError> {
        let position = self
            .topmost()
            .map(|top| Position::new(top.position.x + CASCADE_STEP, top.position.y + CASCADE_STEP))
            .unwrap_or_default();

        let entry = WorkspaceLayoutEntry {
            id: DisplayId::new(),
            position,
            size: Size::default(),
            symbol,
            visualization,
            z_index: self.take_z(),
        };
        let id = entry.id;
        tracing::debug!("Adding display {} for {}", id, entry.symbol);
        self.entries.insert(id, entry);
        self.persist()?;
        Ok(id)
    }

    pub fn move_display(&mut self, id: &DisplayId, position: Position) -> Result<(), WorkspaceError> {
        self.entry_mut(id)?.position = position;
        self.persist()
    }

    /// Resize a display; sizes below [`Size::MIN`] are clamped.
    pub fn resize_display(&mut self, id: &DisplayId, size: Size) -> Result<(), WorkspaceError> {
        self.entry_mut(id)?.size = size.clamped();
        self.persist()
    }

    /// Bring a display to the front. Always assigns a fresh, higher z-index.
    pub fn focus_display(&mut self, id: &DisplayId) -> Result<u32, WorkspaceError> {
        self.entry_mut(id)?;
        let z = self.take_z();
        self.entry_mut(id)?.z_index = z;
        self.persist()?;
        Ok(z)
    }

    pub fn set_visualization(
        &mut self,
        id: &DisplayId,
        visualization: VisualizationType,
    ) -> Result<(), WorkspaceError> {
        self.entry_mut(id)?.visualization = visualization;
        self.persist()
    }

    pub fn remove_display(&mut self, id: &DisplayId) -> Result<WorkspaceLayoutEntry, WorkspaceError> {
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| WorkspaceError::UnknownDisplay(id.to_string()))?;
        tracing::debug!("Removed display {} ({})", id, entry.symbol);
        self.persist()?;
        Ok(entry)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn entry_mut(&mut self, id: &DisplayId) -> Result<&mut WorkspaceLayoutEntry, WorkspaceError> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| WorkspaceError::UnknownDisplay(id.to_string()))
    }

    fn take_z(&mut self) -> u32 {
        let z = self.next_z;
        self.next_z = self.next_z.saturating_add(1);
        z
    }

    fn persist(&mut self) -> Result<(), WorkspaceError> {
        let json = serde_json::to_string(&self.entries())?;
        let key = self.storage_key();
        self.storage.store(&key, &json)
    }
}
