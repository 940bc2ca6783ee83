//! In-memory folder tree for organising processes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::bag::ItemBag;
use crate::catalog::Catalog;
use crate::id::{FolderId, ProcessId};
use crate::process::CraftingProcess;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryId {
    Folder(FolderId),
    Process(ProcessId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Entry {
    Folder(ProcessFolder),
    Process(CraftingProcess),
}

impl Entry {
    pub fn id(&self) -> EntryId {
        match self {
            Entry::Folder(folder) => EntryId::Folder(folder.id),
            Entry::Process(process) => EntryId::Process(process.id()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::Folder(folder) => &folder.name,
            Entry::Process(process) => &process.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }

    pub fn totals(&self) -> ItemBag {
        match self {
            Entry::Folder(folder) => folder.totals(),
            Entry::Process(process) => process.totals().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FolderError {
    #[error("no folder with id {0}")]
    UnknownFolder(FolderId),
    #[error("folder {0} cannot be moved into itself")]
    MoveIntoSelf(FolderId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFolder {
    #[serde(default)]
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Default for ProcessFolder {
    fn default() -> Self {
        Self::new("New Folder")
    }
}

impl ProcessFolder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Sum of every entry's totals, recursively.
    pub fn totals(&self) -> ItemBag {
        self.entries.iter().map(Entry::totals).sum()
    }

    pub fn add_process(&mut self, process: CraftingProcess) -> ProcessId {
        let id = process.id();
        self.entries.push(Entry::Process(process));
        id
    }

    pub fn add_subfolder(&mut self, name: impl Into<String>) -> FolderId {
        let folder = ProcessFolder::new(name);
        let id = folder.id;
        self.entries.push(Entry::Folder(folder));
        id
    }

    /// Insert `entries` at `index`, or at the end.
    pub fn add(&mut self, entries: impl IntoIterator<Item = Entry>, index: Option<usize>) {
        let index = index.unwrap_or(self.entries.len()).min(self.entries.len());
        self.entries.splice(index..index, entries);
    }

    /// Detach the direct children listed in `ids`, in their current order.
    pub fn remove_entries(&mut self, ids: &HashSet<EntryId>) -> Vec<Entry> {
        let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| ids.contains(&entry.id()));
        self.entries = kept;
        removed
    }

    /// Move direct children listed in `ids` to the end of the folder
    /// `destination`, which may be nested anywhere below this one.
    pub fn move_entries(
        &mut self,
        ids: &HashSet<EntryId>,
        destination: FolderId,
    ) -> Result<(), FolderError> {
        if destination == self.id {
            return Ok(());
        }
        let moving_folders = self.entries.iter().filter_map(|entry| match entry {
            Entry::Folder(folder) if ids.contains(&entry.id()) => Some(folder),
            _ => None,
        });
        for folder in moving_folders {
            if folder.find_folder(destination).is_some() {
                return Err(FolderError::MoveIntoSelf(folder.id));
            }
        }
        if self.find_folder(destination).is_none() {
            return Err(FolderError::UnknownFolder(destination));
        }

        let moved = self.remove_entries(ids);
        let target = self
            .find_folder_mut(destination)
            .ok_or(FolderError::UnknownFolder(destination))?;
        target.entries.extend(moved);
        Ok(())
    }

    /// Wrap the direct children listed in `ids` in a new subfolder placed
    /// where the first of them was.
    pub fn create_subfolder(&mut self, ids: &HashSet<EntryId>) -> FolderId {
        let index = self
            .entries
            .iter()
            .position(|entry| ids.contains(&entry.id()))
            .unwrap_or(self.entries.len());
        let moved = self.remove_entries(ids);
        let mut subfolder = ProcessFolder::default();
        subfolder.entries = moved;
        let id = subfolder.id;
        self.entries.insert(index, Entry::Folder(subfolder));
        id
    }

    /// This folder or a descendant with the given id.
    pub fn find_folder(&self, id: FolderId) -> Option<&ProcessFolder> {
        if self.id == id {
            return Some(self);
        }
        self.entries.iter().find_map(|entry| match entry {
            Entry::Folder(folder) => folder.find_folder(id),
            Entry::Process(_) => None,
        })
    }

    pub fn find_folder_mut(&mut self, id: FolderId) -> Option<&mut ProcessFolder> {
        if self.id == id {
            return Some(self);
        }
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Folder(folder) => folder.find_folder_mut(id),
            Entry::Process(_) => None,
        })
    }

    pub fn find_process_mut(&mut self, id: ProcessId) -> Option<&mut CraftingProcess> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Folder(folder) => folder.find_process_mut(id),
            Entry::Process(process) if process.id() == id => Some(process),
            Entry::Process(_) => None,
        })
    }

    /// Recompute the totals of every process in the tree. Needed after
    /// deserializing a folder.
    pub fn recompute(&mut self, catalog: &Catalog) {
        for entry in &mut self.entries {
            match entry {
                Entry::Folder(folder) => folder.recompute(catalog),
                Entry::Process(process) => process.recompute(catalog),
            }
        }
    }

    /// Every process in the tree, depth first.
    pub fn processes(&self) -> Vec<&CraftingProcess> {
        let mut out = Vec::new();
        self.collect_processes(&mut out);
        out
    }

    fn collect_processes<'a>(&'a self, out: &mut Vec<&'a CraftingProcess>) {
        for entry in &self.entries {
            match entry {
                Entry::Folder(folder) => folder.collect_processes(out),
                Entry::Process(process) => out.push(process),
            }
        }
    }
}
