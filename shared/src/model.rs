use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::lineage::LineageNode;
use crate::search::SearchState;
use crate::AppError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub name: String,
}

impl IndexEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CategoryRef {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MoveRef {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DetailRecord {
    pub id: u32,
    pub name: String,
    pub types: Vec<CategoryRef>,
    pub moves: Vec<MoveRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SelectedDetail {
    pub detail: DetailRecord,
    pub lineage: LineageNode,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Before `AppStarted`.
    #[default]
    Idle,
    Loading,
    Ready,
    LoadFailed(AppError),
}

/// The selection whose responses are currently accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingSelection {
    pub seq: u64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SelectionFailure {
    pub name: String,
    pub error: AppError,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    pub config: CoreConfig,
    pub phase: LoadPhase,
    pub search: SearchState,
    pub selected_detail: Option<SelectedDetail>,

    // Selection bookkeeping
    pub selection_seq: u64,
    pub pending_selection: Option<PendingSelection>,
    pub selection_error: Option<SelectionFailure>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, LoadPhase::Ready)
    }

    /// Starts a new selection, superseding any in flight, and returns its
    /// sequence number.
    pub fn begin_selection(&mut self, name: impl Into<String>) -> u64 {
        self.selection_seq += 1;
        self.pending_selection = Some(PendingSelection {
            seq: self.selection_seq,
            name: name.into(),
        });
        self.selection_error = None;
        self.selection_seq
    }

    /// Drops the in-flight selection so its responses are ignored.
    pub fn cancel_selection(&mut self) {
        self.selection_seq += 1;
        self.pending_selection = None;
    }

    pub fn is_current_selection(&self, seq: u64) -> bool {
        self.pending_selection
            .as_ref()
            .is_some_and(|pending| pending.seq == seq)
    }

    pub fn complete_selection(&mut self, selected: SelectedDetail) {
        self.pending_selection = None;
        self.selection_error = None;
        self.selected_detail = Some(selected);
    }

    /// The previous detail stays on screen; only the failure is recorded.
    pub fn fail_selection(&mut self, name: impl Into<String>, error: AppError) {
        self.pending_selection = None;
        self.selection_error = Some(SelectionFailure {
            name: name.into(),
            error,
        });
    }

    pub fn set_query(&mut self, value: impl Into<String>) {
        self.search.set_query(value);
        self.selected_detail = None;
        self.selection_error = None;
        self.cancel_selection();
    }

    pub fn index_loaded(&mut self, entries: Vec<IndexEntry>) {
        self.search = SearchState::new(entries);
        self.selected_detail = None;
        self.phase = LoadPhase::Ready;
    }
}
