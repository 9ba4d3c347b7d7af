use serde::{Deserialize, Serialize};

use crate::{AppError, ErrorSeverity};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultItem {
    pub name: String,
    pub is_selected: bool,
    pub is_loading: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailView {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    /// Capped at the configured display limit.
    pub moves: Vec<String>,
    pub total_moves: usize,
    pub evolutions: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionErrorView {
    pub name: String,
    pub not_found: bool,
    pub error: UserFacingError,
    pub retry_event: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Loading {
        message: Option<String>,
    },
    Ready {
        query: String,
        results: Vec<ResultItem>,
        show_no_results: bool,
        loading_name: Option<String>,
        detail: Option<DetailView>,
        selection_error: Option<SelectionErrorView>,
    },
    Error {
        title: String,
        message: String,
        is_retryable: bool,
        retry_event: Option<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub state: ViewState,
    pub index_size: usize,
}

impl ViewModel {
    pub fn detail(&self) -> Option<&DetailView> {
        match &self.state {
            ViewState::Ready { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    pub fn result_names(&self) -> Vec<&str> {
        match &self.state {
            ViewState::Ready { results, .. } => results.iter().map(|r| r.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn shows_no_results(&self) -> bool {
        matches!(
            self.state,
            ViewState::Ready {
                show_no_results: true,
                ..
            }
        )
    }
}
