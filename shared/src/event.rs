use serde::{Deserialize, Serialize};

use crate::capabilities::FetchResult;
use crate::config::CoreConfig;
use crate::model::DetailRecord;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub enum Event {
    #[default]
    Noop,

    /// Replaces the configuration. Only accepted before `AppStarted`.
    Configure {
        config: CoreConfig,
    },
    AppStarted,
    RetryIndexLoad,

    QueryChanged {
        value: String,
    },

    EntitySelected {
        name: String,
    },
    RetrySelection,
    DismissSelectionError,

    // Responses, only ever produced by the core's own requests
    #[serde(skip)]
    IndexFetched(Box<FetchResult>),
    #[serde(skip)]
    DetailFetched {
        seq: u64,
        name: String,
        result: Box<FetchResult>,
    },
    #[serde(skip)]
    LineageFetched {
        seq: u64,
        detail: Box<DetailRecord>,
        result: Box<FetchResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure { .. } => "configure",
            Self::AppStarted => "app_started",
            Self::RetryIndexLoad => "retry_index_load",
            Self::QueryChanged { .. } => "query_changed",
            Self::EntitySelected { .. } => "entity_selected",
            Self::RetrySelection => "retry_selection",
            Self::DismissSelectionError => "dismiss_selection_error",
            Self::IndexFetched(_) => "index_fetched",
            Self::DetailFetched { .. } => "detail_fetched",
            Self::LineageFetched { .. } => "lineage_fetched",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RetryIndexLoad
                | Self::QueryChanged { .. }
                | Self::EntitySelected { .. }
                | Self::RetrySelection
                | Self::DismissSelectionError
        )
    }
}
