use crux_http::RequestBuilder;

use crate::capabilities::Capabilities;
use crate::event::Event;
use crate::gateway::{self, Gateway, GatewayError};
use crate::lineage::flatten;
use crate::model::{DetailRecord, LoadPhase, Model, SelectedDetail};
use crate::view::{
    DetailView, ResultItem, SelectionErrorView, UserFacingError, ViewModel, ViewState,
};
use crate::AppError;

const RETRY_INDEX_EVENT: &str = "retry_index_load";
const RETRY_SELECTION_EVENT: &str = "retry_selection";

#[derive(Default)]
pub struct App;

impl App {
    fn get(url: &str, caps: &Capabilities) -> RequestBuilder<Event> {
        caps.http.get(url).header("Accept", "application/json")
    }

    /// Moves to `Loading` with the index request issued, or straight to
    /// `LoadFailed` when no request can be built.
    fn request_index(model: &mut Model, caps: &Capabilities) {
        match Gateway::from_config(&model.config).index_url() {
            Ok(url) => {
                tracing::debug!(%url, "requesting index");
                model.phase = LoadPhase::Loading;
                Self::get(&url, caps).send(|result| Event::IndexFetched(Box::new(result)));
            }
            Err(e) => {
                let error = AppError::from(e);
                tracing::error!(code = error.code(), error = %error, "cannot request index");
                model.phase = LoadPhase::LoadFailed(error);
            }
        }
    }

    fn request_detail(model: &mut Model, seq: u64, name: String, caps: &Capabilities) {
        match Gateway::from_config(&model.config).detail_url(&name) {
            Ok(url) => {
                tracing::debug!(seq, %name, "requesting detail");
                Self::get(&url, caps).send(move |result| Event::DetailFetched {
                    seq,
                    name,
                    result: Box::new(result),
                });
            }
            Err(e) => Self::fail_selection(model, &name, e),
        }
    }

    fn request_lineage(model: &mut Model, seq: u64, detail: DetailRecord, caps: &Capabilities) {
        match Gateway::from_config(&model.config).lineage_url(detail.id) {
            Ok(url) => {
                tracing::debug!(seq, id = detail.id, "requesting lineage");
                Self::get(&url, caps).send(move |result| Event::LineageFetched {
                    seq,
                    detail: Box::new(detail),
                    result: Box::new(result),
                });
            }
            Err(e) => Self::fail_selection(model, &detail.name, e),
        }
    }

    /// Records a failed selection under the name the user picked.
    fn fail_selection(model: &mut Model, fallback_name: &str, error: GatewayError) {
        let name = model
            .pending_selection
            .as_ref()
            .map_or(fallback_name, |pending| pending.name.as_str())
            .to_string();

        let error = AppError::from(error).with_context("name", name.clone());
        tracing::warn!(%name, code = error.code(), error = %error, "selection failed");
        model.fail_selection(name, error);
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            tracing::debug!(event = event_name, "user action");
        } else {
            tracing::trace!(event = event_name, "event");
        }

        match event {
            Event::Noop => {}

            Event::Configure { config } => {
                if model.phase != LoadPhase::Idle {
                    tracing::warn!(phase = ?model.phase, "configuration ignored after start");
                    return;
                }
                if let Err(e) = config.validate() {
                    tracing::warn!(error = %e, "rejecting invalid configuration");
                    return;
                }

                tracing::info!(
                    base_url = %config.api_base_url,
                    index_limit = config.index_limit,
                    "configured"
                );
                model.config = config;
            }

            Event::AppStarted => {
                if model.phase != LoadPhase::Idle {
                    tracing::debug!(phase = ?model.phase, "app already started");
                    return;
                }

                Self::request_index(model, caps);
                caps.render.render();
            }

            Event::RetryIndexLoad => {
                if !matches!(model.phase, LoadPhase::LoadFailed(_)) {
                    tracing::debug!(phase = ?model.phase, "index retry ignored");
                    return;
                }

                Self::request_index(model, caps);
                caps.render.render();
            }

            Event::IndexFetched(result) => {
                if model.phase != LoadPhase::Loading {
                    tracing::debug!(phase = ?model.phase, "discarding unexpected index response");
                    return;
                }

                match gateway::decode_index(*result) {
                    Ok(entries) => {
                        tracing::info!(count = entries.len(), "index loaded");
                        model.index_loaded(entries);
                    }
                    Err(e) => {
                        let error = AppError::from(e);
                        tracing::warn!(code = error.code(), error = %error, "index load failed");
                        model.phase = LoadPhase::LoadFailed(error);
                    }
                }

                caps.render.render();
            }

            Event::QueryChanged { value } => {
                model.set_query(value);
                caps.render.render();
            }

            Event::EntitySelected { name } => {
                if name.trim().is_empty() {
                    tracing::warn!("ignoring selection without a name");
                    return;
                }
                if !model.is_ready() {
                    tracing::warn!(%name, "selection before the index loaded");
                    return;
                }

                let seq = model.begin_selection(name.clone());
                Self::request_detail(model, seq, name, caps);
                caps.render.render();
            }

            Event::RetrySelection => {
                let Some(failure) = model.selection_error.clone() else {
                    tracing::debug!("no failed selection to retry");
                    return;
                };

                if !failure.error.is_retryable() {
                    tracing::debug!(name = %failure.name, code = failure.error.code(), "selection not retryable");
                    return;
                }

                let seq = model.begin_selection(failure.name.clone());
                Self::request_detail(model, seq, failure.name, caps);
                caps.render.render();
            }

            Event::DismissSelectionError => {
                model.selection_error = None;
                caps.render.render();
            }

            Event::DetailFetched { seq, name, result } => {
                if !model.is_current_selection(seq) {
                    tracing::debug!(seq, %name, "discarding stale detail response");
                    return;
                }

                match gateway::decode_detail(*result, &name) {
                    Ok(detail) => {
                        Self::request_lineage(model, seq, detail, caps);
                        // no longer current if the lineage request couldn't be built
                        if !model.is_current_selection(seq) {
                            caps.render.render();
                        }
                    }
                    Err(e) => {
                        Self::fail_selection(model, &name, e);
                        caps.render.render();
                    }
                }
            }

            Event::LineageFetched {
                seq,
                detail,
                result,
            } => {
                if !model.is_current_selection(seq) {
                    tracing::debug!(seq, name = %detail.name, "discarding stale lineage response");
                    return;
                }

                match gateway::decode_lineage(*result, detail.id) {
                    Ok(lineage) => {
                        tracing::info!(name = %detail.name, id = detail.id, "selection loaded");
                        model.complete_selection(SelectedDetail {
                            detail: *detail,
                            lineage,
                        });
                    }
                    Err(e) => Self::fail_selection(model, &detail.name, e),
                }

                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let state = match &model.phase {
            LoadPhase::Idle => ViewState::Loading { message: None },

            LoadPhase::Loading => ViewState::Loading {
                message: Some("Loading the Pokedex...".into()),
            },

            LoadPhase::LoadFailed(error) => ViewState::Error {
                title: "Couldn't load the Pokedex".into(),
                message: error.user_facing_message(),
                is_retryable: true,
                retry_event: Some(RETRY_INDEX_EVENT.into()),
            },

            LoadPhase::Ready => {
                let selected = model
                    .selected_detail
                    .as_ref()
                    .map(|s| s.detail.name.as_str());
                let loading = model.pending_selection.as_ref().map(|p| p.name.as_str());

                let results = model
                    .search
                    .visible_index()
                    .iter()
                    .map(|entry| ResultItem {
                        name: entry.name.clone(),
                        is_selected: selected == Some(entry.name.as_str()),
                        is_loading: loading == Some(entry.name.as_str()),
                    })
                    .collect();

                let selection_error = model.selection_error.as_ref().map(|failure| {
                    let not_found = failure.error.is_not_found();
                    SelectionErrorView {
                        name: failure.name.clone(),
                        not_found,
                        error: UserFacingError::from(&failure.error),
                        retry_event: (!not_found && failure.error.is_retryable())
                            .then(|| RETRY_SELECTION_EVENT.to_string()),
                    }
                });

                ViewState::Ready {
                    query: model.search.query().to_string(),
                    results,
                    show_no_results: model.search.has_no_results(),
                    loading_name: loading.map(str::to_string),
                    detail: model
                        .selected_detail
                        .as_ref()
                        .map(|s| build_detail_view(s, model.config.moves_display_limit)),
                    selection_error,
                }
            }
        };

        ViewModel {
            state,
            index_size: model.search.full_index().len(),
        }
    }
}

fn build_detail_view(selected: &SelectedDetail, moves_limit: usize) -> DetailView {
    let detail = &selected.detail;
    DetailView {
        id: detail.id,
        name: detail.name.clone(),
        types: detail.types.iter().map(|t| t.name.clone()).collect(),
        moves: detail
            .moves
            .iter()
            .take(moves_limit)
            .map(|m| m.name.clone())
            .collect(),
        total_moves: detail.moves.len(),
        evolutions: flatten(&selected.lineage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Effect;
    use crate::config::CoreConfig;
    use crate::lineage::LineageNode;
    use crate::model::{CategoryRef, IndexEntry, MoveRef};
    use crate::ErrorKind;
    use crux_core::testing::{AppTester, Update};
    use crux_core::App as CruxApp;
    use crux_http::testing::ResponseBuilder;

    fn http_urls(update: Update<Effect, Event>) -> Vec<String> {
        update
            .into_effects()
            .filter_map(Effect::into_http)
            .map(|request| request.operation.url)
            .collect()
    }

    fn ready_model(names: &[&str]) -> Model {
        let mut model = Model::new();
        model.index_loaded(names.iter().map(|n| IndexEntry::new(*n)).collect());
        model
    }

    mod update_tests {
        use super::*;

        #[test]
        fn test_app_started_requests_index_once() {
            let app = AppTester::<App, Effect>::default();
            let mut model = Model::new();

            let update = app.update(Event::AppStarted, &mut model);
            assert_eq!(model.phase, LoadPhase::Loading);
            assert!(update.effects.iter().any(Effect::is_render));
            assert_eq!(
                http_urls(update),
                vec!["https://pokeapi.co/api/v2/pokemon?limit=151&offset=0".to_string()]
            );

            let update = app.update(Event::AppStarted, &mut model);
            assert!(update.effects.is_empty());
        }

        #[test]
        fn test_configure_before_start_changes_endpoints() {
            let app = AppTester::<App, Effect>::default();
            let mut model = Model::new();
            let config = CoreConfig {
                api_base_url: "https://pokeapi.example.org/api/v2".into(),
                index_limit: 20,
                ..CoreConfig::default()
            };

            app.update(Event::Configure { config }, &mut model);
            let update = app.update(Event::AppStarted, &mut model);

            assert_eq!(
                http_urls(update),
                vec!["https://pokeapi.example.org/api/v2/pokemon?limit=20&offset=0".to_string()]
            );
        }

        #[test]
        fn test_configure_rejected_when_invalid_or_late() {
            let app = AppTester::<App, Effect>::default();
            let mut model = Model::new();

            let invalid = CoreConfig {
                index_limit: 0,
                ..CoreConfig::default()
            };
            app.update(Event::Configure { config: invalid }, &mut model);
            assert_eq!(model.config, CoreConfig::default());

            app.update(Event::AppStarted, &mut model);
            let late = CoreConfig {
                moves_display_limit: 9,
                ..CoreConfig::default()
            };
            app.update(Event::Configure { config: late }, &mut model);
            assert_eq!(model.config.moves_display_limit, 4);
        }

        #[test]
        fn test_unusable_base_url_fails_without_request() {
            let app = AppTester::<App, Effect>::default();
            let mut model = Model::new();
            model.config.api_base_url = "not a url".into();

            let update = app.update(Event::AppStarted, &mut model);

            assert!(update.effects.iter().all(Effect::is_render));
            let LoadPhase::LoadFailed(error) = &model.phase else {
                panic!("expected load failure");
            };
            assert_eq!(error.kind, ErrorKind::Configuration);
        }

        #[test]
        fn test_retry_index_only_after_failure() {
            let app = AppTester::<App, Effect>::default();
            let mut model = ready_model(&["mew"]);

            let update = app.update(Event::RetryIndexLoad, &mut model);
            assert!(update.effects.is_empty());
            assert!(model.is_ready());
        }

        #[test]
        fn test_selection_before_ready_is_ignored() {
            let app = AppTester::<App, Effect>::default();
            let mut model = Model::new();

            let update = app.update(
                Event::EntitySelected {
                    name: "pikachu".into(),
                },
                &mut model,
            );

            assert!(update.effects.is_empty());
            assert!(model.pending_selection.is_none());
        }

        #[test]
        fn test_blank_selection_is_ignored() {
            let app = AppTester::<App, Effect>::default();
            let mut model = ready_model(&["pikachu"]);

            for name in ["", "   "] {
                let update = app.update(Event::EntitySelected { name: name.into() }, &mut model);
                assert!(update.effects.is_empty(), "{name:?} issued effects");
            }
            assert!(model.pending_selection.is_none());
            assert_eq!(model.selection_seq, 0);
        }

        #[test]
        fn test_detail_success_requests_lineage_by_id() {
            let app = AppTester::<App, Effect>::default();
            let mut model = ready_model(&["pikachu"]);
            let seq = model.begin_selection("pikachu");

            let body = r#"{"id":25,"name":"pikachu","types":[],"moves":[]}"#;
            let response = ResponseBuilder::ok().body(body.as_bytes().to_vec()).build();
            let update = app.update(
                Event::DetailFetched {
                    seq,
                    name: "pikachu".into(),
                    result: Box::new(Ok(response)),
                },
                &mut model,
            );

            assert_eq!(
                http_urls(update),
                vec!["https://pokeapi.co/api/v2/evolution-chain/25".to_string()]
            );
            assert!(model.is_current_selection(seq));
        }

        #[test]
        fn test_non_retryable_selection_error_is_not_retried() {
            let app = AppTester::<App, Effect>::default();
            let mut model = ready_model(&["pikachu"]);
            model.fail_selection("missingno", AppError::new(ErrorKind::NotFound, "gone"));

            let update = app.update(Event::RetrySelection, &mut model);
            assert!(update.effects.is_empty());

            app.update(Event::DismissSelectionError, &mut model);
            assert!(model.selection_error.is_none());
        }
    }

    mod view_tests {
        use super::*;

        #[test]
        fn test_load_failure_view_offers_retry() {
            let mut model = Model::new();
            model.phase = LoadPhase::LoadFailed(AppError::new(ErrorKind::Network, "down"));

            match App.view(&model).state {
                ViewState::Error {
                    is_retryable,
                    retry_event,
                    ..
                } => {
                    assert!(is_retryable);
                    assert_eq!(retry_event.as_deref(), Some("retry_index_load"));
                }
                other => panic!("expected error view, got {other:?}"),
            }
        }

        #[test]
        fn test_detail_view_caps_moves_and_flattens_lineage() {
            let mut model = ready_model(&["bulbasaur"]);
            model.complete_selection(SelectedDetail {
                detail: DetailRecord {
                    id: 1,
                    name: "bulbasaur".into(),
                    types: vec![
                        CategoryRef {
                            name: "grass".into(),
                        },
                        CategoryRef {
                            name: "poison".into(),
                        },
                    ],
                    moves: ["razor-wind", "swords-dance", "cut", "bind", "vine-whip"]
                        .iter()
                        .map(|m| MoveRef { name: (*m).into() })
                        .collect(),
                },
                lineage: LineageNode::with_children(
                    "bulbasaur",
                    vec![LineageNode::with_children(
                        "ivysaur",
                        vec![LineageNode::leaf("venusaur")],
                    )],
                ),
            });

            let view = App.view(&model);
            let detail = view.detail().unwrap();
            assert_eq!(detail.types, vec!["grass", "poison"]);
            assert_eq!(detail.moves.len(), 4);
            assert_eq!(detail.total_moves, 5);
            assert_eq!(detail.evolutions, vec!["bulbasaur", "ivysaur", "venusaur"]);

            model.config.moves_display_limit = 2;
            assert_eq!(
                App.view(&model).detail().unwrap().moves,
                vec!["razor-wind", "swords-dance"]
            );

            let ViewState::Ready { results, .. } = view.state else {
                panic!("expected ready view");
            };
            assert!(results[0].is_selected);
        }

        #[test]
        fn test_not_found_selection_has_no_retry() {
            let mut model = ready_model(&["pikachu"]);
            model.fail_selection(
                "missingno",
                AppError::new(ErrorKind::NotFound, "gone").with_context("name", "missingno"),
            );

            let ViewState::Ready {
                selection_error: Some(error),
                ..
            } = App.view(&model).state
            else {
                panic!("expected selection error");
            };
            assert!(error.not_found);
            assert!(error.retry_event.is_none());
            assert!(error.error.message.contains("missingno"));
        }
    }
}
