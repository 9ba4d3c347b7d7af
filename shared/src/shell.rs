//! A tokio shell that performs the core's HTTP effects with `reqwest`.
//!
//! Requests run concurrently; their results are applied to the core one at a
//! time, in completion order. Every render publishes a fresh [`ViewModel`] on
//! a `watch` channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use crux_core::{Core, Request};
use crux_http::protocol::{HttpHeader, HttpRequest, HttpResponse, HttpResult};
use tokio::sync::watch;
use tokio::task::{self, JoinSet};

use crate::app::App;
use crate::capabilities::Effect;
use crate::config::{ConfigError, CoreConfig};
use crate::event::Event;
use crate::view::ViewModel;

pub const MAX_RESPONSE_BODY_SIZE: usize = 16 * 1024 * 1024;

#[async_trait]
pub trait HttpExecutor: Send + Sync + 'static {
    async fn execute(&self, request: HttpRequest) -> HttpResult;
}

#[derive(Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    /// The client enforces `request_timeout_ms` on every request.
    pub fn new(config: &CoreConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("pokedex-shared/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, crux_http::Error> {
        let started = Instant::now();
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| crux_http::Error::Io(format!("invalid method '{method}': {e}")))?;
        let mut builder = self.client.request(method, url.as_str());
        for header in &headers {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let mut response = builder.send().await.map_err(map_error)?;

        if let Some(length) = response.content_length() {
            let size = usize::try_from(length).unwrap_or(usize::MAX);
            if size > MAX_RESPONSE_BODY_SIZE {
                return Err(too_large(size));
            }
        }

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| HttpHeader {
                    name: name.as_str().to_string(),
                    value: v.to_string(),
                })
            })
            .collect();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_error)? {
            if body.len() + chunk.len() > MAX_RESPONSE_BODY_SIZE {
                return Err(too_large(body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(%url, status, bytes = body.len(), duration_ms, "http request completed");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(error: reqwest::Error) -> crux_http::Error {
    if error.is_timeout() {
        crux_http::Error::Timeout
    } else if error.is_builder() {
        crux_http::Error::Url(error.to_string())
    } else {
        crux_http::Error::Io(error.to_string())
    }
}

fn too_large(size: usize) -> crux_http::Error {
    crux_http::Error::Io(format!(
        "response of {size} bytes exceeds the {MAX_RESPONSE_BODY_SIZE} byte limit"
    ))
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> HttpResult {
        match self.send(request).await {
            Ok(response) => HttpResult::Ok(response),
            Err(e) => HttpResult::Err(e),
        }
    }
}

pub struct Shell<X: HttpExecutor> {
    core: Core<Effect, App>,
    executor: Arc<X>,
    in_flight: JoinSet<HttpResult>,
    /// Kept outside the tasks so a task that dies still gets its request
    /// resolved.
    requests: HashMap<task::Id, Request<HttpRequest>>,
    view_tx: watch::Sender<ViewModel>,
}

impl<X: HttpExecutor> Shell<X> {
    pub fn new(config: CoreConfig, executor: X) -> Result<Self, ConfigError> {
        config.validate()?;

        let core = Core::<Effect, App>::new::<crate::Capabilities>();
        let (view_tx, _) = watch::channel(core.view());
        let mut shell = Self {
            core,
            executor: Arc::new(executor),
            in_flight: JoinSet::new(),
            requests: HashMap::new(),
            view_tx,
        };
        shell.dispatch(Event::Configure { config });
        Ok(shell)
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.view_tx.subscribe()
    }

    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, event: Event) {
        let effects = self.core.process_event(event);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(_) => {
                    self.view_tx.send_replace(self.core.view());
                }
                Effect::Http(request) => {
                    let operation = request.operation.clone();
                    let executor = Arc::clone(&self.executor);
                    let handle = self
                        .in_flight
                        .spawn(async move { executor.execute(operation).await });
                    self.requests.insert(handle.id(), request);
                }
            }
        }
    }

    /// Applies responses until nothing is outstanding, including requests
    /// issued while handling earlier responses.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.in_flight.join_next_with_id().await {
            let (id, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(error = %e, "http task failed");
                    let failure = crux_http::Error::Io(format!("request task failed: {e}"));
                    (e.id(), HttpResult::Err(failure))
                }
            };

            let Some(mut request) = self.requests.remove(&id) else {
                tracing::warn!(%id, "result for an unknown request");
                continue;
            };
            let effects = self.core.resolve(&mut request, result);
            self.run_effects(effects);
        }
    }

    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    pub fn view(&self) -> ViewModel {
        self.core.view()
    }
}
