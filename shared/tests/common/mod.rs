#![allow(dead_code)]

use std::collections::VecDeque;

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use shared::{App, Effect, Event, Model, ViewModel};

pub const BASE: &str = "https://pokeapi.co/api/v2";

pub fn ok_json(body: &str) -> HttpResult {
    HttpResult::Ok(HttpResponse::ok().body(body).build())
}

pub fn status(code: u16) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(code).build())
}

pub fn index_body(names: &[&str]) -> String {
    let results: Vec<String> = names
        .iter()
        .map(|n| format!(r#"{{"name":"{n}","url":"{BASE}/pokemon/{n}/"}}"#))
        .collect();
    format!(
        r#"{{"count":{},"next":null,"previous":null,"results":[{}]}}"#,
        names.len(),
        results.join(",")
    )
}

pub fn detail_body(id: u32, name: &str, types: &[&str], moves: &[&str]) -> String {
    let types: Vec<String> = types
        .iter()
        .enumerate()
        .map(|(i, t)| format!(r#"{{"slot":{},"type":{{"name":"{t}","url":""}}}}"#, i + 1))
        .collect();
    let moves: Vec<String> = moves
        .iter()
        .map(|m| format!(r#"{{"move":{{"name":"{m}","url":""}}}}"#))
        .collect();
    format!(
        r#"{{"id":{id},"name":"{name}","types":[{}],"moves":[{}]}}"#,
        types.join(","),
        moves.join(",")
    )
}

/// A straight chain, first species at the root.
pub fn chain_body(species: &[&str]) -> String {
    let mut link = String::new();
    for name in species.iter().rev() {
        let children = if link.is_empty() {
            String::new()
        } else {
            link.clone()
        };
        link = format!(r#"{{"species":{{"name":"{name}","url":""}},"evolves_to":[{children}]}}"#);
    }
    format!(r#"{{"id":1,"chain":{link}}}"#)
}

/// The app under test plus its model. Events raised by resolved requests
/// are fed straight back through `update`.
pub struct Harness {
    pub app: AppTester<App, Effect>,
    pub model: Model,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
        }
    }

    /// Applies `event` and everything it triggers, returning the requests
    /// issued along the way.
    pub fn send(&mut self, event: Event) -> Vec<Request<HttpRequest>> {
        let mut queue = VecDeque::from([event]);
        let mut requests = Vec::new();

        while let Some(event) = queue.pop_front() {
            let update = self.app.update(event, &mut self.model);
            queue.extend(update.events);
            requests.extend(update.effects.into_iter().filter_map(Effect::into_http));
        }
        requests
    }

    pub fn resolve(
        &mut self,
        mut request: Request<HttpRequest>,
        result: HttpResult,
    ) -> Vec<Request<HttpRequest>> {
        let update = self
            .app
            .resolve(&mut request, result)
            .expect("request resolves once");

        let mut requests: Vec<_> = update
            .effects
            .into_iter()
            .filter_map(Effect::into_http)
            .collect();
        for event in update.events {
            requests.extend(self.send(event));
        }
        requests
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }
}

pub fn single_http(mut requests: Vec<Request<HttpRequest>>) -> Request<HttpRequest> {
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

/// A harness whose index has loaded with `names`.
pub fn ready_harness(names: &[&str]) -> Harness {
    let mut harness = Harness::new();
    let request = single_http(harness.send(Event::AppStarted));
    harness.resolve(request, ok_json(&index_body(names)));
    assert!(harness.model.is_ready());
    harness
}

pub fn select(harness: &mut Harness, name: &str) -> Request<HttpRequest> {
    single_http(harness.send(Event::EntitySelected { name: name.into() }))
}
