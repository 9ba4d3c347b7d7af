//! Capabilities the core uses to ask the shell for side effects.
//!
//! Both are Crux's own: `Render` for view updates and `crux_http::Http` for
//! PokeAPI requests. The `Effect` enum and the `WithContext` wiring are
//! written out by hand; `crux_macros` 0.3's derive targets an older
//! `WithContext` signature.

pub use crux_core::render::{Render, RenderOperation};
pub use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
pub use crux_http::Http;

use crux_core::bridge::ResolveSerialized;
use crux_core::capability::ProtoContext;
use crux_core::Request;
use serde::Serialize;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppRender = Render<Event>;

/// What an HTTP request resolves to by the time it reaches `update`.
pub type FetchResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

pub struct Capabilities {
    pub http: AppHttp,
    pub render: AppRender,
}

#[derive(Debug)]
pub enum Effect {
    Http(Request<HttpRequest>),
    Render(Request<RenderOperation>),
}

/// The serializable half of [`Effect`], sent across the FFI boundary.
#[derive(Debug, Serialize)]
pub enum EffectFfi {
    Http(HttpRequest),
    Render(RenderOperation),
}

impl crux_core::Effect for Effect {
    type Ffi = EffectFfi;

    fn serialize(self) -> (Self::Ffi, ResolveSerialized) {
        match self {
            Effect::Http(request) => request.serialize(EffectFfi::Http),
            Effect::Render(request) => request.serialize(EffectFfi::Render),
        }
    }
}

impl crux_core::WithContext<App, Effect> for Capabilities {
    fn new_with_context(context: ProtoContext<Effect, Event>) -> Capabilities {
        Capabilities {
            http: Http::new(context.specialize(Effect::Http)),
            render: Render::new(context.specialize(Effect::Render)),
        }
    }
}

impl Effect {
    pub fn is_http(&self) -> bool {
        matches!(self, Effect::Http(_))
    }

    pub fn is_render(&self) -> bool {
        matches!(self, Effect::Render(_))
    }

    pub fn into_http(self) -> Option<Request<HttpRequest>> {
        match self {
            Effect::Http(request) => Some(request),
            Effect::Render(_) => None,
        }
    }
}
