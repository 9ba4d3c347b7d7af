//! PokeAPI gateway: endpoint URLs, wire formats and response classification.
//!
//! The gateway never performs I/O. It builds the URLs the app requests
//! through the HTTP capability and turns whatever the shell sends back into
//! domain records or a [`GatewayError`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::capabilities::FetchResult;
use crate::config::CoreConfig;
use crate::lineage::{try_flatten, LineageError, LineageNode};
use crate::model::{CategoryRef, DetailRecord, IndexEntry, MoveRef};
use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("request for {resource} timed out")]
    Timeout { resource: String },

    #[error("transport failure for {resource}: {reason}")]
    Transport { resource: String, reason: String },

    #[error("invalid request for {resource}: {reason}")]
    InvalidRequest { resource: String, reason: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("unexpected HTTP status {status} for {resource}")]
    Status {
        status: u16,
        resource: String,
        retry_after_ms: Option<u64>,
    },

    #[error("malformed {resource} response: {reason}")]
    Malformed { resource: String, reason: String },
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    fn from_http(error: crux_http::Error, resource: &str) -> Self {
        let resource = resource.to_string();
        match error {
            crux_http::Error::Http(e) if e.code.is_success() => GatewayError::Malformed {
                resource,
                reason: e.message,
            },
            crux_http::Error::Http(e) => match u16::from(e.code) {
                404 => GatewayError::NotFound { resource },
                status => GatewayError::Status {
                    status,
                    resource,
                    retry_after_ms: None,
                },
            },
            crux_http::Error::Json(reason) => GatewayError::Malformed { resource, reason },
            crux_http::Error::Url(reason) => GatewayError::InvalidRequest { resource, reason },
            crux_http::Error::Io(reason) => GatewayError::Transport { resource, reason },
            crux_http::Error::Timeout => GatewayError::Timeout { resource },
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        let internal = e.to_string();
        match e {
            GatewayError::Timeout { resource } => {
                AppError::new(ErrorKind::Timeout, "Request timed out")
                    .with_internal(internal)
                    .with_context("resource", resource)
            }
            GatewayError::Transport { resource, .. } => {
                AppError::new(ErrorKind::Network, "Network error")
                    .with_internal(internal)
                    .with_context("resource", resource)
            }
            GatewayError::InvalidRequest { resource, .. } => {
                AppError::new(ErrorKind::Configuration, "Invalid gateway request")
                    .with_internal(internal)
                    .with_context("resource", resource)
            }
            GatewayError::NotFound { resource } => {
                AppError::new(ErrorKind::NotFound, format!("{resource} not found"))
                    .with_context("resource", resource)
            }
            GatewayError::Status {
                status,
                resource,
                retry_after_ms,
            } => AppError::from_http_status(status, retry_after_ms)
                .with_internal(internal)
                .with_context("resource", resource),
            GatewayError::Malformed { resource, .. } => {
                AppError::new(ErrorKind::Deserialization, "Malformed response")
                    .with_internal(internal)
                    .with_context("resource", resource)
            }
        }
    }
}

impl From<LineageError> for GatewayError {
    fn from(e: LineageError) -> Self {
        GatewayError::Malformed {
            resource: "evolution-chain".into(),
            reason: e.to_string(),
        }
    }
}

// --- Wire formats ---

#[derive(Deserialize, Debug)]
struct NamedResource {
    name: String,
}

#[derive(Deserialize, Debug)]
struct IndexPage {
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    next: Option<String>,
    results: Vec<NamedResource>,
}

#[derive(Deserialize, Debug)]
struct TypeSlot {
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Deserialize, Debug)]
struct MoveSlot {
    #[serde(rename = "move")]
    entry: NamedResource,
}

#[derive(Deserialize, Debug)]
struct PokemonDetail {
    id: u32,
    name: String,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    moves: Vec<MoveSlot>,
}

#[derive(Deserialize, Debug)]
struct ChainLink {
    species: NamedResource,
    #[serde(default)]
    evolves_to: Vec<ChainLink>,
}

#[derive(Deserialize, Debug)]
struct EvolutionChain {
    chain: ChainLink,
}

impl From<ChainLink> for LineageNode {
    fn from(link: ChainLink) -> Self {
        LineageNode::with_children(
            link.species.name,
            link.evolves_to.into_iter().map(LineageNode::from).collect(),
        )
    }
}

impl From<PokemonDetail> for DetailRecord {
    fn from(wire: PokemonDetail) -> Self {
        DetailRecord {
            id: wire.id,
            name: wire.name,
            types: wire
                .types
                .into_iter()
                .map(|slot| CategoryRef {
                    name: slot.kind.name,
                })
                .collect(),
            moves: wire
                .moves
                .into_iter()
                .map(|slot| MoveRef {
                    name: slot.entry.name,
                })
                .collect(),
        }
    }
}

// --- Gateway ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    base_url: String,
    index_limit: u32,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, index_limit: u32) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index_limit,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(&config.api_base_url, config.index_limit)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `listAll`: the first `index_limit` entries of the index.
    pub fn index_url(&self) -> Result<String, GatewayError> {
        let limit = self.index_limit.to_string();
        self.endpoint(
            "pokemon index",
            &["pokemon"],
            &[("limit", limit.as_str()), ("offset", "0")],
        )
    }

    /// `getDetailByName`
    pub fn detail_url(&self, name: &str) -> Result<String, GatewayError> {
        self.endpoint(&format!("pokemon '{name}'"), &["pokemon", name], &[])
    }

    /// `getLineageById`
    pub fn lineage_url(&self, id: u32) -> Result<String, GatewayError> {
        self.endpoint(
            &format!("evolution-chain {id}"),
            &["evolution-chain", &id.to_string()],
            &[],
        )
    }

    /// Only absolute http(s) URLs come out of here; the HTTP capability
    /// cannot take anything else.
    fn endpoint(
        &self,
        resource: &str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<String, GatewayError> {
        let invalid = |reason: String| GatewayError::InvalidRequest {
            resource: resource.to_string(),
            reason,
        };

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("bad base URL '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }

        url.path_segments_mut()
            .map_err(|()| invalid(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url.to_string())
    }
}

fn retry_after_ms(response: &crux_http::Response<Vec<u8>>) -> Option<u64> {
    let seconds: u64 = response.header("retry-after")?.last().as_str().parse().ok()?;
    Some(seconds.saturating_mul(1000))
}

fn decode<T: DeserializeOwned>(result: FetchResult, resource: &str) -> Result<T, GatewayError> {
    let response = result.map_err(|e| GatewayError::from_http(e, resource))?;
    let status = response.status();

    if status.is_success() {
        let body = response.body().map(Vec::as_slice).unwrap_or_default();
        return serde_json::from_slice(body).map_err(|e| GatewayError::Malformed {
            resource: resource.to_string(),
            reason: e.to_string(),
        });
    }

    match u16::from(status) {
        404 => Err(GatewayError::NotFound {
            resource: resource.to_string(),
        }),
        code => Err(GatewayError::Status {
            status: code,
            resource: resource.to_string(),
            retry_after_ms: retry_after_ms(&response),
        }),
    }
}

pub fn decode_index(result: FetchResult) -> Result<Vec<IndexEntry>, GatewayError> {
    let page: IndexPage = decode(result, "pokemon index")?;

    tracing::debug!(
        returned = page.results.len(),
        total = ?page.count,
        has_more = page.next.is_some(),
        "decoded index page"
    );

    Ok(page
        .results
        .into_iter()
        .map(|r| IndexEntry::new(r.name))
        .collect())
}

pub fn decode_detail(result: FetchResult, name: &str) -> Result<DetailRecord, GatewayError> {
    let wire: PokemonDetail = decode(result, &format!("pokemon '{name}'"))?;
    Ok(wire.into())
}

pub fn decode_lineage(result: FetchResult, id: u32) -> Result<LineageNode, GatewayError> {
    let wire: EvolutionChain = decode(result, &format!("evolution-chain {id}"))?;
    let lineage = LineageNode::from(wire.chain);
    try_flatten(&lineage)?;
    Ok(lineage)
}
