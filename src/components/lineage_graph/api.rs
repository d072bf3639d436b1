use js_sys::{JSON, Reflect};
use log::{info, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::config::GraphConfig;
use super::error::{GraphError, GraphResult};
use super::model::load_graph;
use super::types::{Graph, NodeId};

pub const LINEAGE_DATA_URL: &str = "/clergy/lineage-data";

/// Body of `GET /clergy/lineage-data`. Arrays are checked by `load_graph`.
#[derive(Debug, Deserialize)]
struct LineageSnapshot {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	nodes: Value,
	#[serde(default)]
	links: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RelatedClergy {
	pub id: NodeId,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub rank: Option<String>,
	#[serde(default)]
	pub date: Option<String>,
}

/// Body of `GET /clergy/relationships/:id`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Relationships {
	#[serde(default)]
	pub success: bool,
	#[serde(default)]
	pub ordaining_bishop: Option<RelatedClergy>,
	#[serde(default)]
	pub consecrator: Option<RelatedClergy>,
	#[serde(default)]
	pub ordained_clergy: Vec<RelatedClergy>,
	#[serde(default)]
	pub consecrated_clergy: Vec<RelatedClergy>,
}

pub fn relationships_url(id: NodeId) -> String {
	format!("/clergy/relationships/{id}")
}

fn js_error(url: &str, err: &JsValue) -> GraphError {
	GraphError::Network {
		url: url.to_string(),
		message: err.as_string().unwrap_or_else(|| format!("{err:?}")),
	}
}

fn js_to_json(value: &JsValue) -> Option<Value> {
	if value.is_undefined() {
		return None;
	}
	let text = JSON::stringify(value).ok()?.as_string()?;
	serde_json::from_str(&text).ok()
}

async fn fetch_json<T: DeserializeOwned>(url: &str) -> GraphResult<T> {
	let window = web_sys::window().ok_or_else(|| GraphError::Network {
		url: url.to_string(),
		message: "no window".to_string(),
	})?;
	let resp = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(|e| js_error(url, &e))?;
	let resp: Response = resp.dyn_into().map_err(|e| js_error(url, &e))?;
	if !resp.ok() {
		return Err(GraphError::HttpStatus {
			url: url.to_string(),
			status: resp.status(),
		});
	}
	let body = JsFuture::from(resp.json().map_err(|e| js_error(url, &e))?)
		.await
		.map_err(|e| js_error(url, &e))?;
	let value = js_to_json(&body).ok_or_else(|| GraphError::MalformedPayload {
		field: "response",
		reason: format!("{url} did not return JSON"),
	})?;
	serde_json::from_value(value).map_err(|e| GraphError::MalformedPayload {
		field: "response",
		reason: e.to_string(),
	})
}

/// Fetch a fresh snapshot of the whole lineage graph.
pub async fn fetch_lineage_data(spacing: f64) -> GraphResult<Graph> {
	let snapshot: LineageSnapshot = fetch_json(LINEAGE_DATA_URL).await?;
	if !snapshot.success {
		return Err(GraphError::Api {
			url: LINEAGE_DATA_URL.to_string(),
		});
	}
	let graph = load_graph(&snapshot.nodes, &snapshot.links, spacing)?;
	info!("fetched lineage snapshot with {} nodes", graph.nodes.len());
	Ok(graph)
}

pub async fn fetch_relationships(id: NodeId) -> GraphResult<Relationships> {
	let url = relationships_url(id);
	let rel: Relationships = fetch_json(&url).await?;
	if !rel.success {
		return Err(GraphError::Api { url });
	}
	Ok(rel)
}

fn window_value(name: &'static str) -> Option<Value> {
	let window = web_sys::window()?;
	let value = Reflect::get(&window, &JsValue::from_str(name)).ok()?;
	js_to_json(&value)
}

/// Build the graph from the server-rendered `window.nodesData` / `window.linksData`.
pub fn read_injected_data(spacing: f64) -> GraphResult<Graph> {
	let nodes =
		window_value("nodesData").ok_or(GraphError::MissingInjectedData { name: "nodesData" })?;
	let links =
		window_value("linksData").ok_or(GraphError::MissingInjectedData { name: "linksData" })?;
	load_graph(&nodes, &links, spacing)
}

/// Read `window.lineageGraphConfig`, defaulting when absent.
pub fn read_injected_config() -> GraphConfig {
	match window_value("lineageGraphConfig") {
		Some(value) => GraphConfig::from_json(&value.to_string()),
		None => {
			warn!("no lineageGraphConfig on window, using defaults");
			GraphConfig::default()
		}
	}
}
