use log::warn;
use serde::{Deserialize, Serialize};

/// Tunables for the lineage view. Any field may be omitted from the injected JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	pub parallel_link_spacing: f64,
	/// Many-body strength. Negative repels.
	pub charge_strength: f32,
	pub collision_radius: f64,
	pub link_strength: f32,
	pub damping: f32,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub convergence_fallback_ms: u64,
	pub click_max_distance_px: f64,
	pub click_max_duration_ms: f64,
	pub click_dispatch_delay_ms: u64,
	pub hidden_ranks: Vec<String>,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			parallel_link_spacing: 8.0,
			charge_strength: -300.0,
			collision_radius: 12.0,
			link_strength: 0.05,
			damping: 0.9,
			alpha_min: 0.001,
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			convergence_fallback_ms: 10_000,
			click_max_distance_px: 5.0,
			click_max_duration_ms: 300.0,
			click_dispatch_delay_ms: 10,
			hidden_ranks: vec!["priest".to_string()],
		}
	}
}

impl GraphConfig {
	/// Parse an injected config object, keeping defaults when it is unusable.
	pub fn from_json(json: &str) -> Self {
		serde_json::from_str(json).unwrap_or_else(|e| {
			warn!("ignoring lineage graph config: {e}");
			Self::default()
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_keeps_defaults() {
		let cfg = GraphConfig::from_json(r#"{ "parallel_link_spacing": 12.0 }"#);
		assert_eq!(cfg.parallel_link_spacing, 12.0);
		assert_eq!(cfg.convergence_fallback_ms, 10_000);
		assert_eq!(cfg.hidden_ranks, vec!["priest".to_string()]);
	}

	#[test]
	fn default_charge_repels() {
		assert_eq!(GraphConfig::default().charge_strength, -300.0);
	}

	#[test]
	fn invalid_config_falls_back() {
		assert_eq!(GraphConfig::from_json("not json"), GraphConfig::default());
	}

	#[test]
	fn config_roundtrip() {
		let cfg = GraphConfig {
			click_max_distance_px: 3.0,
			..GraphConfig::default()
		};
		let encoded = serde_json::to_string(&cfg).expect("serialize config");
		let decoded = GraphConfig::from_json(&encoded);
		assert_eq!(decoded.click_max_distance_px, 3.0);
		assert_eq!(decoded.hidden_ranks, cfg.hidden_ranks);
		assert!((decoded.alpha_decay - cfg.alpha_decay).abs() < 1e-12);
	}
}
