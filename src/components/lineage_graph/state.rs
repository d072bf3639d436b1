use log::{debug, info};

use super::config::GraphConfig;
use super::filters::{FilterCriteria, FilterEngine};
use super::highlight::{HighlightRenderer, highlight_lineage_chain};
use super::interaction::{ClickThresholds, DragOutcome, DragSession, PanState, ViewTransform};
use super::layout::{
	ConvergenceWatch, ForceSettings, LayoutSimulation, SettleReason, TickFrame, TickOutcome, on_tick,
};
use super::lineage::LineageChain;
use super::types::{Graph, NodeId};

pub const HIT_RADIUS: f64 = 12.0;

/// The single owner of everything the lineage view shares between parts:
/// graph, simulation, zoom transform and filter state. All mutation goes
/// through `&mut self` on the UI thread.
pub struct GraphViewContext {
	pub config: GraphConfig,
	pub graph: Option<Graph>,
	pub simulation: Option<LayoutSimulation>,
	pub filters: FilterEngine,
	pub highlight: HighlightRenderer,
	pub transform: ViewTransform,
	pub convergence: ConvergenceWatch,
	pub frame: TickFrame,
	pub drag: Option<DragSession>,
	pub pan: PanState,
	pub hovered: Option<NodeId>,
	pub selected: Option<NodeId>,
	pub width: f64,
	pub height: f64,
}

impl GraphViewContext {
	pub fn new(config: GraphConfig, width: f64, height: f64) -> Self {
		Self {
			filters: FilterEngine::new(&config.hidden_ranks),
			config,
			graph: None,
			simulation: None,
			highlight: HighlightRenderer::default(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			convergence: ConvergenceWatch::default(),
			frame: TickFrame::default(),
			drag: None,
			pan: PanState::default(),
			hovered: None,
			selected: None,
			width,
			height,
		}
	}

	/// Replace the graph, keeping the current filter criteria.
	pub fn load(&mut self, graph: Graph) {
		info!(
			"loading lineage view: {} nodes, {} links",
			graph.nodes.len(),
			graph.links.len()
		);
		self.highlight = HighlightRenderer::new(&graph);
		self.simulation = Some(LayoutSimulation::new(
			&graph,
			ForceSettings::from_config(&self.config),
		));
		self.graph = Some(graph);
		self.drag = None;
		self.hovered = None;
		self.convergence.reset();
		self.recompute_filters();
		if let Some(id) = self.selected {
			self.select_node(id);
		}
	}

	/// Recompute filter flags and rebuild forces in the same turn.
	pub fn recompute_filters(&mut self) {
		let Some(graph) = self.graph.as_mut() else {
			return;
		};
		self.filters.recompute(graph);
		if let Some(sim) = self.simulation.as_mut() {
			sim.rebuild_forces(graph);
		}
		self.frame = on_tick(graph);
	}

	pub fn set_criteria(&mut self, criteria: FilterCriteria) {
		if self.filters.criteria == criteria {
			return;
		}
		self.filters.criteria = criteria;
		self.recompute_filters();
	}

	/// Step the layout. Returns true on the tick the layout converges.
	pub fn tick(&mut self, dt: f32) -> bool {
		let (Some(graph), Some(sim)) = (self.graph.as_mut(), self.simulation.as_mut()) else {
			return false;
		};
		let outcome = sim.tick(graph, dt);
		if outcome == TickOutcome::Idle {
			return false;
		}
		self.frame = on_tick(graph);
		outcome == TickOutcome::Ended && self.convergence.settle(SettleReason::Converged)
	}

	pub fn click_thresholds(&self) -> ClickThresholds {
		ClickThresholds {
			max_distance_px: self.config.click_max_distance_px,
			max_duration_ms: self.config.click_max_duration_ms,
		}
	}

	/// Topmost node under a screen point that accepts pointer events.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<(usize, NodeId)> {
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		self.frame
			.nodes
			.iter()
			.enumerate()
			.rev()
			.filter(|(_, f)| f.pointer_events)
			.find(|(_, f)| ((f.x - gx).powi(2) + (f.y - gy).powi(2)).sqrt() < HIT_RADIUS)
			.map(|(slot, f)| (slot, f.id))
	}

	pub fn begin_drag(&mut self, slot: usize, sx: f64, sy: f64, now_ms: f64) -> bool {
		let Some(node) = self.graph.as_ref().and_then(|g| g.nodes.get(slot)) else {
			return false;
		};
		self.drag = DragSession::begin(node.id, slot, node.filtered, (sx, sy), (node.x, node.y), now_ms);
		self.drag.is_some()
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let k = self.transform.k;
		let (Some(drag), Some(graph)) = (self.drag.as_mut(), self.graph.as_mut()) else {
			return;
		};
		let Some(node) = graph.nodes.get_mut(drag.slot) else {
			return;
		};
		if node.filtered {
			return;
		}
		let (x, y) = drag.drag_to(sx, sy, k);
		node.fx = Some(x);
		node.fy = Some(y);
		if let Some(sim) = self.simulation.as_mut() {
			sim.reheat(true);
		}
	}

	/// Release the held node; a click returns the node to select.
	pub fn end_drag(&mut self, now_ms: f64) -> Option<NodeId> {
		let drag = self.drag.take()?;
		self.release(drag.slot);
		let filtered = self
			.graph
			.as_ref()
			.and_then(|g| g.nodes.get(drag.slot))
			.is_none_or(|n| n.filtered);
		if filtered {
			return None;
		}
		match drag.finish(now_ms, self.click_thresholds()) {
			DragOutcome::Click(id) => Some(id),
			DragOutcome::Drag(id) => {
				debug!("released {id} after drag");
				None
			}
		}
	}

	/// Drop the held node without treating the press as a click.
	pub fn cancel_drag(&mut self) {
		if let Some(drag) = self.drag.take() {
			self.release(drag.slot);
		}
	}

	fn release(&mut self, slot: usize) {
		if let Some(node) = self.graph.as_mut().and_then(|g| g.nodes.get_mut(slot)) {
			node.fx = None;
			node.fy = None;
		}
		if let Some(sim) = self.simulation.as_mut() {
			sim.reheat(false);
		}
	}

	/// Select a node and paint its lineage.
	pub fn select_node(&mut self, id: NodeId) -> Option<LineageChain> {
		let graph = self.graph.as_ref()?;
		let Some(chain) = highlight_lineage_chain(&mut self.highlight, graph, id) else {
			self.selected = None;
			return None;
		};
		debug!(
			"lineage of {id}: {} nodes, {} links highlighted",
			self.highlight.highlighted_node_count(),
			self.highlight.highlighted_link_slots().count()
		);
		self.selected = Some(id);
		Some(chain)
	}

	pub fn clear_selection(&mut self) {
		self.selected = None;
		if self.highlight.has_highlight() {
			self.highlight.clear_highlight();
		}
	}

	/// Centre the view on a node. Returns false for unknown ids.
	pub fn focus_node(&mut self, id: NodeId) -> bool {
		let Some(node) = self.graph.as_ref().and_then(|g| g.node(id)) else {
			return false;
		};
		let (x, y) = (node.x, node.y);
		self.transform.center_on(x, y, self.width, self.height);
		true
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::lineage_graph::model::load_graph;

	fn context() -> GraphViewContext {
		let graph = load_graph(
			&json!([
				{ "id": 1, "name": "Anselm", "rank": "Bishop" },
				{ "id": 2, "name": "Bede", "rank": "Bishop" },
				{ "id": 3, "name": "Cuthbert", "rank": "Priest" }
			]),
			&json!([
				{ "source": 1, "target": 2, "type": "consecration" },
				{ "source": 2, "target": 3, "type": "ordination" }
			]),
			8.0,
		)
		.expect("valid payload");
		let mut ctx = GraphViewContext::new(GraphConfig::default(), 800.0, 600.0);
		ctx.load(graph);
		ctx
	}

	fn screen_of(ctx: &GraphViewContext, slot: usize) -> (f64, f64) {
		let n = &ctx.graph.as_ref().expect("loaded").nodes[slot];
		(
			n.x * ctx.transform.k + ctx.transform.x,
			n.y * ctx.transform.k + ctx.transform.y,
		)
	}

	#[test]
	fn recompute_before_load_is_a_no_op() {
		let mut ctx = GraphViewContext::new(GraphConfig::default(), 800.0, 600.0);
		ctx.set_criteria(FilterCriteria {
			hide_priests: true,
			backbone_only: false,
		});
		assert!(ctx.graph.is_none());
		assert!(!ctx.tick(0.016));
	}

	#[test]
	fn criteria_change_rebuilds_forces() {
		let mut ctx = context();
		ctx.set_criteria(FilterCriteria {
			hide_priests: true,
			backbone_only: false,
		});
		let sim = ctx.simulation.as_ref().expect("simulation");
		assert_eq!(sim.forces().charge[2], 0.0);
		assert_eq!(sim.forces().link_edges, vec![0]);
		assert_eq!(ctx.frame.nodes[2].opacity, 0.0);
	}

	#[test]
	fn hidden_node_is_not_hit() {
		let mut ctx = context();
		let (sx, sy) = screen_of(&ctx, 2);
		assert_eq!(ctx.node_at_position(sx, sy), Some((2, NodeId(3))));
		ctx.set_criteria(FilterCriteria {
			hide_priests: true,
			backbone_only: false,
		});
		assert_eq!(ctx.node_at_position(sx, sy), None);
		assert!(!ctx.begin_drag(2, sx, sy, 0.0));
	}

	#[test]
	fn quick_press_selects_and_highlights() {
		let mut ctx = context();
		let (sx, sy) = screen_of(&ctx, 2);
		assert!(ctx.begin_drag(2, sx, sy, 0.0));
		ctx.drag_to(sx + 1.0, sy);
		let clicked = ctx.end_drag(50.0).expect("click");
		let chain = ctx.select_node(clicked).expect("lineage");
		assert_eq!(chain.nodes, vec![NodeId(3), NodeId(2), NodeId(1)]);
		assert_eq!(ctx.selected, Some(NodeId(3)));
		assert!(ctx.highlight.is_node_highlighted(NodeId(1)));

		let node = &ctx.graph.as_ref().expect("loaded").nodes[2];
		assert_eq!((node.fx, node.fy), (None, None));
	}

	#[test]
	fn long_drag_does_not_select() {
		let mut ctx = context();
		let (sx, sy) = screen_of(&ctx, 0);
		ctx.begin_drag(0, sx, sy, 0.0);
		ctx.drag_to(sx + 40.0, sy + 40.0);
		assert_eq!(
			ctx.graph.as_ref().expect("loaded").nodes[0].fx,
			Some(ctx.graph.as_ref().expect("loaded").nodes[0].x + 40.0)
		);
		assert_eq!(ctx.end_drag(900.0), None);
		assert_eq!(ctx.selected, None);
	}

	#[test]
	fn node_hidden_mid_press_is_not_clicked() {
		let mut ctx = context();
		let (sx, sy) = screen_of(&ctx, 2);
		assert!(ctx.begin_drag(2, sx, sy, 0.0));
		ctx.set_criteria(FilterCriteria {
			hide_priests: true,
			backbone_only: false,
		});
		assert_eq!(ctx.end_drag(50.0), None);
		assert!(ctx.drag.is_none());
		assert_eq!(ctx.graph.as_ref().expect("loaded").nodes[2].fx, None);
	}

	#[test]
	fn cancelled_drag_unpins() {
		let mut ctx = context();
		let (sx, sy) = screen_of(&ctx, 0);
		ctx.begin_drag(0, sx, sy, 0.0);
		ctx.drag_to(sx + 3.0, sy);
		ctx.cancel_drag();
		assert!(ctx.drag.is_none());
		assert_eq!(ctx.graph.as_ref().expect("loaded").nodes[0].fx, None);
	}

	#[test]
	fn reload_keeps_criteria_and_selection() {
		let mut ctx = context();
		ctx.set_criteria(FilterCriteria {
			hide_priests: true,
			backbone_only: false,
		});
		ctx.select_node(NodeId(2));
		let graph = ctx.graph.clone().expect("loaded");
		ctx.load(graph);
		assert!(ctx.graph.as_ref().expect("loaded").nodes[2].filtered);
		assert!(ctx.highlight.is_node_highlighted(NodeId(1)));
	}

	#[test]
	fn focus_centres_node() {
		let mut ctx = context();
		assert!(ctx.focus_node(NodeId(2)));
		let (sx, sy) = screen_of(&ctx, 1);
		assert!((sx - 400.0).abs() < 1e-9);
		assert!((sy - 300.0).abs() < 1e-9);
		assert!(!ctx.focus_node(NodeId(99)));
	}
}
