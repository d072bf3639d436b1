use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::config::GraphConfig;
use super::types::{Graph, NodeId};

const NODE_MASS: f32 = 10.0;
const NODE_SPEED: f32 = 3000.0;
const FORCE_MAX: f32 = 100.0;
const COLLIDE_STRENGTH: f64 = 0.7;
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Physics constants taken from the page configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceSettings {
	pub charge_strength: f32,
	pub link_strength: f32,
	pub damping: f32,
	pub collision_radius: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
}

impl ForceSettings {
	pub fn from_config(cfg: &GraphConfig) -> Self {
		Self {
			charge_strength: cfg.charge_strength,
			link_strength: cfg.link_strength,
			damping: cfg.damping,
			collision_radius: cfg.collision_radius,
			alpha_min: cfg.alpha_min,
			alpha_decay: cfg.alpha_decay,
		}
	}
}

/// The inputs each force receives. Filtered entities contribute nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForceConfig {
	/// Indices into `Graph::links` taking part in the link force.
	pub link_edges: Vec<usize>,
	/// Charge strength per node slot.
	pub charge: Vec<f32>,
	/// Collision radius per node slot.
	pub collide: Vec<f64>,
	/// Whether the node slot takes part in the physics at all.
	pub active: Vec<bool>,
}

impl ForceConfig {
	pub fn build(graph: &Graph, settings: &ForceSettings) -> Self {
		Self {
			link_edges: graph
				.links
				.iter()
				.enumerate()
				.filter(|(_, l)| !l.filtered)
				.map(|(i, _)| i)
				.collect(),
			charge: graph
				.nodes
				.iter()
				.map(|n| if n.filtered { 0.0 } else { settings.charge_strength })
				.collect(),
			collide: graph
				.nodes
				.iter()
				.map(|n| if n.filtered { 0.0 } else { settings.collision_radius })
				.collect(),
			active: graph.nodes.iter().map(|n| !n.filtered).collect(),
		}
	}

	fn is_active(&self, slot: usize) -> bool {
		self.active.get(slot).copied().unwrap_or(false)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
	/// Positions moved this tick.
	Running,
	/// Alpha dropped below the minimum on this tick.
	Ended,
	/// Nothing to do until the simulation is restarted.
	Idle,
}

/// Drives the `force_graph` engine with per-entity force overrides and alpha cooling.
pub struct LayoutSimulation {
	engine: ForceGraph<usize, ()>,
	forces: ForceConfig,
	settings: ForceSettings,
	alpha: f64,
	alpha_target: f64,
	ended: bool,
}

impl LayoutSimulation {
	pub fn new(graph: &Graph, settings: ForceSettings) -> Self {
		let mut sim = Self {
			engine: ForceGraph::new(engine_parameters(&settings)),
			forces: ForceConfig::default(),
			settings,
			alpha: 1.0,
			alpha_target: 0.0,
			ended: false,
		};
		sim.rebuild_forces(graph);
		sim
	}

	#[cfg(test)]
	pub fn forces(&self) -> &ForceConfig {
		&self.forces
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Swap in forces built from the current filter flags and restart at full heat.
	pub fn rebuild_forces(&mut self, graph: &Graph) {
		self.forces = ForceConfig::build(graph, &self.settings);
		let mut engine = ForceGraph::new(engine_parameters(&self.settings));
		let mut slots = vec![None; graph.nodes.len()];

		for (slot, node) in graph.nodes.iter().enumerate() {
			if !self.forces.is_active(slot) {
				continue;
			}
			let (x, y) = (node.fx.unwrap_or(node.x), node.fy.unwrap_or(node.y));
			slots[slot] = Some(engine.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: NODE_MASS,
				is_anchor: node.fx.is_some(),
				user_data: slot,
			}));
		}

		for &i in &self.forces.link_edges {
			let link = &graph.links[i];
			if let (Some(src), Some(tgt)) = (slots[link.source], slots[link.target]) {
				engine.add_edge(src, tgt, EdgeData::default());
			}
		}

		self.engine = engine;
		self.restart();
		info!(
			"forces rebuilt: {} active links, {} inert nodes",
			self.forces.link_edges.len(),
			self.forces.active.iter().filter(|&&a| !a).count()
		);
	}

	pub fn restart(&mut self) {
		self.alpha = 1.0;
		self.ended = false;
	}

	/// Keep the layout warm while a node is held.
	pub fn reheat(&mut self, dragging: bool) {
		self.alpha_target = if dragging { DRAG_ALPHA_TARGET } else { 0.0 };
		if dragging {
			self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
			self.ended = false;
		}
	}

	/// Advance the physics and copy positions back into the graph.
	pub fn tick(&mut self, graph: &mut Graph, dt: f32) -> TickOutcome {
		if self.ended {
			return TickOutcome::Idle;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.settings.alpha_decay;

		self.engine.visit_nodes_mut(|n| {
			let node = &graph.nodes[n.data.user_data];
			if let (Some(fx), Some(fy)) = (node.fx, node.fy) {
				n.data.x = fx as f32;
				n.data.y = fy as f32;
				n.data.is_anchor = true;
			} else {
				n.data.is_anchor = false;
			}
		});
		self.engine.update(dt * self.alpha as f32);
		self.engine.visit_nodes(|n| {
			let node = &mut graph.nodes[n.data.user_data];
			node.x = n.x() as f64;
			node.y = n.y() as f64;
		});

		apply_collisions(graph, &self.forces.collide);
		self.engine.visit_nodes_mut(|n| {
			let node = &graph.nodes[n.data.user_data];
			n.data.x = node.x as f32;
			n.data.y = node.y as f32;
		});

		if self.alpha < self.settings.alpha_min {
			self.ended = true;
			debug!("layout cooled below alpha {}", self.settings.alpha_min);
			return TickOutcome::Ended;
		}
		TickOutcome::Running
	}
}

fn engine_parameters(settings: &ForceSettings) -> SimulationParameters {
	SimulationParameters {
		force_charge: settings.charge_strength.abs(),
		force_spring: settings.link_strength,
		force_max: FORCE_MAX,
		node_speed: NODE_SPEED,
		damping_factor: settings.damping,
	}
}

/// Push overlapping nodes apart. Zero radius opts a node out entirely.
fn apply_collisions(graph: &mut Graph, radii: &[f64]) {
	let active: Vec<usize> = (0..graph.nodes.len())
		.filter(|&i| radii.get(i).is_some_and(|&r| r > 0.0))
		.collect();

	for (a, &i) in active.iter().enumerate() {
		for &j in &active[a + 1..] {
			let min_dist = radii[i] + radii[j];
			let (mut dx, dy) = (
				graph.nodes[j].x - graph.nodes[i].x,
				graph.nodes[j].y - graph.nodes[i].y,
			);
			if dx == 0.0 && dy == 0.0 {
				dx = 1e-3 * (j - i) as f64;
			}
			let dist = (dx * dx + dy * dy).sqrt();
			if dist >= min_dist {
				continue;
			}
			let push = (min_dist - dist) / dist * 0.5 * COLLIDE_STRENGTH;
			if graph.nodes[i].fx.is_none() {
				graph.nodes[i].x -= dx * push;
				graph.nodes[i].y -= dy * push;
			}
			if graph.nodes[j].fx.is_none() {
				graph.nodes[j].x += dx * push;
				graph.nodes[j].y += dy * push;
			}
		}
	}
}

/// Where and how a link is drawn on this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkFrame {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub opacity: f64,
	pub pointer_events: bool,
}

/// Where and how a node is drawn on this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeFrame {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub opacity: f64,
	pub pointer_events: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickFrame {
	pub nodes: Vec<NodeFrame>,
	pub links: Vec<LinkFrame>,
}

/// Map positions and filter flags to visual attributes.
pub fn on_tick(graph: &Graph) -> TickFrame {
	let links = graph
		.links
		.iter()
		.map(|l| {
			let (s, t) = (&graph.nodes[l.source], &graph.nodes[l.target]);
			LinkFrame {
				x1: s.x + l.parallel_offset,
				y1: s.y,
				x2: t.x + l.parallel_offset,
				y2: t.y,
				opacity: if l.filtered { 0.0 } else { 1.0 },
				pointer_events: !l.filtered,
			}
		})
		.collect();
	let nodes = graph
		.nodes
		.iter()
		.map(|n| NodeFrame {
			id: n.id,
			x: n.x,
			y: n.y,
			opacity: if n.filtered { 0.0 } else { 1.0 },
			pointer_events: !n.filtered,
		})
		.collect();
	TickFrame { nodes, links }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleReason {
	Converged,
	FallbackTimer,
}

/// Tracks whether the loading indicator may be hidden. First signal wins.
#[derive(Clone, Debug, Default)]
pub struct ConvergenceWatch {
	settled: Option<SettleReason>,
}

impl ConvergenceWatch {
	#[cfg(test)]
	pub fn is_settled(&self) -> bool {
		self.settled.is_some()
	}

	/// Returns true only for the signal that settles the layout.
	pub fn settle(&mut self, reason: SettleReason) -> bool {
		if self.settled.is_some() {
			return false;
		}
		info!("layout settled: {reason:?}");
		self.settled = Some(reason);
		true
	}

	pub fn reset(&mut self) {
		self.settled = None;
	}
}
