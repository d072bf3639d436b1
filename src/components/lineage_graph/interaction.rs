use super::types::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zoom by `factor` around a screen point, clamped to [0.1, 10].
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}

	/// Translate so that graph point (gx, gy) sits at the viewport centre.
	pub fn center_on(&mut self, gx: f64, gy: f64, width: f64, height: f64) {
		self.x = width / 2.0 - gx * self.k;
		self.y = height / 2.0 - gy * self.k;
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Limits under which a press on a node counts as a click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickThresholds {
	pub max_distance_px: f64,
	pub max_duration_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
	/// Short and still enough to select the node.
	Click(NodeId),
	/// The node was moved; leave selection alone.
	Drag(NodeId),
}

/// One press-move-release sequence on a node.
#[derive(Clone, Debug)]
pub struct DragSession {
	pub node: NodeId,
	pub slot: usize,
	pub last_x: f64,
	pub last_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	start_x: f64,
	start_y: f64,
	started_at_ms: f64,
	travelled: f64,
}

impl DragSession {
	/// Start a session, or `None` when the node is filtered out of view.
	pub fn begin(
		node: NodeId,
		slot: usize,
		filtered: bool,
		(sx, sy): (f64, f64),
		(node_x, node_y): (f64, f64),
		now_ms: f64,
	) -> Option<Self> {
		if filtered {
			return None;
		}
		Some(Self {
			node,
			slot,
			last_x: sx,
			last_y: sy,
			node_start_x: node_x,
			node_start_y: node_y,
			start_x: sx,
			start_y: sy,
			started_at_ms: now_ms,
			travelled: 0.0,
		})
	}

	/// Record pointer movement and return the node's new graph position.
	pub fn drag_to(&mut self, sx: f64, sy: f64, k: f64) -> (f64, f64) {
		self.travelled += ((sx - self.last_x).powi(2) + (sy - self.last_y).powi(2)).sqrt();
		self.last_x = sx;
		self.last_y = sy;
		(
			self.node_start_x + (sx - self.start_x) / k,
			self.node_start_y + (sy - self.start_y) / k,
		)
	}

	pub fn finish(&self, now_ms: f64, limits: ClickThresholds) -> DragOutcome {
		let quick = now_ms - self.started_at_ms < limits.max_duration_ms;
		let still = self.travelled < limits.max_distance_px;
		if quick && still {
			DragOutcome::Click(self.node)
		} else {
			DragOutcome::Drag(self.node)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const LIMITS: ClickThresholds = ClickThresholds {
		max_distance_px: 5.0,
		max_duration_ms: 300.0,
	};

	fn session() -> DragSession {
		DragSession::begin(NodeId(7), 0, false, (100.0, 100.0), (10.0, 20.0), 1_000.0)
			.expect("visible node")
	}

	#[test]
	fn filtered_node_cannot_be_dragged() {
		assert!(DragSession::begin(NodeId(7), 0, true, (0.0, 0.0), (0.0, 0.0), 0.0).is_none());
	}

	#[test]
	fn short_still_press_is_a_click() {
		let mut s = session();
		s.drag_to(102.0, 101.0, 1.0);
		assert_eq!(s.finish(1_100.0, LIMITS), DragOutcome::Click(NodeId(7)));
	}

	#[test]
	fn long_press_is_a_drag() {
		let s = session();
		assert_eq!(s.finish(1_500.0, LIMITS), DragOutcome::Drag(NodeId(7)));
	}

	#[test]
	fn travel_accumulates_even_when_returning() {
		let mut s = session();
		s.drag_to(104.0, 100.0, 1.0);
		s.drag_to(100.0, 100.0, 1.0);
		assert_eq!(s.finish(1_050.0, LIMITS), DragOutcome::Drag(NodeId(7)));
	}

	#[test]
	fn drag_position_respects_zoom() {
		let mut s = session();
		assert_eq!(s.drag_to(120.0, 90.0, 2.0), (20.0, 15.0));
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut t = ViewTransform { x: 50.0, y: 50.0, k: 1.0 };
		let before = t.screen_to_graph(200.0, 120.0);
		t.zoom_at(200.0, 120.0, 1.1);
		let after = t.screen_to_graph(200.0, 120.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);

		t.zoom_at(0.0, 0.0, 1_000.0);
		assert_eq!(t.k, 10.0);
	}

	#[test]
	fn center_on_puts_node_mid_screen() {
		let mut t = ViewTransform { x: 0.0, y: 0.0, k: 2.0 };
		t.center_on(10.0, -5.0, 800.0, 600.0);
		let (gx, gy) = t.screen_to_graph(400.0, 300.0);
		assert_eq!((gx, gy), (10.0, -5.0));
	}
}
