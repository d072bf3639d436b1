use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use leptos::leptos_dom::helpers::set_timeout;
use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::filters::FilterCriteria;
use super::layout::SettleReason;
use super::render;
use super::state::GraphViewContext;
use super::types::{Graph, NodeId};

type SharedContext = Rc<RefCell<Option<GraphViewContext>>>;

/// Shared stop flag for the animation loop. Cleanup may run off the loop's closure.
#[derive(Clone, Debug, Default)]
struct LoopHandle(Arc<AtomicBool>);

impl LoopHandle {
	fn stop(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	fn is_running(&self) -> bool {
		!self.0.load(Ordering::Relaxed)
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(600.0),
	)
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas view of the lineage graph with filtering, drag and lineage highlighting.
#[component]
pub fn LineageGraphCanvas(
	#[prop(into)] data: Signal<Option<Graph>>,
	#[prop(into)] criteria: Signal<FilterCriteria>,
	#[prop(into)] focus: Signal<Option<NodeId>>,
	selected: RwSignal<Option<NodeId>>,
	loading: RwSignal<bool>,
	#[prop(optional)] config: GraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedContext = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let generation = Rc::new(Cell::new(0u64));
	let frame_loop = LoopHandle::default();
	let frame_loop_cleanup = frame_loop.clone();
	on_cleanup(move || frame_loop_cleanup.stop());
	let (fallback_ms, dispatch_ms) = (
		config.convergence_fallback_ms,
		config.click_dispatch_delay_ms,
	);

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let graph = data.get();
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		if state_init.borrow().is_none() {
			let (w, h) = if fullscreen {
				window_size(&window)
			} else {
				let parent = canvas.parent_element();
				(
					width.unwrap_or_else(|| {
						parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)
					}),
					height.unwrap_or_else(|| {
						parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)
					}),
				)
			};
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);

			let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
				Ok(Some(ctx)) => match ctx.dyn_into() {
					Ok(ctx) => ctx,
					Err(_) => {
						error!("2d context has an unexpected type");
						return;
					}
				},
				_ => {
					error!("canvas has no 2d context");
					return;
				}
			};

			let mut view = GraphViewContext::new(config.clone(), w, h);
			view.filters.criteria = criteria.get_untracked();
			view.selected = selected.get_untracked();
			*state_init.borrow_mut() = Some(view);

			if fullscreen {
				let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
				*resize_cb.borrow_mut() = Some(Closure::new(move || {
					let Some(win) = web_sys::window() else {
						return;
					};
					let (nw, nh) = window_size(&win);
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					if let Some(ref mut s) = *state_resize.borrow_mut() {
						s.resize(nw, nh);
					}
				}));
				if let Some(ref cb) = *resize_cb.borrow() {
					let _ =
						window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}

			let (state_anim, animate_inner) = (state_init.clone(), animate.clone());
			let (resize_inner, frame_loop_anim) = (resize_cb.clone(), frame_loop.clone());
			*animate.borrow_mut() = Some(Closure::new(move || {
				if !frame_loop_anim.is_running() {
					if let (Some(cb), Some(win)) = (resize_inner.borrow_mut().take(), web_sys::window()) {
						let _ = win
							.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
					}
					info!("lineage canvas unmounted, stopping animation");
					let _ = animate_inner.borrow_mut().take();
					return;
				}
				if let Some(ref mut s) = *state_anim.borrow_mut() {
					if s.tick(0.016) {
						loading.set(false);
					}
					render::render(s, &ctx);
				}
				if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}));
			if let Some(ref cb) = *animate.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}

		let Some(graph) = graph else {
			return;
		};
		if let Some(ref mut s) = *state_init.borrow_mut() {
			s.load(graph);
		}
		loading.set(true);

		generation.set(generation.get() + 1);
		let (state_timer, generation_timer, scheduled) =
			(state_init.clone(), generation.clone(), generation.get());
		set_timeout(
			move || {
				if generation_timer.get() != scheduled {
					return;
				}
				if let Some(ref mut s) = *state_timer.borrow_mut() {
					if s.convergence.settle(SettleReason::FallbackTimer) {
						info!("layout still moving after {fallback_ms} ms, hiding loader");
						loading.set(false);
					}
				}
			},
			Duration::from_millis(fallback_ms),
		);
	});

	let state_criteria = state.clone();
	Effect::new(move |_| {
		let criteria = criteria.get();
		if let Some(ref mut s) = *state_criteria.borrow_mut() {
			s.set_criteria(criteria);
		}
	});

	let state_selected = state.clone();
	Effect::new(move |_| {
		let id = selected.get();
		if let Some(ref mut s) = *state_selected.borrow_mut() {
			match id {
				Some(id) => {
					s.select_node(id);
				}
				None => s.clear_selection(),
			}
		}
	});

	let state_focus = state.clone();
	Effect::new(move |_| {
		let Some(id) = focus.get() else {
			return;
		};
		if let Some(ref mut s) = *state_focus.borrow_mut() {
			s.focus_node(id);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some((slot, _)) = s.node_at_position(x, y) {
				s.begin_drag(slot, x, y, js_sys::Date::now());
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.is_some() {
				s.drag_to(x, y);
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			} else {
				s.hovered = s.node_at_position(x, y).map(|(_, id)| id);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let clicked = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				s.pan.active = false;
				s.end_drag(js_sys::Date::now())
			}
			None => None,
		};
		if let Some(id) = clicked {
			// Let the drag release settle before selection repaints.
			set_timeout(
				move || selected.set(Some(id)),
				Duration::from_millis(dispatch_ms),
			);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.cancel_drag();
			s.pan.active = false;
			s.hovered = None;
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.transform.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="lineage-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stopping_a_clone_stops_the_loop() {
		let frame_loop = LoopHandle::default();
		let cleanup = frame_loop.clone();
		assert!(frame_loop.is_running());
		cleanup.stop();
		assert!(!frame_loop.is_running());
	}
}
