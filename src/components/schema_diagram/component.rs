use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{CLICK_SLOP, DiagramState};
use crate::schema::geometry::EdgeStyle;
use crate::schema::graph::{Graph, NodeId};
use crate::schema::layout::LayoutExtent;
use crate::schema::path_state::PathState;

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas view of a laid-out class graph with path highlights.
///
/// Drag a class to move it, drag the background to pan, scroll to zoom.
/// Clicking a class without dragging it reports its id to `on_node_click`.
/// Each new `extent` refits the view; without a fixed size the canvas
/// follows its parent when the window resizes.
#[component]
pub fn SchemaDiagramCanvas(
	#[prop(into)] graph: Signal<Graph>,
	#[prop(into)] extent: Signal<LayoutExtent>,
	#[prop(into)] paths: Signal<PathState>,
	#[prop(into)] edge_style: Signal<EdgeStyle>,
	#[prop(into)] relax: Signal<bool>,
	#[prop(into)] on_node_click: Callback<NodeId>,
	#[prop(default = 180.0)] node_width: f64,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<DiagramState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) = (state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let parent = canvas.parent_element();
		let w = width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64));
		let h = height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64));
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("Canvas 2d context unavailable");
			return;
		};

		let mut initial = DiagramState::new(&graph.get_untracked(), node_width, w, h);
		initial.paths = paths.get_untracked();
		initial.edge_style = edge_style.get_untracked();
		initial.set_relax(relax.get_untracked());
		initial.fit_to(extent.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		if width.is_none() || height.is_none() {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let parent = canvas_resize.parent_element();
				let nw = width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64));
				let nh = height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64));
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_graph = state.clone();
	Effect::new(move |_| {
		let g = graph.get();
		if let Some(ref mut s) = *state_graph.borrow_mut() {
			s.load(&g);
		}
	});

	let state_fit = state.clone();
	Effect::new(move |_| {
		let e = extent.get();
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			s.fit_to(e);
		}
	});

	let state_view = state.clone();
	Effect::new(move |_| {
		let (p, style, relaxed) = (paths.get(), edge_style.get(), relax.get());
		if let Some(ref mut s) = *state_view.borrow_mut() {
			s.paths = p;
			s.edge_style = style;
			s.set_relax(relaxed);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
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
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				s.hover = s.node_at_position(x, y);
			}

			if s.drag.active {
				if (x - s.drag.start_x).hypot(y - s.drag.start_y) > CLICK_SLOP {
					s.drag.moved = true;
				}
				if let (Some(idx), true) = (s.drag.node_idx, s.drag.moved) {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let clicked = {
			let mut guard = state_mu.borrow_mut();
			let Some(ref mut s) = *guard else {
				return;
			};
			let clicked = match (s.drag.active, s.drag.moved, s.drag.node_idx) {
				(true, false, Some(idx)) => s.node_id(idx).cloned(),
				_ => None,
			};
			s.drag = Default::default();
			s.pan.active = false;
			clicked
		};
		// Release the borrow first; the callback may reload the state.
		if let Some(id) = clicked {
			on_node_click.run(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag = Default::default();
			s.pan.active = false;
			s.hover = None;
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="schema-diagram-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
