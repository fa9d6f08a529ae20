use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::backend::{GraphHandle, SharedState, step_frame};
use super::camera::{CameraPersistence, CameraStore, LocalStorageStore, MemoryStore};
use super::frame::Communities;
use super::keyboard::{apply_key, key_action};
use super::overlay::{OverlayStats, PerformanceOverlay};
use super::render;
use super::state::ForceGraphState;
use super::types::{DisplayMode, GraphData, GraphNode};
use crate::config::RenderConfig;
use crate::error::GraphError;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

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

fn performance_now() -> Option<f64> {
	web_sys::window()?.performance().map(|p| p.now())
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Pointer position relative to the canvas.
fn pointer(canvas: Option<HtmlCanvasElement>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let rect = canvas?.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] config: RenderConfig,
	#[prop(optional)] display_mode: DisplayMode,
	#[prop(optional, into)] highlighted: Option<Signal<HashSet<String>>>,
	#[prop(optional, into)] communities: Option<Signal<Option<Communities>>>,
	/// `localStorage` key the camera pose is persisted under.
	#[prop(optional, into)]
	camera_storage_key: Option<String>,
	#[prop(default = false)] show_performance: bool,
	#[prop(optional)] on_node_click: Option<Callback<GraphNode>>,
	#[prop(optional)] on_node_hover: Option<Callback<Option<GraphNode>>>,
	#[prop(optional)] on_graph_ready: Option<Callback<GraphHandle>>,
	#[prop(optional)] on_performance_drop: Option<Callback<f64>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let frame_loop: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let raf_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let (backend_error, set_backend_error) = signal(None::<String>);
	let (overlay, set_overlay) = signal(None::<OverlayStats>);
	let (aria_label, set_aria_label) = signal(String::from("Academic entity graph"));

	let (state_init, loop_init, resize_init, raf_init) =
		(state.clone(), frame_loop.clone(), resize_cb.clone(), raf_id.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let graph_data = data.get();
		let selected = match (display_mode, highlighted) {
			(DisplayMode::Filter, Some(sel)) => sel.get(),
			(DisplayMode::Highlight, Some(sel)) => sel.get_untracked(),
			(_, None) => HashSet::new(),
		};

		if let Some(s) = state_init.borrow_mut().as_mut() {
			s.set_data(&graph_data, display_mode, selected);
			return;
		}

		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			set_backend_error.set(Some(GraphError::BackendUnavailable("no window".into()).to_string()));
			return;
		};
		let Some(ctx) = context_2d(&canvas) else {
			let err = GraphError::BackendUnavailable("2D canvas context".into());
			error!("graph: {err}");
			set_backend_error.set(Some(err.to_string()));
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let mut graph_state = ForceGraphState::new(&graph_data, w, h, config.clone());
		if let Some(key) = camera_storage_key.clone() {
			let store: Box<dyn CameraStore> = match LocalStorageStore::open() {
				Some(local) => Box::new(local),
				None => {
					warn!("graph: localStorage unavailable, camera kept in memory");
					Box::new(MemoryStore::default())
				}
			};
			graph_state = graph_state.with_persistence(CameraPersistence::new(
				store,
				key,
				config.camera_debounce_ms,
			));
		}
		if display_mode == DisplayMode::Filter {
			graph_state.set_data(&graph_data, display_mode, selected);
		} else {
			graph_state.set_selection(selected);
		}
		graph_state.set_communities(communities.and_then(|c| c.get_untracked()));
		graph_state.observe_performance(show_performance, on_performance_drop.is_some());
		*state_init.borrow_mut() = Some(graph_state);
		info!("graph: canvas mounted at {w}x{h}");

		if let Some(cb) = on_graph_ready {
			cb.run(GraphHandle::new(state_init.clone()));
		}

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_init.borrow_mut() = Some(Closure::new(move || {
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
			if let Some(ref cb) = *resize_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, loop_inner, raf_inner) =
			(state_init.clone(), loop_init.clone(), raf_init.clone());
		*loop_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			let outcome = step_frame(
				&state_anim,
				now,
				|| performance_now().unwrap_or(now),
				|s, snapshot| render::render(s, snapshot, &ctx),
			);
			if outcome.overlay.is_some() {
				set_overlay.set(outcome.overlay);
			}
			if let (Some(fps), Some(cb)) = (outcome.dropped_to, on_performance_drop) {
				cb.run(fps);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), loop_inner.borrow().as_ref()) {
				raf_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *loop_init.borrow() {
			raf_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let state_emphasis = state.clone();
	Effect::new(move |_| {
		let selected = highlighted.map(|h| h.get());
		let groups = communities.map(|c| c.get());
		if let Some(s) = state_emphasis.borrow_mut().as_mut() {
			if let (DisplayMode::Highlight, Some(selected)) = (display_mode, selected) {
				s.set_selection(selected);
			}
			if let Some(groups) = groups {
				s.set_communities(groups);
			}
		}
	});

	let teardown: Box<dyn FnOnce()> = Box::new({
		let (state, frame_loop, resize_cb, raf_id) =
			(state.clone(), frame_loop.clone(), resize_cb.clone(), raf_id.clone());
		move || {
			if let Some(window) = web_sys::window() {
				if let Some(id) = raf_id.take() {
					let _ = window.cancel_animation_frame(id);
				}
				if let Some(cb) = resize_cb.borrow_mut().take() {
					let _ = window
						.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}
			frame_loop.borrow_mut().take();
			if let Some(mut s) = state.borrow_mut().take() {
				s.teardown();
			}
			info!("graph: canvas unmounted");
		}
	});
	let teardown = StoredValue::new_local(Some(teardown));
	on_cleanup(move || {
		if let Some(teardown) = teardown.try_update_value(Option::take).flatten() {
			teardown();
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref.get(), &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			match s.node_at_position(x, y) {
				Some(slot) => s.begin_drag(slot),
				None => s.begin_pan(x, y),
			}
		}
	};

	let state_click = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref.get(), &ev) else {
			return;
		};
		let clicked = state_click.borrow().as_ref().and_then(|s| {
			let slot = s.node_at_position(x, y)?;
			s.node(slot).cloned()
		});
		if let (Some(node), Some(cb)) = (clicked, on_node_click) {
			cb.run(node);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref.get(), &ev) else {
			return;
		};
		let mut hover_change = None;
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.active {
				s.drag_to(x, y);
			} else if s.pan.active {
				s.pan_to(x, y);
			} else {
				let hovered = s.node_at_position(x, y);
				if hovered != s.hover.node {
					s.set_hover(hovered);
					hover_change = Some((
						hovered.and_then(|slot| s.node(slot).cloned()),
						s.hovered_label(),
					));
				}
			}
		}
		if let Some((node, label)) = hover_change {
			set_aria_label.set(label.unwrap_or_else(|| String::from("Academic entity graph")));
			if let Some(cb) = on_node_hover {
				cb.run(node);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.end_pointer();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let had_hover = match *state_ml.borrow_mut() {
			Some(ref mut s) => {
				s.end_pointer();
				let had = s.hover.node.is_some();
				s.set_hover(None);
				had
			}
			None => false,
		};
		if let (true, Some(cb)) = (had_hover, on_node_hover) {
			cb.run(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref.get(), &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(ev.delta_y(), x, y);
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		let Some(action) = key_action(&ev.key(), ev.shift_key()) else {
			return;
		};
		ev.prevent_default();
		if let Some(ref mut s) = *state_kd.borrow_mut() {
			apply_key(action, s);
		}
	};

	view! {
		<div class="force-graph" style="position: relative; width: 100%; height: 100%;">
			{move || {
				backend_error
					.get()
					.map(|msg| {
						view! {
							<div class="graph-fallback" role="alert">
								<p>"Graph rendering is not available in this browser."</p>
								<p class="graph-fallback-detail">{msg}</p>
							</div>
						}
					})
			}}
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				tabindex="0"
				role="img"
				aria-label=move || aria_label.get()
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:click=on_click
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: grab; outline: none;"
			/>
			{show_performance.then(|| view! { <PerformanceOverlay stats=overlay /> })}
		</div>
	}
}
