//! Leptos component wrapping the topology editor canvas.
//!
//! The component owns a toolbar, a draggable inventory sidebar and the canvas.
//! Mouse and HTML5 drag-and-drop events are translated into calls on
//! [`TopologyEditorState`]; the resulting [`EditorEvent`]s are fanned out to
//! the optional callbacks. An animation loop runs via `requestAnimationFrame`
//! and redraws the canvas each frame.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, DragEvent, HtmlCanvasElement, HtmlInputElement, KeyboardEvent,
	MouseEvent, Window,
};

use super::config::EditorConfig;
use super::drag::CanvasRect;
use super::interaction::{InteractionMode, Shortcut};
use super::render;
use super::state::{EditorEvent, TopologyEditorState};
use super::store::TopologyGraph;
use super::theme::{Theme, default_node_color};
use super::types::{InventoryItem, NodeKind, Position, TopologyData};

/// MIME type of the sidebar drag payload.
const PAYLOAD_MIME: &str = "application/json";

/// Editor state plus the theme used to draw it.
struct EditorContext {
	state: TopologyEditorState,
	theme: Theme,
}

/// Host callbacks. All optional.
#[derive(Clone, Copy, Default)]
struct EditorCallbacks {
	node_drag_end: Option<Callback<(String, Position)>>,
	arc_drag_start: Option<Callback<(String, f64)>>,
	arc_drag: Option<Callback<(String, f64)>>,
	arc_drag_end: Option<Callback<(String, f64)>>,
	change: Option<Callback<TopologyData>>,
}

/// Runs an operation against the editor state and forwards what it reports.
#[derive(Clone)]
struct Dispatcher {
	context: Rc<RefCell<Option<EditorContext>>>,
	callbacks: EditorCallbacks,
	notice: RwSignal<Option<String>>,
	mode: RwSignal<InteractionMode>,
}

impl Dispatcher {
	fn run(&self, op: impl FnOnce(&mut TopologyEditorState) -> Vec<EditorEvent>) {
		// The borrow is released before any callback runs; a callback may well
		// push new data back into the editor.
		let (events, snapshot, notice, mode) = {
			let mut guard = self.context.borrow_mut();
			let Some(c) = guard.as_mut() else {
				return;
			};
			let events = op(&mut c.state);
			let snapshot = events
				.contains(&EditorEvent::Changed)
				.then(|| c.state.graph.to_data());
			(events, snapshot, c.state.notice.clone(), c.state.interaction.mode())
		};

		if self.notice.get_untracked() != notice {
			self.notice.set(notice);
		}
		if self.mode.get_untracked() != mode {
			self.mode.set(mode);
		}

		let cb = self.callbacks;
		for event in events {
			match event {
				EditorEvent::NodeDragEnd { node_id, position } => {
					if let Some(f) = cb.node_drag_end {
						f.run((node_id, position));
					}
				}
				EditorEvent::ArcDragStart { link_id, arc } => {
					if let Some(f) = cb.arc_drag_start {
						f.run((link_id, arc));
					}
				}
				EditorEvent::ArcDrag { link_id, arc } => {
					if let Some(f) = cb.arc_drag {
						f.run((link_id, arc));
					}
				}
				EditorEvent::ArcDragEnd { link_id, arc } => {
					if let Some(f) = cb.arc_drag_end {
						f.run((link_id, arc));
					}
				}
				EditorEvent::Changed => {}
				EditorEvent::Notice(message) => debug!("topology-editor: notice {}", message),
			}
		}
		if let (Some(f), Some(data)) = (cb.change, snapshot) {
			f.run(data);
		}
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_rect(canvas: &HtmlCanvasElement) -> CanvasRect {
	let rect = canvas.get_bounding_client_rect();
	CanvasRect {
		left: rect.left(),
		top: rect.top(),
	}
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Position> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	Some(canvas_rect(&canvas).to_canvas(ev.client_x() as f64, ev.client_y() as f64))
}

/// Interactive editor for a BGP lab topology.
///
/// `data` seeds the editor and reloads it whenever the signal changes.
/// `inventory` lists the daemons and hosts that can be dragged onto the canvas.
/// Set `fullscreen = true` to fill the viewport and follow window resizes;
/// explicit `width`/`height` override the configured canvas size.
#[component]
pub fn TopologyEditor(
	#[prop(into)] data: Signal<TopologyData>,
	#[prop(into, default = Signal::stored(Vec::new()))] inventory: Signal<Vec<InventoryItem>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] config: Option<EditorConfig>,
	/// Called once when a node drag finishes, with the final position.
	#[prop(optional)]
	on_node_drag_end: Option<Callback<(String, Position)>>,
	#[prop(optional)] on_arc_drag_start: Option<Callback<(String, f64)>>,
	#[prop(optional)] on_arc_drag: Option<Callback<(String, f64)>>,
	/// Called once when an arc drag finishes, with the final arc.
	#[prop(optional)]
	on_arc_drag_end: Option<Callback<(String, f64)>>,
	/// Called with the whole document after every structural change.
	#[prop(optional)]
	on_change: Option<Callback<TopologyData>>,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<EditorContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	let notice = RwSignal::new(None::<String>);
	let mode = RwSignal::new(InteractionMode::Select);
	let dispatcher = Dispatcher {
		context: context.clone(),
		callbacks: EditorCallbacks {
			node_drag_end: on_node_drag_end,
			arc_drag_start: on_arc_drag_start,
			arc_drag: on_arc_drag,
			arc_drag_end: on_arc_drag_end,
			change: on_change,
		},
		notice,
		mode,
	};

	Effect::new(move |_| {
		let topology = data.get();
		if let Some(ref mut c) = *context_init.borrow_mut() {
			c.state.load(topology);
			return;
		}

		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((config.canvas_width, config.canvas_height))
		} else {
			(
				width.unwrap_or(config.canvas_width),
				height.unwrap_or(config.canvas_height),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("topology-editor: canvas has no 2d context");
			return;
		};

		*context_init.borrow_mut() = Some(EditorContext {
			state: TopologyEditorState::new(TopologyGraph::from_data(topology), w, h, config.clone()),
			theme: Theme::default(),
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref c) = *context_anim.borrow() {
				render::render(&c.state, &ctx, &c.theme);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let dispatch_md = dispatcher.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(p) = canvas_point(canvas_ref, &ev) {
			dispatch_md.run(|s| s.pointer_down(p));
		}
	};

	let dispatch_mm = dispatcher.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = canvas_point(canvas_ref, &ev) {
			dispatch_mm.run(|s| s.pointer_move(p));
		}
	};

	let dispatch_mu = dispatcher.clone();
	let on_mouseup = move |_: MouseEvent| dispatch_mu.run(|s| s.pointer_up());

	// Leaving the canvas ends the drag exactly like a mouse-up.
	let dispatch_ml = dispatcher.clone();
	let on_mouseleave = move |_: MouseEvent| dispatch_ml.run(|s| s.pointer_up());

	let on_dragover = move |ev: DragEvent| {
		ev.prevent_default();
		if let Some(dt) = ev.data_transfer() {
			dt.set_drop_effect("copy");
		}
	};

	let dispatch_drop = dispatcher.clone();
	let on_drop = move |ev: DragEvent| {
		ev.prevent_default();
		let Some(payload) = ev.data_transfer().and_then(|dt| dt.get_data(PAYLOAD_MIME).ok()) else {
			return;
		};
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let rect = canvas_rect(&canvas);
		let client = Position::new(ev.client_x() as f64, ev.client_y() as f64);
		dispatch_drop.run(|s| s.drop_payload(&payload, client, rect));
	};

	let dispatch_key = dispatcher.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		let in_text_field = ev
			.target()
			.is_some_and(|t| t.is_instance_of::<HtmlInputElement>());
		let Some(shortcut) = Shortcut::from_key(&ev.key(), in_text_field) else {
			return;
		};
		ev.prevent_default();
		dispatch_key.run(|s| s.shortcut(shortcut));
	};

	// Sidebar items and toolbar buttons are built inside reactive closures,
	// which cannot hold the `Rc` directly.
	let dispatcher = StoredValue::new_local(dispatcher);
	let run = move |op: fn(&mut TopologyEditorState) -> Vec<EditorEvent>| {
		dispatcher.with_value(|d| d.run(op));
	};

	let (name, set_name) = signal(String::new());
	let take_name = move || {
		let value = name.get_untracked().trim().to_string();
		set_name.set(String::new());
		value
	};
	let add_network = move |_: MouseEvent| {
		let value = take_name();
		dispatcher.with_value(|d| d.run(|s| s.add_network(&value)));
	};
	let add_external = move |kind: NodeKind| {
		let value = take_name();
		dispatcher.with_value(|d| d.run(|s| s.add_external(kind, &value)));
	};

	let mode_buttons = InteractionMode::ALL
		.into_iter()
		.map(|m| {
			view! {
				<button
					class="topology-mode"
					class:active=move || mode.get() == m
					on:click=move |_| {
						dispatcher.with_value(|d| d.run(|s| {
							s.set_mode(m);
							Vec::new()
						}))
					}
				>
					{m.label()}
				</button>
			}
		})
		.collect_view();

	let sidebar_items = move || {
		inventory
			.get()
			.into_iter()
			.map(|item| {
				let kind = item.kind;
				let payload = serde_json::to_string(&item.payload()).unwrap_or_default();
				let daemon_type = item
					.data
					.get("daemon_type")
					.and_then(|v| v.as_str())
					.map(str::to_string);
				let swatch = format!(
					"background: {};",
					default_node_color(kind, daemon_type.as_deref())
				);
				view! {
					<li
						class="topology-sidebar-item"
						draggable="true"
						on:dragstart=move |ev: DragEvent| {
							if let Some(dt) = ev.data_transfer() {
								let _ = dt.set_data(PAYLOAD_MIME, &payload);
								dt.set_effect_allowed("copy");
							}
							dispatcher.with_value(|d| d.run(|s| {
								s.begin_sidebar_drag(kind);
								Vec::new()
							}));
						}
						on:dragend=move |_: DragEvent| {
							dispatcher.with_value(|d| d.run(|s| {
								s.end_sidebar_drag();
								Vec::new()
							}))
						}
					>
						<span class="topology-swatch" style=swatch></span>
						<span class="topology-kind">{kind.as_str()}</span>
						{item.display_name()}
					</li>
				}
			})
			.collect_view()
	};

	view! {
		<div class="topology-editor" tabindex="0" on:keydown=on_keydown>
			<div class="topology-toolbar">
				{mode_buttons}
				<span class="topology-separator"></span>
				<button on:click=move |_| run(TopologyEditorState::auto_layout)>"Auto layout"</button>
				<button on:click=move |_| run(TopologyEditorState::reset_selected_arc)>"Reset arc"</button>
				<button on:click=move |_| run(TopologyEditorState::delete_selected)>"Delete"</button>
				<button on:click=move |_| run(TopologyEditorState::clear)>"Clear"</button>
				<span class="topology-separator"></span>
				<input
					type="text"
					placeholder="name"
					prop:value=name
					on:input=move |ev| set_name.set(event_target_value(&ev))
				/>
				<button on:click=add_network>"Add network"</button>
				<button on:click=move |_| add_external(NodeKind::ExternalNode)>"Add external node"</button>
				<button on:click=move |_| add_external(NodeKind::ExternalNetwork)>"Add external network"</button>
			</div>
			<Show when=move || notice.get().is_some()>
				<div class="topology-notice" on:click=move |_| notice.set(None)>
					{move || notice.get().unwrap_or_default()}
				</div>
			</Show>
			<div class="topology-body" style="display: flex;">
				<ul class="topology-sidebar">{sidebar_items}</ul>
				<canvas
					node_ref=canvas_ref
					class="topology-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:dragover=on_dragover
					on:drop=on_drop
					style="display: block;"
				/>
			</div>
		</div>
	}
}
