//! Leptos component wrapping the graph view canvas.
//!
//! The component creates an HTML canvas element plus a small control bar and
//! routes every input to the [`RenderCoordinator`]. An animation loop runs via
//! `requestAnimationFrame`, stepping a force layout and redrawing each frame.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::annotations::Status;
use super::coordinator::{ClickOutcome, RenderCoordinator};
use super::geometry::Point;
use super::render;
use super::scale::{ScaleConfig, ScaledValues};
use super::settings::{Control, ViewSettings};
use super::storage::{BrowserStorage, GraphStorage};
use super::theme::Theme;
use super::tree_layout::Orientation;
use super::types::{GraphDocument, LayoutMode, NodeKind};
use super::view::{DragGesture, PanGesture};

/// Pointer travel, in pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;

/// Bundles the coordinator with visual configuration and gesture tracking.
struct ViewContext {
	coordinator: RenderCoordinator,
	storage: BrowserStorage,
	scale: ScaleConfig,
	theme: Theme,
	pan: PanGesture,
	drag: DragGesture,
	width: f64,
	height: f64,
}

type SharedContext = Rc<RefCell<Option<ViewContext>>>;

fn with_context(context: &SharedContext, f: impl FnOnce(&mut ViewContext)) {
	if let Some(ref mut c) = *context.borrow_mut() {
		f(c);
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Writes the fold state after a collapse change. Failures are logged by the
/// coordinator and otherwise ignored.
fn persist_folds(c: &mut ViewContext) {
	let _ = c.coordinator.save_view_state(&mut c.storage);
}

/// Applies edited control values and stores them for the active layout.
fn commit_settings(
	c: &mut ViewContext,
	settings: ViewSettings,
	shown: RwSignal<ViewSettings>,
	message: RwSignal<String>,
) {
	if let Err(e) = settings.save(c.coordinator.mode()) {
		message.set(format!("Settings not saved: {e}"));
	}
	shown.set(settings.clone());
	c.coordinator.set_settings(settings);
}

fn parse_mode(value: &str) -> Option<LayoutMode> {
	LayoutMode::ALL.into_iter().find(|m| m.as_str() == value)
}

fn parse_kind(value: &str) -> Option<NodeKind> {
	NodeKind::USER_KINDS.into_iter().find(|k| k.as_str() == value)
}

/// Renders the integration graph on a canvas element.
///
/// `document` seeds the view when the browser has no saved graph yet. The
/// component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and follow window resizes.
#[component]
pub fn GraphViewCanvas(
	#[prop(into)] document: Signal<GraphDocument>,
	#[prop(default = LayoutMode::CollapsibleTree)] mode: LayoutMode,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = Theme::default())] theme: Theme,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	let message = RwSignal::new(String::new());
	let selected_label = RwSignal::new(String::new());
	let node_name = RwSignal::new(String::new());
	let node_kind = RwSignal::new(NodeKind::Channel);
	let comment_text = RwSignal::new(String::new());
	let current_mode = RwSignal::new(mode);
	let settings_view = RwSignal::new(ViewSettings::load(mode));

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
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

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("channel-graph: canvas 2d context unavailable");
			return;
		};

		let storage = BrowserStorage::default();
		let mut coordinator = RenderCoordinator::new(mode, ViewSettings::load(mode), w, h);
		let saved = matches!(storage.load(), Ok(Some(_)));
		if !saved {
			coordinator.load(&document.get_untracked());
		}
		// Saved annotations apply on top of the page graph as well.
		let _ = coordinator.load_from(&storage);
		info!(
			"channel-graph: {} view ready ({} source)",
			mode.label(),
			if saved { "saved" } else { "page" }
		);

		*context_init.borrow_mut() = Some(ViewContext {
			coordinator,
			storage,
			scale: ScaleConfig::default(),
			theme: theme.clone(),
			pan: PanGesture::default(),
			drag: DragGesture::default(),
			width: w,
			height: h,
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				with_context(&context_resize, |c| {
					c.width = nw;
					c.height = nh;
					c.coordinator.resize(nw, nh);
				});
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			with_context(&context_anim, |c| {
				c.coordinator.tick();
				let scene = c.coordinator.scene();
				render::render(&scene, &ctx, c.width, c.height, &c.scale, &c.theme);
			});
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		with_context(&context_md, |c| {
			let t = c.coordinator.view().transform();
			let scale = ScaledValues::new(&c.scale, t.k, c.coordinator.settings().node_size);
			let world = c.coordinator.screen_to_world(p);
			match c.coordinator.node_at(world, scale.hit_radius) {
				Some(node) => {
					c.drag = DragGesture {
						node: Some(node.id.clone()),
						moved: false,
						start: p,
					};
				}
				None => {
					c.pan = PanGesture {
						active: true,
						start: p,
						transform_start: Point::new(t.x, t.y),
					};
				}
			}
		});
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		with_context(&context_mm, |c| {
			if let Some(id) = c.drag.node.clone() {
				if p.distance(c.drag.start) > CLICK_SLOP {
					c.drag.moved = true;
				}
				if c.drag.moved {
					let world = c.coordinator.screen_to_world(p);
					c.coordinator.drag_to(&id, world);
				}
			} else if c.pan.active {
				let mut t = c.coordinator.view().transform();
				t.x = c.pan.transform_start.x + (p.x - c.pan.start.x);
				t.y = c.pan.transform_start.y + (p.y - c.pan.start.y);
				c.coordinator.set_transform(t);
			}
		});
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let p = canvas_point(canvas_ref, &ev);
		with_context(&context_mu, |c| {
			if let Some(id) = c.drag.node.take() {
				if c.drag.moved {
					c.coordinator.drag_end(&id);
				} else {
					match c.coordinator.click_node(&id) {
						Ok(ClickOutcome::Toggled(_)) => persist_folds(c),
						Ok(ClickOutcome::Linked { source, target }) => {
							message.set(format!("Linked {source} -> {target}"));
						}
						Ok(ClickOutcome::Selected(id)) => {
							let comment = c.coordinator.annotations().comment(&id).unwrap_or_default();
							comment_text.set(comment.to_string());
							selected_label.set(id);
						}
						Ok(_) => {}
						Err(e) => message.set(e.to_string()),
					}
					if c.coordinator.selected().is_none() {
						selected_label.set(String::new());
					}
				}
			} else if c.pan.active {
				let still = p.is_some_and(|p| p.distance(c.pan.start) <= CLICK_SLOP);
				if still {
					c.coordinator.click_background();
					selected_label.set(String::new());
				}
			}
			c.drag.moved = false;
			c.pan.active = false;
		});
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_context(&context_ml, |c| {
			if let Some(id) = c.drag.node.take() {
				c.coordinator.drag_end(&id);
			}
			c.drag.moved = false;
			c.pan.active = false;
		});
	};

	let context_cm = context.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(p) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		with_context(&context_cm, |c| {
			let k = c.coordinator.view().transform().k;
			let scale = ScaledValues::new(&c.scale, k, c.coordinator.settings().node_size);
			let world = c.coordinator.screen_to_world(p);
			let Some(id) = c.coordinator.node_at(world, scale.hit_radius).map(|n| n.id.clone()) else {
				return;
			};
			if c.coordinator.select(&id) {
				let comment = c.coordinator.annotations().comment(&id).unwrap_or_default();
				comment_text.set(comment.to_string());
				selected_label.set(id);
			}
		});
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		with_context(&context_wh, |c| c.coordinator.zoom_at(p, ev.delta_y()));
	};

	let action = {
		let context = context.clone();
		move |f: fn(&mut ViewContext)| {
			let context = context.clone();
			move |_: MouseEvent| with_context(&context, f)
		}
	};

	let context_mode = context.clone();
	let on_mode = move |ev: leptos::ev::Event| {
		let Some(next) = parse_mode(&event_target_value(&ev)) else {
			return;
		};
		with_context(&context_mode, |c| {
			let settings = ViewSettings::load(next);
			settings_view.set(settings.clone());
			current_mode.set(next);
			c.coordinator.set_mode(next, settings);
			selected_label.set(String::new());
		});
	};

	let on_control = {
		let context = context.clone();
		move |control: Control| {
			let context = context.clone();
			move |ev: leptos::ev::Event| {
				let Ok(value) = event_target_value(&ev).trim().parse::<f64>() else {
					message.set(format!("{} must be a number", control.label()));
					return;
				};
				with_context(&context, |c| {
					let mut settings = c.coordinator.settings().clone();
					if settings.set(control, value) {
						commit_settings(c, settings, settings_view, message);
					} else {
						message.set(format!("{} out of range", control.label()));
					}
				});
			}
		}
	};

	let context_orientation = context.clone();
	let on_orientation = move |ev: leptos::ev::Event| {
		let Some(orientation) = Orientation::parse(&event_target_value(&ev)) else {
			return;
		};
		with_context(&context_orientation, |c| {
			let mut settings = c.coordinator.settings().clone();
			settings.orientation = orientation;
			commit_settings(c, settings, settings_view, message);
		});
	};

	let context_add = context.clone();
	let on_add = move |_| {
		with_context(&context_add, |c| {
			let parent = c.coordinator.selected().map(str::to_string);
			match c
				.coordinator
				.add_node(node_kind.get_untracked(), &node_name.get_untracked(), parent.as_deref())
			{
				Ok(id) => {
					message.set(format!("Added {id}"));
					node_name.set(String::new());
				}
				Err(e) => message.set(e.to_string()),
			}
		});
	};

	let context_comment = context.clone();
	let on_comment = move |_| {
		let id = selected_label.get_untracked();
		if id.is_empty() {
			message.set("Select a node first".to_string());
			return;
		}
		with_context(&context_comment, |c| {
			c.coordinator.set_comment(&id, &comment_text.get_untracked());
		});
	};

	let context_status = context.clone();
	let on_status = move |ev: leptos::ev::Event| {
		let id = selected_label.get_untracked();
		let status = Status::from_code(&event_target_value(&ev));
		with_context(&context_status, |c| {
			if !c.coordinator.set_status(&id, status) {
				message.set("Status applies to destinations only".to_string());
			}
		});
	};

	let context_save = context.clone();
	let on_save = move |_| {
		with_context(&context_save, |c| {
			let mode = c.coordinator.mode();
			let mut settings = c.coordinator.settings().clone();
			settings.zoom = c.coordinator.view().transform().k;
			let result = c
				.coordinator
				.save(&mut c.storage)
				.and_then(|()| settings.save(mode));
			match result {
				Ok(()) => message.set("Saved".to_string()),
				Err(e) => message.set(format!("Save failed: {e}")),
			}
		});
	};

	let context_reset = context.clone();
	let on_reset = move |_| {
		with_context(&context_reset, |c| {
			match c.coordinator.reset_storage(&mut c.storage) {
				Ok(()) => message.set("Graph reset".to_string()),
				Err(e) => message.set(format!("Reset failed: {e}")),
			}
			selected_label.set(String::new());
		});
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-view-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:contextmenu=on_contextmenu
			style="display: block; cursor: grab;"
		/>
		<div class="graph-controls">
			<select on:change=on_mode>
				{LayoutMode::ALL
					.into_iter()
					.map(|m| view! { <option value=m.as_str() selected={m == mode}>{m.label()}</option> })
					.collect_view()}
			</select>
			<button on:click={action(|c| c.coordinator.zoom_in())}>"+"</button>
			<button on:click={action(|c| c.coordinator.zoom_out())}>"-"</button>
			<button on:click={action(|c| c.coordinator.center())}>"Center"</button>
			<button on:click={action(|c| c.coordinator.fit_to_screen())}>"Fit"</button>
			<button on:click={action(|c| {
				c.coordinator.expand_all();
				persist_folds(c);
			})}>"Expand all"</button>
			<button on:click={action(|c| {
				c.coordinator.collapse_all();
				persist_folds(c);
			})}>"Collapse all"</button>
			<label style:display=move || if current_mode.get().is_tree() { "inline" } else { "none" }>
				"Orientation"
				<select on:change=on_orientation>
					{Orientation::ALL
						.into_iter()
						.map(|o| {
							view! {
								<option
									value=o.as_str()
									prop:selected=move || settings_view.get().orientation == o
								>
									{o.label()}
								</option>
							}
						})
						.collect_view()}
				</select>
			</label>
			{Control::ALL
				.into_iter()
				.map(|control| {
					view! {
						<label
							class="control"
							style:display=move || {
								if control.applies_to(current_mode.get()) { "inline" } else { "none" }
							}
						>
							{control.label()}
							<input
								type="number"
								step=control.step().to_string()
								prop:value=move || settings_view.get().value(control).to_string()
								on:change=on_control(control)
							/>
						</label>
					}
				})
				.collect_view()}
			<select on:change=move |ev| {
				if let Some(kind) = parse_kind(&event_target_value(&ev)) {
					node_kind.set(kind);
				}
			}>
				{NodeKind::USER_KINDS
					.into_iter()
					.map(|k| view! { <option value=k.as_str()>{k.as_str()}</option> })
					.collect_view()}
			</select>
			<input
				type="text"
				placeholder="Node name"
				prop:value=move || node_name.get()
				on:input=move |ev| node_name.set(event_target_value(&ev))
			/>
			<button on:click=on_add>"Add node"</button>
			<span class="selected">{move || selected_label.get()}</span>
			<input
				type="text"
				placeholder="Comment"
				prop:value=move || comment_text.get()
				on:input=move |ev| comment_text.set(event_target_value(&ev))
			/>
			<button on:click=on_comment>"Comment"</button>
			<select on:change=on_status>
				<option value="">"No status"</option>
				{Status::ALL
					.into_iter()
					.map(|s| view! { <option value=s.code()>{s.label()}</option> })
					.collect_view()}
			</select>
			<button on:click=on_save>"Save"</button>
			<button on:click=on_reset>"Reset"</button>
			<span class="message">{move || message.get()}</span>
		</div>
	}
}
