use leptos::prelude::*;

use crate::components::schema_diagram::SchemaDiagramCanvas;
use crate::schema::geometry::EdgeStyle;
use crate::schema::layout::LayoutExtent;
use crate::schema::path_state::path_color;
use crate::schema::{DiagramConfig, DiagramSession, Graph, NodeId, PathState, SearchMode, SearchOutcome, SourceRegistry};

/// Coverage files shipped with the app: `(dataset, contents)`.
const BUNDLED_COVERAGE: &[(&str, &str)] = &[
	("wikipathways", include_str!("../../data/wikipathways.csv")),
	("aopwiki", include_str!("../../data/aopwiki.tsv")),
	("chembl", include_str!("../../data/chembl.csv")),
];
const BUNDLED_SOURCES: &str = include_str!("../../data/sources.json");

fn bundled_session() -> DiagramSession {
	let sources = SourceRegistry::from_json(BUNDLED_SOURCES).unwrap_or_else(|e| {
		log::error!("Ignoring bundled source registry: {e}");
		SourceRegistry::new()
	});
	let mut session = DiagramSession::new(DiagramConfig::default(), sources);
	for (dataset, text) in BUNDLED_COVERAGE {
		if let Err(e) = session.add_coverage(dataset, text) {
			log::error!("Skipping coverage for {dataset}: {e}");
		}
	}
	session
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let session = StoredValue::new(bundled_session());
	let all_datasets: Vec<String> = session.with_value(|s| s.datasets().map(str::to_string).collect());
	let node_width = session.with_value(|s| s.config().layout.node_width);

	let active = RwSignal::new(all_datasets.iter().take(2).cloned().collect::<Vec<_>>());
	let graph = RwSignal::new(Graph::default());
	let extent = RwSignal::new(LayoutExtent::default());
	let paths = RwSignal::new(PathState::new());
	let query = RwSignal::new(String::new());
	let jsonld = RwSignal::new(String::new());
	let bubbles = RwSignal::new(String::new());
	let status = RwSignal::new(String::new());
	let pending: RwSignal<Option<NodeId>> = RwSignal::new(None);

	let mode = RwSignal::new(SearchMode::Shortest);
	let edge_style = RwSignal::new(EdgeStyle::Orthogonal);
	let relax = RwSignal::new(false);
	let require_type = RwSignal::new(false);
	let include_labels = RwSignal::new(false);
	let show_jsonld = RwSignal::new(false);

	let publish_paths = move || {
		session.with_value(|s| {
			let compiled = s.compile_query();
			jsonld.set(serde_json::to_string_pretty(&compiled.to_jsonld()).unwrap_or_default());
			query.set(compiled.text);
			bubbles.set(s.bubbles());
			paths.set(s.path_state().clone());
		});
	};

	Effect::new(move |_| {
		let selected = active.get();
		session.update_value(|s| {
			let selection = s.select_datasets(&selected).clone();
			status.set(if s.graph().is_empty() {
				"No classes to show. Select at least one dataset.".to_string()
			} else if selection.is_partial() {
				format!(
					"Showing {}. Not connected to it: {}.",
					selection.shown.join(", "),
					selection.excluded.join(", ")
				)
			} else {
				"Click a class to start a path.".to_string()
			});
			graph.set(s.graph().clone());
			extent.set(s.extent());
		});
		pending.set(None);
		publish_paths();
	});

	Effect::new(move |_| {
		let (m, style, types, labels) = (
			mode.get(),
			edge_style.get(),
			require_type.get(),
			include_labels.get(),
		);
		session.update_value(|s| {
			let mut config = s.config().clone();
			config.search.mode = m;
			config.edge_style = style;
			config.query.require_type = types;
			config.query.include_labels = labels;
			s.set_config(config);
		});
		publish_paths();
	});

	let on_node_click = Callback::new(move |id: NodeId| {
		let label = session.with_value(|s| s.graph().label(&id));
		match pending.get_untracked() {
			None => {
				status.set(format!("From {label}: click a second class."));
				pending.set(Some(id));
			}
			Some(start) if start == id => {
				status.set("Selection cleared.".to_string());
				pending.set(None);
			}
			Some(start) => {
				pending.set(None);
				let outcome = session.try_update_value(|s| s.find_paths(&start, &id));
				let from = session.with_value(|s| s.graph().label(&start));
				status.set(match outcome {
					Some(SearchOutcome::Found { count, .. }) => {
						format!("{count} path(s) from {from} to {label}.")
					}
					_ => format!("No path found between {from} and {label}."),
				});
				publish_paths();
			}
		}
	});

	let clear_paths = move |_| {
		session.update_value(|s| s.clear_paths());
		pending.set(None);
		publish_paths();
	};

	let dataset_toggles = all_datasets
		.iter()
		.map(|ds| {
			let (name, toggle, all) = (ds.clone(), ds.clone(), all_datasets.clone());
			view! {
				<label class="dataset-toggle">
					<input
						type="checkbox"
						prop:checked=move || active.get().contains(&name)
						on:change=move |ev| {
							let on = event_target_checked(&ev);
							active.update(|a| {
								*a = all
									.iter()
									.filter(|d| if **d == toggle { on } else { a.contains(d) })
									.cloned()
									.collect();
							});
						}
					/>
					{ds.clone()}
				</label>
			}
		})
		.collect_view();

	let path_list = move || {
		paths
			.get()
			.paths()
			.iter()
			.enumerate()
			.map(|(i, p)| {
				let swatch = format!("background: {}", path_color(p.color_index));
				let name = format!(
					"Path {}/{}: {} → {}",
					p.path_number, p.total_paths, p.from_label, p.to_label
				);
				view! {
					<li>
						<span class="swatch" style=swatch></span>
						{name}
						<button on:click=move |_| {
							session.update_value(|s| {
								s.remove_path(i);
							});
							publish_paths();
						}>"×"</button>
					</li>
				}
			})
			.collect_view()
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="diagram-page">
				<aside class="controls">
					<h1>"Schema Coverage"</h1>
					<fieldset>
						<legend>"Datasets"</legend>
						{dataset_toggles}
					</fieldset>
					<fieldset>
						<legend>"Paths"</legend>
						<select on:change=move |ev| {
							mode.set(if event_target_value(&ev) == "all" { SearchMode::All } else { SearchMode::Shortest });
						}>
							<option value="shortest">"Shortest path"</option>
							<option value="all">"All paths"</option>
						</select>
						<button on:click=clear_paths>"Clear paths"</button>
						<ul class="path-list">{path_list}</ul>
					</fieldset>
					<fieldset>
						<legend>"Display"</legend>
						<select on:change=move |ev| {
							edge_style.set(if event_target_value(&ev) == "curved" { EdgeStyle::Curved } else { EdgeStyle::Orthogonal });
						}>
							<option value="orthogonal">"Orthogonal edges"</option>
							<option value="curved">"Curved edges"</option>
						</select>
						<label>
							<input type="checkbox" on:change=move |ev| relax.set(event_target_checked(&ev)) />
							"Relax layout"
						</label>
					</fieldset>
					<fieldset>
						<legend>"Query"</legend>
						<label>
							<input type="checkbox" on:change=move |ev| require_type.set(event_target_checked(&ev)) />
							"Require class types"
						</label>
						<label>
							<input type="checkbox" on:change=move |ev| include_labels.set(event_target_checked(&ev)) />
							"Optional labels"
						</label>
						<label>
							<input type="checkbox" on:change=move |ev| show_jsonld.set(event_target_checked(&ev)) />
							"Show JSON-LD"
						</label>
					</fieldset>
				</aside>

				<main class="diagram">
					<p class="status">{move || status.get()}</p>
					<div class="canvas-host">
						<SchemaDiagramCanvas
							graph=graph
							extent=extent
							paths=paths
							edge_style=edge_style
							relax=relax
							on_node_click=on_node_click
							node_width=node_width
						/>
					</div>
					<pre class="bubbles">{move || bubbles.get()}</pre>
					<pre class="query">{move || if show_jsonld.get() { jsonld.get() } else { query.get() }}</pre>
				</main>
			</div>
		</ErrorBoundary>
	}
}
