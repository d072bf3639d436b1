use leptos::ev::{MouseEvent, SubmitEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, warn};

use crate::components::lineage_graph::api::{self, RelatedClergy, Relationships};
use crate::components::lineage_graph::{
	FilterCriteria, GraphError, LineageGraphCanvas, Node, NodeId,
};

fn clergy_name(clergy: Option<&RelatedClergy>) -> String {
	clergy
		.map(|c| c.name.clone())
		.unwrap_or_else(|| "Unknown".to_string())
}

fn clergy_list(
	title: &'static str,
	clergy: Vec<RelatedClergy>,
	selected: RwSignal<Option<NodeId>>,
) -> impl IntoView {
	view! {
		<h3>{title}</h3>
		<ul>
			{clergy
				.into_iter()
				.map(|c| {
					let id = c.id;
					let rank = c.rank.map(|r| format!(", {r}")).unwrap_or_default();
					let date = c.date.map(|d| format!(" ({d})")).unwrap_or_default();
					view! {
						<li on:click=move |_| selected.set(Some(id))>{c.name}{rank}{date}</li>
					}
				})
				.collect_view()}
		</ul>
	}
}

fn clergy_details(node: Node) -> impl IntoView {
	let line = |label: &'static str, value: Option<String>| {
		value.map(|v| view! { <dt>{label}</dt><dd>{v}</dd> })
	};
	view! {
		<h2>{node.name}</h2>
		<dl>
			{line("Rank", node.rank)}
			{line("Organization", node.organization)}
			{line("Ordained", node.ordination_date)}
			{line("Consecrated", node.consecration_date)}
		</dl>
	}
}

fn relationship_panel(
	node: Node,
	rel: Option<Relationships>,
	selected: RwSignal<Option<NodeId>>,
) -> impl IntoView {
	view! {
		<aside class="relationship-panel">
			{clergy_details(node)}
			{rel.map(|rel| relationship_lists(rel, selected))}
		</aside>
	}
}

fn relationship_lists(rel: Relationships, selected: RwSignal<Option<NodeId>>) -> impl IntoView {
	view! {
		<dl>
			<dt>"Ordained by"</dt>
			<dd>{clergy_name(rel.ordaining_bishop.as_ref())}</dd>
			<dt>"Consecrated by"</dt>
			<dd>{clergy_name(rel.consecrator.as_ref())}</dd>
		</dl>
		{clergy_list("Ordained", rel.ordained_clergy, selected)}
		{clergy_list("Consecrated", rel.consecrated_clergy, selected)}
	}
}

/// Lineage page: the graph, its filter controls and the selected person's relationships.
#[component]
pub fn Home() -> impl IntoView {
	let config = api::read_injected_config();
	let spacing = config.parallel_link_spacing;
	let (initial, initial_error) = match api::read_injected_data(spacing) {
		Ok(graph) => (Some(graph), None),
		Err(e) => {
			error!("cannot render lineage graph: {e}");
			(None, Some(e))
		}
	};

	let data = RwSignal::new(initial);
	let load_error: RwSignal<Option<GraphError>> = RwSignal::new(initial_error);
	let hide_priests = RwSignal::new(false);
	let backbone_only = RwSignal::new(false);
	let criteria = Signal::derive(move || FilterCriteria {
		hide_priests: hide_priests.get(),
		backbone_only: backbone_only.get(),
	});
	let selected = RwSignal::new(None::<NodeId>);
	let focus = RwSignal::new(None::<NodeId>);
	let loading = RwSignal::new(load_error.with_untracked(Option::is_none));
	let query = RwSignal::new(String::new());
	let relationships = RwSignal::new(None::<Relationships>);

	Effect::new(move |_| {
		let Some(id) = selected.get() else {
			relationships.set(None);
			return;
		};
		spawn_local(async move {
			match api::fetch_relationships(id).await {
				Ok(rel) => relationships.set(Some(rel)),
				Err(e) => {
					warn!("relationships for {id} unavailable: {e}");
					relationships.set(None);
				}
			}
		});
	});

	let refresh = move |_: MouseEvent| {
		spawn_local(async move {
			match api::fetch_lineage_data(spacing).await {
				Ok(graph) => {
					load_error.set(None);
					data.set(Some(graph));
				}
				Err(e) => {
					error!("refresh failed: {e}");
					loading.set(false);
					load_error.set(Some(e));
				}
			}
		});
	};

	let on_search = move |ev: SubmitEvent| {
		ev.prevent_default();
		let hit = data.with(|g| {
			g.as_ref()
				.and_then(|g| g.search_nodes(&query.get_untracked()).first().copied())
		});
		match hit {
			Some(id) => {
				focus.set(Some(id));
				selected.set(Some(id));
			}
			None => warn!("no clergy matches {:?}", query.get_untracked()),
		}
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

			<div class="fullscreen-graph">
				<LineageGraphCanvas
					data=data
					criteria=criteria
					focus=focus
					selected=selected
					loading=loading
					config=config
					fullscreen=true
				/>
				<Show when=move || load_error.with(Option::is_some)>
					<p class="graph-error">
						{move || load_error.get().map(|e| e.user_message()).unwrap_or_default()}
					</p>
				</Show>
				<Show when=move || loading.get()>
					<div class="graph-loading">"Arranging lineage..."</div>
				</Show>
				<div class="graph-overlay">
					<h1>"Apostolic Lineage"</h1>
					<p class="subtitle">"Click a bishop or priest to trace their lineage. Drag to reposition, scroll to zoom."</p>
					<label>
						<input
							type="checkbox"
							prop:checked=hide_priests
							on:change=move |ev| hide_priests.set(event_target_checked(&ev))
						/>
						"Hide priests"
					</label>
					<label>
						<input
							type="checkbox"
							prop:checked=backbone_only
							on:change=move |ev| backbone_only.set(event_target_checked(&ev))
						/>
						"Backbone only"
					</label>
					<form on:submit=on_search>
						<input
							type="search"
							placeholder="Search clergy"
							prop:value=query
							on:input=move |ev| query.set(event_target_value(&ev))
						/>
					</form>
					<button on:click=refresh>"Refresh"</button>
				</div>
				{move || {
					selected
						.get()
						.and_then(|id| data.with(|g| g.as_ref().and_then(|g| g.node(id).cloned())))
						.map(|node| relationship_panel(node, relationships.get(), selected))
				}}
			</div>
		</ErrorBoundary>
	}
}
