use leptos::prelude::*;
use leptos_router::components::A;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found" role="alert">
			<h1>"404"</h1>
			<p>"This page does not exist."</p>
			<A href="/">"Back to graph"</A>
		</div>
	}
}
