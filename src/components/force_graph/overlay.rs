use leptos::prelude::*;

use super::lod::LodLevel;
use super::perf::PerformanceStats;

/// What the performance overlay shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStats {
	pub stats: PerformanceStats,
	pub ceiling: LodLevel,
	pub nodes: usize,
}

impl OverlayStats {
	/// Single-line summary.
	pub fn summary(&self) -> String {
		format!(
			"FPS {:.0} | {:.1} ms | jank {:.0}% | {} | LOD {} | {} nodes",
			self.stats.fps,
			self.stats.avg_frame_time,
			self.stats.jank_score,
			self.stats.level.as_str(),
			self.ceiling.as_str(),
			self.nodes
		)
	}
}

#[component]
pub fn PerformanceOverlay(#[prop(into)] stats: Signal<Option<OverlayStats>>) -> impl IntoView {
	view! {
		<Show when=move || stats.get().is_some()>
			<div
				class="graph-perf-overlay"
				data-level=move || stats.get().map(|s| s.stats.level.as_str()).unwrap_or_default()
			>
				{move || stats.get().map(|s| s.summary()).unwrap_or_default()}
			</div>
		</Show>
	}
}
