use std::collections::{HashMap, HashSet};

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{info, warn};

use super::backend::GraphControls;
use super::camera::{CameraPersistence, CameraState, Vec3, zoom_to_fit};
use super::frame::{Communities, EdgeView, Emphasis, FrameSnapshot, NodeView, build_frame};
use super::lod::LodManager;
use super::perf::{PerformanceMonitor, PerformanceStats};
use super::seed::seed_positions;
use super::style::accessible_label;
use super::types::{DisplayMode, GraphData, GraphNode};
use super::zoom::{NodeSpheres, ZoomController};
use crate::config::RenderConfig;

/// Node radius in world units.
pub const NODE_RADIUS: f64 = 5.0;
/// Minimum pick radius in screen pixels.
pub const HIT_RADIUS_PX: f64 = 12.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	/// Index into the state's node list.
	pub slot: usize,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub camera_start: CameraState,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
}

/// What a finished frame has to tell the host.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
	/// Fresh stats, once per sampling interval.
	pub stats: Option<PerformanceStats>,
	/// Fps at which performance just crossed into poor.
	pub dropped_to: Option<f64>,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	config: RenderConfig,
	data: GraphData,
	edges: Vec<(usize, usize)>,
	positions: Vec<Vec3>,
	camera: CameraState,
	lod: LodManager,
	monitor: PerformanceMonitor,
	zoom: ZoomController,
	persistence: Option<CameraPersistence>,
	mode: DisplayMode,
	selected: HashSet<String>,
	communities: Option<Communities>,
	last_frame_ms: Option<f64>,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64, config: RenderConfig) -> Self {
		let mut state = Self {
			graph: ForceGraph::new(simulation_parameters(&config)),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			data: GraphData::default(),
			edges: Vec::new(),
			positions: Vec::new(),
			camera: CameraState::default(),
			lod: LodManager::new(config.lod.clone()),
			monitor: PerformanceMonitor::new(config.monitor.clone()),
			zoom: ZoomController::new(config.zoom.clone()),
			persistence: None,
			mode: DisplayMode::Highlight,
			selected: HashSet::new(),
			communities: None,
			last_frame_ms: None,
			config,
		};
		state.set_data(data, DisplayMode::Highlight, HashSet::new());
		state.camera = state.fitted_camera().unwrap_or_default();
		state
	}

	/// Restore the camera from `persistence` and keep saving to it.
	pub fn with_persistence(mut self, mut persistence: CameraPersistence) -> Self {
		if let Some(camera) = persistence.restore() {
			self.camera = camera;
		}
		self.persistence = Some(persistence);
		self
	}

	/// Rebuild the simulation from `data`, keeping the camera.
	///
	/// Input is deduplicated and, in filter mode, cut down to the
	/// selection before any node enters the simulation.
	pub fn set_data(&mut self, data: &GraphData, mode: DisplayMode, selected: HashSet<String>) {
		let (clean, report) = data.sanitized();
		if report.duplicate_nodes > 0 || report.dangling_edges > 0 {
			warn!(
				"graph: dropped {} duplicate nodes and {} dangling edges",
				report.duplicate_nodes, report.dangling_edges
			);
		}
		let visible = clean.visible(mode, &selected);

		let seeds = seed_positions(
			&visible.nodes,
			self.config.layout_seed,
			self.config.layout_spread,
			false,
		);
		let mut graph = ForceGraph::new(simulation_parameters(&self.config));
		let mut index_by_id = HashMap::with_capacity(visible.nodes.len());
		let mut handles = Vec::with_capacity(visible.nodes.len());

		for (slot, (node, seed)) in visible.nodes.iter().zip(&seeds).enumerate() {
			let idx = graph.add_node(NodeData {
				x: seed.x as f32,
				y: seed.y as f32,
				mass: 10.0,
				is_anchor: node.x.is_some() && node.y.is_some(),
				user_data: NodeInfo { slot },
			});
			index_by_id.insert(node.id.as_str(), slot);
			handles.push(idx);
		}

		let mut edges = Vec::with_capacity(visible.edges.len());
		for edge in &visible.edges {
			if let (Some(&src), Some(&tgt)) = (
				index_by_id.get(edge.source.as_str()),
				index_by_id.get(edge.target.as_str()),
			) {
				graph.add_edge(handles[src], handles[tgt], EdgeData::default());
				edges.push((src, tgt));
			}
		}

		info!(
			"graph: {} nodes, {} edges ({:?} mode)",
			visible.nodes.len(),
			edges.len(),
			mode
		);

		self.graph = graph;
		self.edges = edges;
		self.positions = seeds;
		self.data = visible;
		self.mode = mode;
		self.selected = selected;
		self.hover = HoverState::default();
		self.drag = DragState::default();
	}

	pub fn set_selection(&mut self, selected: HashSet<String>) {
		self.selected = selected;
	}

	pub fn set_communities(&mut self, communities: Option<Communities>) {
		self.communities = communities;
	}

	/// Sample performance while the overlay is shown or a host listens for
	/// drops.
	pub fn observe_performance(&mut self, overlay: bool, drop_listener: bool) {
		self.monitor.set_enabled(overlay || drop_listener);
	}

	pub fn config(&self) -> &RenderConfig {
		&self.config
	}

	pub fn node(&self, slot: usize) -> Option<&GraphNode> {
		self.data.nodes.get(slot)
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.data.nodes
	}

	pub fn positions(&self) -> &[Vec3] {
		&self.positions
	}

	/// Screen-reader description of the hovered node.
	pub fn hovered_label(&self) -> Option<String> {
		self.hover.node.and_then(|slot| self.node(slot)).map(accessible_label)
	}

	fn aspect(&self) -> f64 {
		if self.height > 0.0 { self.width / self.height } else { 1.0 }
	}

	/// Pixel position to normalised device coordinates.
	pub fn screen_to_ndc(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			2.0 * sx / self.width.max(1.0) - 1.0,
			1.0 - 2.0 * sy / self.height.max(1.0),
		)
	}

	fn sync_positions(&mut self) {
		let positions = &mut self.positions;
		self.graph.visit_nodes(|node| {
			if let Some(p) = positions.get_mut(node.data.user_data.slot) {
				*p = Vec3::new(f64::from(node.x()), f64::from(node.y()), p.z);
			}
		});
	}

	/// Topmost node whose disc contains the pixel.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		self.positions
			.iter()
			.enumerate()
			.filter_map(|(slot, p)| {
				let projected = self.camera.project(*p, self.width, self.height)?;
				let reach = (NODE_RADIUS * projected.scale).max(HIT_RADIUS_PX);
				let (dx, dy) = (projected.x - sx, projected.y - sy);
				(dx * dx + dy * dy <= reach * reach).then_some((slot, projected.depth))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(slot, _)| slot)
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.neighbors.clear();
		if let Some(idx) = node {
			for &(src, tgt) in &self.edges {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn wheel(&mut self, delta_y: f64, sx: f64, sy: f64) {
		let (nx, ny) = self.screen_to_ndc(sx, sy);
		self.zoom.on_wheel(delta_y, nx, ny);
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.zoom.cancel();
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			camera_start: self.camera,
		};
	}

	/// Move the camera so the point grabbed at pan start follows the pointer.
	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		let start = self.pan.camera_start;
		let half = (super::camera::FOV_Y / 2.0).tan();
		let pixels_per_unit = self.height.max(1.0) / (2.0 * start.distance() * half);
		let basis = start.basis();
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		let by = basis.right * (-dx / pixels_per_unit) + basis.up * (dy / pixels_per_unit);
		self.camera = start.translated(by);
	}

	pub fn begin_drag(&mut self, slot: usize) {
		self.drag = DragState {
			active: true,
			node: Some(slot),
		};
	}

	/// Move the dragged node to the point under the pointer on its own
	/// camera-facing plane, and pin it there.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(slot) = self.drag.node.filter(|_| self.drag.active) else {
			return;
		};
		let Some(&anchor) = self.positions.get(slot) else {
			return;
		};
		let (nx, ny) = self.screen_to_ndc(sx, sy);
		let ray = self.camera.ray_through(nx, ny, self.aspect());
		let normal = self.camera.basis().forward * -1.0;
		let Some(t) = ray.intersect_plane(anchor, normal) else {
			return;
		};
		let target = ray.at(t);
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data.slot == slot {
				node.data.x = target.x as f32;
				node.data.y = target.y as f32;
				node.data.is_anchor = true;
			}
		});
		self.positions[slot] = Vec3::new(target.x, target.y, anchor.z);
	}

	pub fn end_pointer(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
	}

	/// Camera-facing framing of every node.
	fn fitted_camera(&self) -> Option<CameraState> {
		zoom_to_fit(
			&self.camera,
			&self.positions,
			self.config.fit_padding,
			self.config.zoom.min_distance,
			self.config.zoom.max_distance,
		)
	}

	/// Run the per-frame pipeline: sample the camera, update LOD, resolve
	/// styles. Call [`ForceGraphState::end_frame`] once drawing is done.
	pub fn frame(&mut self, now_ms: f64) -> FrameSnapshot {
		self.monitor.frame_start(now_ms);
		if let Some(last) = self.last_frame_ms {
			self.lod.record_frame(now_ms - last, now_ms);
		}
		self.last_frame_ms = Some(now_ms);

		self.sync_positions();
		let aspect = self.aspect();
		let spheres = NodeSpheres {
			centers: &self.positions,
			radius: NODE_RADIUS,
		};
		self.camera = self.zoom.update(now_ms, &self.camera, aspect, &spheres);

		if let Some(persistence) = self.persistence.as_mut() {
			// Only settled poses are queued.
			if !self.zoom.is_animating() {
				persistence.schedule(self.camera, now_ms);
			}
			persistence.poll(now_ms);
		}

		let nodes: Vec<NodeView<'_>> = self
			.data
			.nodes
			.iter()
			.zip(&self.positions)
			.map(|(node, &position)| NodeView { node, position })
			.collect();
		let edges: Vec<EdgeView<'_>> = self
			.data
			.edges
			.iter()
			.zip(&self.edges)
			.map(|(edge, &(source, target))| EdgeView {
				edge,
				source,
				target,
			})
			.collect();
		let emphasis = Emphasis {
			hovered: self.hover.node.map(|n| (n, &self.hover.neighbors)),
			// Filtering already removed everything unselected.
			selected: (self.mode == DisplayMode::Highlight).then_some(&self.selected),
			communities: self.communities.as_ref(),
		};
		build_frame(self.camera, &self.lod, &nodes, &edges, &emphasis)
	}

	/// Close the frame opened by [`ForceGraphState::frame`].
	pub fn end_frame(&mut self, now_ms: f64) -> FrameReport {
		self.monitor.frame_end(now_ms);
		FrameReport {
			stats: self.monitor.sample(now_ms),
			dropped_to: self.monitor.take_drop(),
		}
	}

	pub fn clear_persisted_camera(&mut self) {
		if let Some(persistence) = self.persistence.as_mut() {
			persistence.clear();
		}
	}

	/// Stop all timed work: flush the pending camera write and drop any
	/// animation or samples.
	pub fn teardown(&mut self) {
		if let Some(persistence) = self.persistence.as_mut() {
			persistence.flush();
		}
		self.zoom.cancel();
		self.monitor.set_enabled(false);
		self.lod.reset();
		self.animation_running = false;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

impl GraphControls for ForceGraphState {
	fn camera_position(&self) -> CameraState {
		self.camera
	}

	fn set_camera_position(&mut self, camera: CameraState, animate: bool) {
		if animate {
			let now = self.last_frame_ms.unwrap_or_default();
			self.zoom.animate_to(self.camera, camera, now);
		} else {
			self.zoom.cancel();
			self.camera = camera;
		}
	}

	fn zoom_to_fit(&mut self) {
		self.sync_positions();
		if let Some(camera) = self.fitted_camera() {
			self.set_camera_position(camera, true);
		}
	}

	fn distance_bounds(&self) -> (f64, f64) {
		let zoom = self.zoom.config();
		(zoom.min_distance, zoom.max_distance)
	}
}

fn simulation_parameters(config: &RenderConfig) -> SimulationParameters {
	let sim = &config.simulation;
	SimulationParameters {
		force_charge: sim.force_charge,
		force_spring: sim.force_spring,
		force_max: sim.force_max,
		node_speed: sim.node_speed,
		damping_factor: sim.damping_factor,
	}
}
