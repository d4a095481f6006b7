//! Mount and unmount side effects.

use crate::{
	props::release_props,
	renderer::Root,
	scheduler::Phase,
	surface::Surface,
	tree::{ComponentNode, HostNode, NodeId, NodeKind},
};
use tracing::{instrument, trace, trace_span};

impl<S: Surface> Root<S> {
	/// Runs pending effects in `id`'s subtree, children first, and marks fresh components as mounted.
	///
	/// Returns how many effects ran.
	pub(crate) fn run_effects_in(&mut self, id: NodeId) -> usize {
		let children = self.tree.children(id).to_vec();
		let mut ran: usize = children.into_iter().map(|child| self.run_effects_in(child)).sum();

		if let Some(NodeKind::Component(ComponentNode { hooks, lifecycle, .. })) = self.tree.kind_mut(id) {
			if hooks.has_pending_effects() {
				let span = trace_span!("Running effects", component = lifecycle.name());
				let _enter = span.enter();
				ran += hooks.run_pending_effects();
			}
			if lifecycle.phase() == Phase::Mounting {
				lifecycle.set_phase(Phase::Mounted);
			}
		}
		ran
	}

	/// Unmounts `id`'s subtree: cleanups run depth-first, then its surface nodes are detached and the nodes freed.
	///
	/// `id` must already be removed from (or about to be overwritten in) its parent's children.
	#[instrument(skip(self))]
	pub(crate) fn unmount_node(&mut self, id: NodeId) {
		let cleaned = self.run_unmount_side_effects(id);

		let mut top = Vec::new();
		self.tree.top_surface_nodes(id, &mut top);
		for node in &top {
			self.surface.remove(node);
		}

		let freed = self.tree.free_subtree(id);
		trace!(cleaned, detached = top.len(), freed, "Unmounted.");
	}

	fn run_unmount_side_effects(&mut self, id: NodeId) -> usize {
		if let Some(NodeKind::Component(ComponentNode { lifecycle, .. })) = self.tree.kind_mut(id) {
			lifecycle.set_phase(Phase::Unmounting);
		}

		let children = self.tree.children(id).to_vec();
		let mut cleaned: usize = children.into_iter().map(|child| self.run_unmount_side_effects(child)).sum();

		match self.tree.kind_mut(id) {
			Some(NodeKind::Component(ComponentNode { hooks, lifecycle, .. })) => {
				cleaned += hooks.teardown();
				lifecycle.set_phase(Phase::Unmounted);
			}
			Some(NodeKind::Host(HostNode { props, surface: Some(element), .. })) => release_props(&mut self.surface, element, props),
			Some(NodeKind::Null | NodeKind::Text { .. } | NodeKind::Fragment { .. } | NodeKind::Host(_)) | None => (),
		}
		cleaned
	}
}
