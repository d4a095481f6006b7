use crate::{
	descriptor::{Descriptor, Element, ElementType},
	error::Error,
	scheduler::{Phase, Scheduler},
	surface::Surface,
	tree::{NodeId, Parent, Tree},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{info, instrument, trace, warn};

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
	/// How deeply nested the live tree may become before a build or patch is aborted with [`Error::DepthLimit`].
	pub depth_limit: usize,
	/// How many component re-renders a single [`Root::flush`] may perform before giving up with [`Error::UpdateLimit`].
	pub max_passes_per_flush: usize,
	/// Whether to report hook call-order drift between invocations of the same component instance.
	pub hook_diagnostics: bool,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			depth_limit: 1024,
			max_passes_per_flush: 1000,
			hook_diagnostics: cfg!(debug_assertions),
		}
	}
}

/// A mounted component tree bound to a container node on a [`Surface`].
///
/// # Correct Use
///
/// State setters only schedule work. Call [`Root::flush`] at each turn boundary
/// (see [`Root::set_waker`]) to apply it.
pub struct Root<S: Surface> {
	pub(crate) tree: Tree<S::Node>,
	pub(crate) surface: S,
	pub(crate) container: S::Node,
	pub(crate) scheduler: Rc<Scheduler>,
	pub(crate) options: RenderOptions,
	pub(crate) child: Option<NodeId>,
}

impl<S: Surface> Debug for Root<S>
where
	S: Debug,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Root")
			.field("surface", &self.surface)
			.field("container", &self.container)
			.field("nodes", &self.tree.len())
			.field("pending", &self.scheduler.len())
			.field("options", &self.options)
			.finish()
	}
}

impl<S: Surface> Root<S> {
	fn new(surface: S, container: S::Node, options: RenderOptions) -> Self {
		Self {
			tree: Tree::new(),
			surface,
			container,
			scheduler: Rc::new(Scheduler::new()),
			options,
			child: None,
		}
	}

	/// Builds `descriptor` and appends it to `container`.
	///
	/// Mount effects don't run yet. Call [`Root::run_mount_side_effects`] once the surface is ready for them.
	///
	/// # Errors
	///
	/// Iff `descriptor` isn't a component element, or the tree it produces is malformed.
	pub fn mount(surface: S, container: S::Node, descriptor: Descriptor) -> Result<Self, Error> {
		Self::mount_with_options(surface, container, descriptor, RenderOptions::default())
	}

	/// # Errors
	///
	/// See [`Root::mount`].
	#[instrument(skip(surface, descriptor))]
	pub fn mount_with_options(surface: S, container: S::Node, descriptor: Descriptor, options: RenderOptions) -> Result<Self, Error> {
		let mut root = Self::new(surface, container, options);
		let child = root.build_root(descriptor, true)?;
		let container = root.container.clone();
		root.commit(child, &container, None);
		root.surface.finish_pass();
		info!(nodes = root.tree.len(), "Mounted.");
		Ok(root)
	}

	/// Builds `descriptor` and binds it positionally to the pre-rendered content of `container`.
	///
	/// # Errors
	///
	/// Like [`Root::mount`], and also iff the existing surface nodes don't line up with the built tree.
	pub fn hydrate(surface: S, container: S::Node, descriptor: Descriptor) -> Result<Self, Error> {
		Self::hydrate_with_options(surface, container, descriptor, RenderOptions::default())
	}

	/// # Errors
	///
	/// See [`Root::hydrate`].
	#[instrument(skip(surface, descriptor))]
	pub fn hydrate_with_options(surface: S, container: S::Node, descriptor: Descriptor, options: RenderOptions) -> Result<Self, Error> {
		let mut root = Self::new(surface, container, options);
		let child = root.build_root(descriptor, false)?;
		let first = root.surface.first_child(&root.container);
		root.bind_node(child, first)?;
		root.surface.finish_pass();
		info!(nodes = root.tree.len(), "Hydrated.");
		Ok(root)
	}

	fn build_root(&mut self, descriptor: Descriptor, attach: bool) -> Result<NodeId, Error> {
		if !matches!(descriptor, Descriptor::Element(Element { ty: ElementType::Component(_), .. })) {
			return Err(Error::RootNotComponent);
		}
		let child = self.build_node(descriptor, Parent::Root, attach, self.options.depth_limit)?;
		self.child = Some(child);
		Ok(child)
	}

	/// Runs the effects that were registered while mounting (or hydrating).
	///
	/// Returns how many effects ran.
	#[instrument(skip(self))]
	pub fn run_mount_side_effects(&mut self) -> usize {
		match self.child {
			Some(child) => self.run_effects_in(child),
			None => 0,
		}
	}

	/// Re-renders every component scheduled by a state setter, then runs the effects that became due.
	///
	/// Returns the number of component re-renders.
	///
	/// # Errors
	///
	/// Iff a patch hits a structural error, or more than [`RenderOptions::max_passes_per_flush`] re-renders are needed.
	/// Remaining scheduled work stays queued in the latter case.
	#[instrument(skip(self))]
	pub fn flush(&mut self) -> Result<usize, Error> {
		let mut passes = 0;
		let mut effects = 0;
		// Ancestors first, so a descendant they re-render arrives clean and is skipped.
		while let Some((id, lifecycle)) = self.scheduler.pop_min_by_key(|id| self.tree.depth(id)) {
			if !self.tree.contains(id) || matches!(lifecycle.phase(), Phase::Unmounting | Phase::Unmounted) {
				trace!(component = lifecycle.name(), "Skipping unmounted component.");
				continue;
			}
			if !lifecycle.is_dirty() {
				trace!(component = lifecycle.name(), "Already re-rendered by an ancestor.");
				continue;
			}

			if passes == self.options.max_passes_per_flush {
				self.scheduler.requeue(id, lifecycle);
				return Err(Error::UpdateLimit { limit: self.options.max_passes_per_flush });
			}
			passes += 1;

			let depth_limit = self.depth_limit_at(id);
			let rendered = self.render_component(id);
			self.reconcile_children(id, rendered, depth_limit)?;
			effects += self.run_effects_in(id);
		}

		if passes > 0 {
			self.surface.finish_pass();
			info!(passes, effects, nodes = self.tree.len(), "Flushed.");
		}
		Ok(passes)
	}

	/// The recursion budget left for `id`'s children.
	fn depth_limit_at(&self, id: NodeId) -> usize {
		self.options.depth_limit.saturating_sub(self.tree.depth(id) + 1)
	}

	/// Whether [`Root::flush`] has work to do.
	#[must_use]
	pub fn has_pending_renders(&self) -> bool {
		self.scheduler.len() > 0
	}

	/// Sets a callback that is invoked whenever a state setter schedules the first pending re-render.
	///
	/// The callback must not call [`Root::flush`] synchronously; it's meant to arrange for a flush at the next turn boundary.
	pub fn set_waker(&mut self, waker: impl Fn() + 'static) {
		self.scheduler.set_waker(Some(Rc::new(waker)));
	}

	pub fn clear_waker(&mut self) {
		self.scheduler.set_waker(None);
	}

	#[must_use]
	pub fn options(&self) -> &RenderOptions {
		&self.options
	}

	#[must_use]
	pub fn surface(&self) -> &S {
		&self.surface
	}

	/// Direct access to the surface.
	///
	/// Mutating nodes that the tree owns desynchronises it.
	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	#[must_use]
	pub fn container(&self) -> &S::Node {
		&self.container
	}

	/// Tears the tree down, running all cleanups and detaching its surface nodes, and returns the surface.
	#[instrument(skip(self))]
	pub fn unmount(mut self) -> S {
		if let Some(child) = self.child.take() {
			self.unmount_node(child);
		}
		self.surface.finish_pass();
		if self.tree.len() > 0 {
			warn!(leaked = self.tree.len(), "Nodes remained after unmounting the root.");
		}
		self.surface
	}
}

/// Mounts `descriptor` into `container`. See [`Root::mount`].
///
/// # Errors
///
/// See [`Root::mount`].
pub fn mount<S: Surface>(descriptor: Descriptor, surface: S, container: S::Node) -> Result<Root<S>, Error> {
	Root::mount(surface, container, descriptor)
}

/// See [`Root::run_mount_side_effects`].
pub fn run_mount_side_effects<S: Surface>(root: &mut Root<S>) -> usize {
	root.run_mount_side_effects()
}
