//! The live node arena.
//!
//! Nodes refer to their parent by [`NodeId`] only. A parent's `children` list is authoritative for membership and order.

use crate::{
	descriptor::{Component, Props},
	hooks::HookStore,
	scheduler::Lifecycle,
};
use slotmap::{new_key_type, SlotMap};
use std::{borrow::Cow, rc::Rc};

new_key_type! {
	pub(crate) struct NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
	Root,
	Node(NodeId),
}

pub(crate) struct TreeNode<N> {
	pub parent: Parent,
	pub kind: NodeKind<N>,
}

pub(crate) enum NodeKind<N> {
	Null,
	Text { value: Cow<'static, str>, surface: Option<N> },
	Host(HostNode<N>),
	Fragment { children: Vec<NodeId> },
	Component(ComponentNode),
}

pub(crate) struct HostNode<N> {
	pub tag: Cow<'static, str>,
	/// Mirrors what is currently bound on `surface`. Never contains children.
	pub props: Props,
	pub surface: Option<N>,
	pub children: Vec<NodeId>,
}

pub(crate) struct ComponentNode {
	pub component: Component,
	pub props: Props,
	pub children: Vec<NodeId>,
	pub hooks: HookStore,
	pub lifecycle: Rc<Lifecycle>,
}

impl<N> NodeKind<N> {
	pub fn children(&self) -> &[NodeId] {
		match self {
			Self::Null | Self::Text { .. } => &[],
			Self::Host(HostNode { children, .. }) | Self::Fragment { children } | Self::Component(ComponentNode { children, .. }) => children,
		}
	}

	pub fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
		match self {
			Self::Null | Self::Text { .. } => None,
			Self::Host(HostNode { children, .. }) | Self::Fragment { children } | Self::Component(ComponentNode { children, .. }) => Some(children),
		}
	}

	/// The surface node this node owns itself, if any.
	pub fn surface(&self) -> Option<&N> {
		match self {
			Self::Text { surface, .. } | Self::Host(HostNode { surface, .. }) => surface.as_ref(),
			Self::Null | Self::Fragment { .. } | Self::Component(_) => None,
		}
	}

	/// Whether this node is transparent on the surface, i.e. its children attach to its parent's surface node.
	pub fn is_transparent(&self) -> bool {
		matches!(self, Self::Fragment { .. } | Self::Component(_))
	}
}

pub(crate) struct Tree<N> {
	nodes: SlotMap<NodeId, TreeNode<N>>,
}

impl<N: Clone> Tree<N> {
	pub fn new() -> Self {
		Self { nodes: SlotMap::with_key() }
	}

	pub fn insert(&mut self, parent: Parent, kind: NodeKind<N>) -> NodeId {
		self.nodes.insert(TreeNode { parent, kind })
	}

	pub fn get(&self, id: NodeId) -> Option<&TreeNode<N>> {
		self.nodes.get(id)
	}

	pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind<N>> {
		self.nodes.get_mut(id).map(|node| &mut node.kind)
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn children(&self, id: NodeId) -> &[NodeId] {
		self.nodes.get(id).map_or(&[], |node| node.kind.children())
	}

	pub fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
		self.nodes.get_mut(id).and_then(|node| node.kind.children_mut())
	}

	pub fn parent(&self, id: NodeId) -> Option<Parent> {
		self.nodes.get(id).map(|node| node.parent)
	}

	/// How many ancestors `id` has. The root's child is at depth 0.
	pub fn depth(&self, id: NodeId) -> usize {
		let mut depth = 0;
		let mut current = id;
		while let Some(Parent::Node(parent)) = self.parent(current) {
			depth += 1;
			current = parent;
		}
		depth
	}

	pub fn is_host(&self, id: NodeId) -> bool {
		matches!(self.nodes.get(id), Some(TreeNode { kind: NodeKind::Host(_), .. }))
	}

	/// The first surface node in document order within `id`'s subtree.
	pub fn first_surface_node(&self, id: NodeId) -> Option<N> {
		let node = self.nodes.get(id)?;
		match &node.kind {
			NodeKind::Null => None,
			NodeKind::Text { surface, .. } | NodeKind::Host(HostNode { surface, .. }) => surface.clone(),
			NodeKind::Fragment { children } | NodeKind::Component(ComponentNode { children, .. }) => {
				children.iter().find_map(|&child| self.first_surface_node(child))
			}
		}
	}

	/// Collects the surface nodes at the top of `id`'s subtree, i.e. those that attach directly to the surface parent.
	pub fn top_surface_nodes(&self, id: NodeId, out: &mut Vec<N>) {
		let Some(node) = self.nodes.get(id) else { return };
		match &node.kind {
			NodeKind::Null => (),
			NodeKind::Text { surface, .. } | NodeKind::Host(HostNode { surface, .. }) => out.extend(surface.iter().cloned()),
			NodeKind::Fragment { children } | NodeKind::Component(ComponentNode { children, .. }) => {
				for &child in children {
					self.top_surface_nodes(child, out);
				}
			}
		}
	}

	/// The surface node that follows `id`'s subtree on the surface.
	///
	/// Walks up through transparent ancestors until a surface node or a surface-owning parent boundary is found.
	/// [`None`] means "append".
	pub fn next_surface_sibling(&self, id: NodeId) -> Option<N> {
		let mut current = id;
		loop {
			let Parent::Node(parent) = self.parent(current)? else {
				return None;
			};
			let siblings = self.children(parent);
			let position = siblings.iter().position(|&sibling| sibling == current)?;
			if let Some(surface) = siblings[position + 1..].iter().find_map(|&sibling| self.first_surface_node(sibling)) {
				return Some(surface);
			}
			if !self.nodes.get(parent)?.kind.is_transparent() {
				return None;
			}
			current = parent;
		}
	}

	/// The surface node that children of `parent` attach to.
	/// [`None`] stands for the root container.
	pub fn surface_parent(&self, parent: Parent) -> Option<N> {
		let mut current = parent;
		loop {
			let Parent::Node(id) = current else {
				return None;
			};
			let node = self.nodes.get(id)?;
			if let NodeKind::Host(HostNode { surface, .. }) = &node.kind {
				return surface.clone();
			}
			current = node.parent;
		}
	}

	/// Removes `id` and its descendants from the arena. Runs no cleanups; see `Root::unmount_node`.
	pub fn free_subtree(&mut self, id: NodeId) -> usize {
		let mut stack = vec![id];
		let mut freed = 0;
		while let Some(id) = stack.pop() {
			if let Some(node) = self.nodes.remove(id) {
				stack.extend_from_slice(node.kind.children());
				freed += 1;
			}
		}
		freed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fragment(tree: &mut Tree<u32>, parent: Parent) -> NodeId {
		tree.insert(parent, NodeKind::Fragment { children: Vec::new() })
	}

	fn text(tree: &mut Tree<u32>, parent: NodeId, surface: u32) -> NodeId {
		let id = tree.insert(
			Parent::Node(parent),
			NodeKind::Text {
				value: surface.to_string().into(),
				surface: Some(surface),
			},
		);
		tree.children_mut(parent).unwrap().push(id);
		id
	}

	#[test]
	fn next_surface_sibling_walks_through_fragments() {
		let mut tree = Tree::new();
		let outer = fragment(&mut tree, Parent::Root);
		let inner = fragment(&mut tree, Parent::Node(outer));
		tree.children_mut(outer).unwrap().push(inner);
		let a = text(&mut tree, inner, 1);
		let null = tree.insert(Parent::Node(outer), NodeKind::Null);
		tree.children_mut(outer).unwrap().push(null);
		text(&mut tree, outer, 2);

		assert_eq!(tree.next_surface_sibling(a), Some(2));
		assert_eq!(tree.next_surface_sibling(inner), Some(2));
		assert_eq!(tree.first_surface_node(outer), Some(1));
		assert_eq!(tree.surface_parent(Parent::Node(inner)), None);

		let mut top = Vec::new();
		tree.top_surface_nodes(outer, &mut top);
		assert_eq!(top, [1, 2]);
	}

	#[test]
	fn depth_counts_ancestors() {
		let mut tree = Tree::new();
		let outer = fragment(&mut tree, Parent::Root);
		let inner = fragment(&mut tree, Parent::Node(outer));
		let leaf = text(&mut tree, inner, 1);
		assert_eq!(tree.depth(outer), 0);
		assert_eq!(tree.depth(inner), 1);
		assert_eq!(tree.depth(leaf), 2);
	}

	#[test]
	fn free_subtree_removes_descendants() {
		let mut tree = Tree::new();
		let outer = fragment(&mut tree, Parent::Root);
		text(&mut tree, outer, 1);
		text(&mut tree, outer, 2);
		assert_eq!(tree.len(), 3);
		assert_eq!(tree.free_subtree(outer), 3);
		assert_eq!(tree.len(), 0);
	}
}
