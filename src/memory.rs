//! A headless [`Surface`] that keeps its nodes in memory.
//!
//! Mutations are counted in [`MutationStats`], which makes it easy to assert that a patch left a node alone.
//! Nodes removed during a pass are freed at the end of it unless they were re-inserted.

use crate::{
	build::is_void_element,
	descriptor::Listener,
	surface::{AttrValue, Surface, SurfaceNodeKind},
};
use core::{any::Any, fmt::Write};
use hashbrown::HashMap;
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeMap;
use tracing::{error, trace, warn};

new_key_type! {
	/// A handle to a [`MemorySurface`] node. Only meaningful for the surface that created it.
	///
	/// Handles to freed nodes stay invalid, even after their slot is reused.
	pub struct MemoryNode;
}

/// How often each kind of mutation was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
	pub created: usize,
	pub inserted: usize,
	pub removed: usize,
	pub text_updates: usize,
	pub properties_set: usize,
	pub properties_removed: usize,
	pub listeners_added: usize,
	pub listeners_removed: usize,
	/// Nodes dropped because they were still detached at the end of a pass.
	pub freed: usize,
}

#[derive(Debug)]
enum Content {
	Element {
		tag: String,
		properties: BTreeMap<String, AttrValue>,
		listeners: HashMap<String, Vec<Listener>>,
		children: Vec<MemoryNode>,
	},
	Text(String),
	Comment(String),
}

#[derive(Debug)]
struct Entry {
	parent: Option<MemoryNode>,
	content: Content,
}

fn content_mut(nodes: &mut SlotMap<MemoryNode, Entry>, node: MemoryNode) -> Option<&mut Content> {
	let entry = nodes.get_mut(node);
	if entry.is_none() {
		error!(?node, "Unknown memory node.");
	}
	entry.map(|entry| &mut entry.content)
}

#[derive(Debug, Default)]
pub struct MemorySurface {
	nodes: SlotMap<MemoryNode, Entry>,
	removed: Vec<MemoryNode>,
	stats: MutationStats,
}

impl MemorySurface {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// A new surface with a detached `<div>` to mount into.
	#[must_use]
	pub fn with_container() -> (Self, MemoryNode) {
		let mut surface = Self::new();
		let container = surface.create_element("div");
		surface.reset_stats();
		(surface, container)
	}

	fn push(&mut self, content: Content) -> MemoryNode {
		self.stats.created += 1;
		self.nodes.insert(Entry { parent: None, content })
	}

	/// Drops `node` and its descendants.
	fn free(&mut self, node: MemoryNode) -> usize {
		let mut freed = 0;
		let mut stack = vec![node];
		while let Some(node) = stack.pop() {
			if let Some(entry) = self.nodes.remove(node) {
				if let Content::Element { children, .. } = entry.content {
					stack.extend(children);
				}
				freed += 1;
			}
		}
		freed
	}

	fn entry(&self, node: MemoryNode) -> Option<&Entry> {
		let entry = self.nodes.get(node);
		if entry.is_none() {
			error!(?node, "Unknown memory node.");
		}
		entry
	}

	fn entry_mut(&mut self, node: MemoryNode) -> Option<&mut Entry> {
		let entry = self.nodes.get_mut(node);
		if entry.is_none() {
			error!(?node, "Unknown memory node.");
		}
		entry
	}

	fn element_children_mut(&mut self, node: MemoryNode) -> Option<&mut Vec<MemoryNode>> {
		match &mut self.entry_mut(node)?.content {
			Content::Element { children, .. } => Some(children),
			Content::Text(_) | Content::Comment(_) => None,
		}
	}

	fn detach(&mut self, node: MemoryNode) -> bool {
		let Some(parent) = self.entry_mut(node).and_then(|entry| entry.parent.take()) else {
			return false;
		};
		if let Some(children) = self.element_children_mut(parent) {
			children.retain(|&child| child != node);
		}
		true
	}

	pub fn create_comment(&mut self, text: &str) -> MemoryNode {
		self.push(Content::Comment(text.to_owned()))
	}

	/// Appends `child` to `parent`, like [`Surface::insert_before`] without a reference node.
	pub fn append(&mut self, parent: MemoryNode, child: MemoryNode) {
		self.insert_before(&parent, &child, None);
	}

	#[must_use]
	pub fn children(&self, node: MemoryNode) -> &[MemoryNode] {
		match self.entry(node).map(|entry| &entry.content) {
			Some(Content::Element { children, .. }) => children,
			_ => &[],
		}
	}

	#[must_use]
	pub fn parent(&self, node: MemoryNode) -> Option<MemoryNode> {
		self.entry(node)?.parent
	}

	#[must_use]
	pub fn tag(&self, node: MemoryNode) -> Option<&str> {
		match &self.entry(node)?.content {
			Content::Element { tag, .. } => Some(tag),
			Content::Text(_) | Content::Comment(_) => None,
		}
	}

	/// The content of a text or comment node.
	#[must_use]
	pub fn text(&self, node: MemoryNode) -> Option<&str> {
		match &self.entry(node)?.content {
			Content::Text(text) | Content::Comment(text) => Some(text),
			Content::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn property(&self, node: MemoryNode, name: &str) -> Option<&AttrValue> {
		match &self.entry(node)?.content {
			Content::Element { properties, .. } => properties.get(name),
			Content::Text(_) | Content::Comment(_) => None,
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: MemoryNode, event: &str) -> usize {
		match self.entry(node).map(|entry| &entry.content) {
			Some(Content::Element { listeners, .. }) => listeners.get(event).map_or(0, Vec::len),
			_ => 0,
		}
	}

	/// Calls `node`'s listeners for `event` with `payload`. Returns how many were called.
	///
	/// Listeners usually only schedule work, so [`Root::flush`](`crate::Root::flush`) afterwards to see their effect.
	pub fn dispatch(&self, node: MemoryNode, event: &str, payload: &dyn Any) -> usize {
		let listeners: Vec<Listener> = match self.entry(node).map(|entry| &entry.content) {
			Some(Content::Element { listeners, .. }) => listeners.get(event).cloned().unwrap_or_default(),
			_ => Vec::new(),
		};
		for listener in &listeners {
			listener.call(payload);
		}
		listeners.len()
	}

	/// Serializes `node`'s children as HTML. Attributes are sorted by name.
	#[must_use]
	pub fn inner_html(&self, node: MemoryNode) -> String {
		let mut html = String::new();
		for &child in self.children(node) {
			self.write_html(child, &mut html);
		}
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: MemoryNode) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: MemoryNode, html: &mut String) {
		let Some(entry) = self.entry(node) else { return };
		match &entry.content {
			Content::Text(text) => escape_into(html, text, false),
			Content::Comment(text) => {
				let _ = write!(html, "<!--{}-->", text);
			}
			Content::Element { tag, properties, children, .. } => {
				html.push('<');
				html.push_str(tag);
				for (name, value) in properties {
					match value {
						AttrValue::Bool(true) => {
							let _ = write!(html, " {}", name);
						}
						AttrValue::Bool(false) => (),
						value => {
							let _ = write!(html, " {}=\"", name);
							escape_into(html, &value.to_string(), true);
							html.push('"');
						}
					}
				}
				html.push('>');
				if is_void_element(tag) {
					return;
				}
				for &child in children {
					self.write_html(child, html);
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	#[must_use]
	pub fn stats(&self) -> MutationStats {
		self.stats
	}

	pub fn reset_stats(&mut self) {
		self.stats = MutationStats::default();
	}

	/// The number of nodes that haven't been freed, including the container.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}
}

impl Surface for MemorySurface {
	type Node = MemoryNode;

	fn create_element(&mut self, tag: &str) -> MemoryNode {
		self.push(Content::Element {
			tag: tag.to_ascii_lowercase(),
			properties: BTreeMap::new(),
			listeners: HashMap::new(),
			children: Vec::new(),
		})
	}

	fn create_text(&mut self, text: &str) -> MemoryNode {
		self.push(Content::Text(text.to_owned()))
	}

	fn set_text(&mut self, node: &MemoryNode, text: &str) {
		match content_mut(&mut self.nodes, *node) {
			Some(Content::Text(content) | Content::Comment(content)) => {
				text.clone_into(content);
				self.stats.text_updates += 1;
			}
			Some(Content::Element { .. }) => warn!(?node, "Tried to set text on an element."),
			None => (),
		}
	}

	fn insert_before(&mut self, parent: &MemoryNode, child: &MemoryNode, before: Option<&MemoryNode>) {
		if self.element_children_mut(*parent).is_none() {
			return error!(?parent, "Tried to insert into a non-element.");
		}
		self.detach(*child);

		let Some(children) = self.element_children_mut(*parent) else { return };
		let index = match before {
			Some(before) => match children.iter().position(|c| c == before) {
				Some(index) => index,
				None => {
					warn!(?parent, ?before, "Reference node isn't a child of the parent. Appending.");
					children.len()
				}
			},
			None => children.len(),
		};
		children.insert(index, *child);
		if let Some(entry) = self.entry_mut(*child) {
			entry.parent = Some(*parent);
		}
		self.stats.inserted += 1;
	}

	fn remove(&mut self, node: &MemoryNode) {
		if self.detach(*node) {
			self.removed.push(*node);
			self.stats.removed += 1;
		}
	}

	fn set_property(&mut self, node: &MemoryNode, name: &str, value: &AttrValue) {
		match content_mut(&mut self.nodes, *node) {
			Some(Content::Element { properties, .. }) => {
				properties.insert(name.to_owned(), value.clone());
				self.stats.properties_set += 1;
			}
			Some(_) => warn!(?node, name, "Tried to set a property on a non-element."),
			None => (),
		}
	}

	fn remove_property(&mut self, node: &MemoryNode, name: &str) {
		if let Some(Content::Element { properties, .. }) = content_mut(&mut self.nodes, *node) {
			if properties.remove(name).is_some() {
				self.stats.properties_removed += 1;
			}
		}
	}

	fn add_listener(&mut self, node: &MemoryNode, event: &str, listener: &Listener) {
		match content_mut(&mut self.nodes, *node) {
			Some(Content::Element { listeners, .. }) => {
				listeners.entry(event.to_owned()).or_default().push(listener.clone());
				self.stats.listeners_added += 1;
			}
			Some(_) => warn!(?node, event, "Tried to add a listener to a non-element."),
			None => (),
		}
	}

	fn remove_listener(&mut self, node: &MemoryNode, event: &str, listener: &Listener) {
		if let Some(Content::Element { listeners, .. }) = content_mut(&mut self.nodes, *node) {
			let Some(bound) = listeners.get_mut(event) else { return };
			if let Some(index) = bound.iter().position(|bound| bound == listener) {
				bound.remove(index);
				self.stats.listeners_removed += 1;
			}
		}
	}

	fn first_child(&self, node: &MemoryNode) -> Option<MemoryNode> {
		self.children(*node).first().copied()
	}

	fn next_sibling(&self, node: &MemoryNode) -> Option<MemoryNode> {
		let parent = self.parent(*node)?;
		let siblings = self.children(parent);
		let index = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn kind(&self, node: &MemoryNode) -> SurfaceNodeKind {
		match self.entry(*node).map(|entry| &entry.content) {
			Some(Content::Element { tag, .. }) => SurfaceNodeKind::Element(tag.clone()),
			Some(Content::Text(_)) => SurfaceNodeKind::Text,
			Some(Content::Comment(_)) => SurfaceNodeKind::Comment,
			None => SurfaceNodeKind::Other,
		}
	}

	fn finish_pass(&mut self) {
		let mut freed = 0;
		for node in core::mem::take(&mut self.removed) {
			if matches!(self.nodes.get(node), Some(Entry { parent: None, .. })) {
				freed += self.free(node);
			}
		}
		if freed > 0 {
			trace!(freed, "Freed detached memory nodes.");
			self.stats.freed += freed;
		}
	}
}

fn escape_into(html: &mut String, text: &str, attribute: bool) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' if attribute => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}
