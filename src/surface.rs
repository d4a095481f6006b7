//! The display surface the reconciler patches.

use crate::descriptor::Listener;
use core::fmt::{self, Debug, Display, Formatter};

/// A normalized property value as it is applied to a surface node.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Str(String),
	Bool(bool),
	Int(i64),
	Float(f64),
}

impl Display for AttrValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Str(value) => f.write_str(value),
			Self::Bool(value) => Display::fmt(value, f),
			Self::Int(value) => Display::fmt(value, f),
			Self::Float(value) => Display::fmt(value, f),
		}
	}
}

/// What a surface node is, as far as positional binding cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceNodeKind {
	/// Carries the lowercase tag name.
	Element(String),
	Text,
	Comment,
	Other,
}

impl Display for SurfaceNodeKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Element(tag) => write!(f, "<{}>", tag),
			Self::Text => f.write_str("text"),
			Self::Comment => f.write_str("comment"),
			Self::Other => f.write_str("another kind of node"),
		}
	}
}

/// An external display tree, mutated incrementally.
///
/// Implementations log and skip failed mutations rather than returning them,
/// since a patch pass can't meaningfully roll back a half-applied surface change.
pub trait Surface {
	/// A cheap handle to one surface node.
	type Node: Clone + Debug + 'static;

	fn create_element(&mut self, tag: &str) -> Self::Node;
	fn create_text(&mut self, text: &str) -> Self::Node;
	fn set_text(&mut self, node: &Self::Node, text: &str);

	/// Inserts (or moves) `child` into `parent` before `before`, or at the end if `before` is [`None`].
	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, before: Option<&Self::Node>);
	/// Detaches `node` (with its descendants) from its parent.
	fn remove(&mut self, node: &Self::Node);

	fn set_property(&mut self, node: &Self::Node, name: &str, value: &AttrValue);
	fn remove_property(&mut self, node: &Self::Node, name: &str);

	fn add_listener(&mut self, node: &Self::Node, event: &str, listener: &Listener);
	fn remove_listener(&mut self, node: &Self::Node, event: &str, listener: &Listener);

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn kind(&self, node: &Self::Node) -> SurfaceNodeKind;

	/// Called after each mount, flush, hydration or unmount, once the surface is consistent again.
	fn finish_pass(&mut self) {}
}
