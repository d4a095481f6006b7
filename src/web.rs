//! A [`Surface`] backed by a browser DOM.

use crate::{
	closure_map::ClosureMap,
	descriptor::Listener,
	surface::{AttrValue, Surface, SurfaceNodeKind},
};
use core::fmt::{self, Debug, Formatter};
use js_sys::Reflect;
use tracing::{error, info, instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CharacterData, Document, Element, Node};

/// Properties that track live input state and are set as JavaScript properties rather than attributes.
const DOM_PROPERTIES: &[&str] = &["checked", "value"];

/// Patches the DOM of one [`Document`].
///
/// Event listeners are shared [`Closure`](`wasm_bindgen::closure::Closure`)s, reference-counted per [`Listener`].
/// They are dropped in [`Surface::finish_pass`] once unbound, so the instance must outlive every element it bound listeners to.
pub struct DomSurface {
	document: Document,
	closures: ClosureMap,
}

impl Debug for DomSurface {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomSurface").field("closures", &self.closures.len()).finish_non_exhaustive()
	}
}

impl DomSurface {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			closures: ClosureMap::default(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn log_failure(operation: &'static str, result: Result<impl Sized, JsValue>) {
	if let Err(error) = result {
		error!(operation, ?error, "DOM operation failed.");
	}
}

impl Surface for DomSurface {
	type Node = Node;

	#[instrument(skip(self))]
	fn create_element(&mut self, tag: &str) -> Node {
		match self.document.create_element(tag) {
			Ok(element) => element.into(),
			Err(error) => {
				error!(?error, "Failed to create element. Substituting a comment.");
				self.document.create_comment(tag).into()
			}
		}
	}

	fn create_text(&mut self, text: &str) -> Node {
		self.document.create_text_node(text).into()
	}

	fn set_text(&mut self, node: &Node, text: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(data) => data.set_data(text),
			None => error!(?node, "Tried to set text on a node that isn't character data."),
		}
	}

	fn insert_before(&mut self, parent: &Node, child: &Node, before: Option<&Node>) {
		log_failure("insertBefore", parent.insert_before(child, before));
	}

	fn remove(&mut self, node: &Node) {
		match node.parent_node() {
			Some(parent) => log_failure("removeChild", parent.remove_child(node)),
			None => trace!(?node, "Already detached."),
		}
	}

	fn set_property(&mut self, node: &Node, name: &str, value: &AttrValue) {
		let Some(element) = node.dyn_ref::<Element>() else {
			return error!(?node, name, "Tried to set a property on a non-element.");
		};

		if DOM_PROPERTIES.contains(&name) {
			let js_value = match value {
				AttrValue::Str(value) => JsValue::from_str(value),
				AttrValue::Bool(value) => JsValue::from_bool(*value),
				#[allow(clippy::cast_precision_loss)]
				AttrValue::Int(value) => JsValue::from_f64(*value as f64),
				AttrValue::Float(value) => JsValue::from_f64(*value),
			};
			return log_failure("Reflect.set", Reflect::set(element, &JsValue::from_str(name), &js_value));
		}

		match value {
			AttrValue::Bool(true) => log_failure("setAttribute", element.set_attribute(name, "")),
			AttrValue::Bool(false) => log_failure("removeAttribute", element.remove_attribute(name)),
			value => log_failure("setAttribute", element.set_attribute(name, &value.to_string())),
		}
	}

	fn remove_property(&mut self, node: &Node, name: &str) {
		let Some(element) = node.dyn_ref::<Element>() else {
			return error!(?node, name, "Tried to remove a property from a non-element.");
		};
		if DOM_PROPERTIES.contains(&name) {
			log_failure("Reflect.deleteProperty", Reflect::delete_property(element, &JsValue::from_str(name)));
		}
		log_failure("removeAttribute", element.remove_attribute(name));
	}

	fn add_listener(&mut self, node: &Node, event: &str, listener: &Listener) {
		if let Some(function) = self.closures.acquire(listener) {
			log_failure("addEventListener", node.add_event_listener_with_callback(event, &function));
		}
	}

	fn remove_listener(&mut self, node: &Node, event: &str, listener: &Listener) {
		if let Some(function) = self.closures.release(listener) {
			log_failure("removeEventListener", node.remove_event_listener_with_callback(event, &function));
		}
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn kind(&self, node: &Node) -> SurfaceNodeKind {
		match node.node_type() {
			Node::ELEMENT_NODE => SurfaceNodeKind::Element(node.node_name().to_ascii_lowercase()),
			Node::TEXT_NODE => SurfaceNodeKind::Text,
			Node::COMMENT_NODE => SurfaceNodeKind::Comment,
			_ => SurfaceNodeKind::Other,
		}
	}

	fn finish_pass(&mut self) {
		self.closures.collect();
		info!(closures = self.closures.len(), "Event closure count.");
	}
}
