//! Host property and listener patching.

use crate::{
	descriptor::{Listener, NodeRef, PropValue, Props, CHILDREN, REF},
	surface::{AttrValue, Surface},
};
use std::borrow::Cow;
use tracing::{trace, trace_span, warn};

/// Keys whose values are re-applied even if unchanged, since the surface edits them behind our back.
const LIVE_KEYS: &[&str] = &["checked", "value"];

enum Binding<'a> {
	Event(String, &'a Listener),
	Ref(&'a NodeRef),
	Attribute(&'a str, AttrValue),
	Ignored,
}

impl Binding<'_> {
	fn same_attribute(&self, other: &Binding<'_>) -> bool {
		matches!((self, other), (Binding::Attribute(a, _), Binding::Attribute(b, _)) if a == b)
	}
}

fn binding<'a>(key: &'a str, value: &'a PropValue) -> Binding<'a> {
	let name = if key == "className" { "class" } else { key };
	match value {
		PropValue::Listener(listener) => match key.strip_prefix("on") {
			Some(event) if !event.is_empty() => Binding::Event(event.to_ascii_lowercase(), listener),
			_ => {
				warn!(key, "Listener property doesn't start with `on`. Ignoring it.");
				Binding::Ignored
			}
		},
		PropValue::Ref(node_ref) => {
			if key == REF {
				Binding::Ref(node_ref)
			} else {
				warn!(key, "Node reference under a key other than `{}`. Ignoring it.", REF);
				Binding::Ignored
			}
		}
		PropValue::Classes(classes) => Binding::Attribute(name, AttrValue::Str(class_string(classes))),
		PropValue::Styles(styles) => Binding::Attribute(name, AttrValue::Str(style_string(styles))),
		PropValue::Str(value) => Binding::Attribute(name, AttrValue::Str(value.to_string())),
		PropValue::Bool(value) => Binding::Attribute(name, AttrValue::Bool(*value)),
		PropValue::Int(value) => Binding::Attribute(name, AttrValue::Int(*value)),
		PropValue::Float(value) => Binding::Attribute(name, AttrValue::Float(*value)),
		PropValue::Children(_) | PropValue::Data(_) => {
			warn!(key, ?value, "Host elements can't bind this kind of property. Ignoring it.");
			Binding::Ignored
		}
	}
}

/// The space-separated active class names.
pub(crate) fn class_string(classes: &[(Cow<'static, str>, bool)]) -> String {
	let mut joined = String::new();
	for (name, _) in classes.iter().filter(|(_, active)| *active) {
		if !joined.is_empty() {
			joined.push(' ');
		}
		joined.push_str(name);
	}
	joined
}

pub(crate) fn style_string(styles: &[(Cow<'static, str>, Cow<'static, str>)]) -> String {
	styles.iter().map(|(name, value)| format!("{}:{};", name, value)).collect()
}

fn bind<S: Surface>(surface: &mut S, element: &S::Node, binding: &Binding<'_>) {
	match binding {
		Binding::Event(event, listener) => surface.add_listener(element, event, listener),
		Binding::Ref(node_ref) => node_ref.bind(element.clone()),
		Binding::Attribute(name, value) => surface.set_property(element, name, value),
		Binding::Ignored => (),
	}
}

fn unbind<S: Surface>(surface: &mut S, element: &S::Node, binding: &Binding<'_>) {
	match binding {
		Binding::Event(event, listener) => surface.remove_listener(element, event, listener),
		Binding::Ref(node_ref) => node_ref.unbind(),
		Binding::Attribute(name, _) => surface.remove_property(element, name),
		Binding::Ignored => (),
	}
}

/// Patches `element` from `current` to `next` and stores `next` as the new `current`.
///
/// Removals run before additions, so `class` and `className` can trade places.
pub(crate) fn patch_props<S: Surface>(surface: &mut S, element: &S::Node, current: &mut Props, next: Props) {
	let span = trace_span!("patch_props", current = current.len(), next = next.len());
	let _enter = span.enter();

	for (key, old) in current.iter().filter(|(key, _)| *key != CHILDREN) {
		let old_binding = binding(key, old);
		match next.get(key) {
			Some(new) if old.same(new) => (),
			Some(new) if old_binding.same_attribute(&binding(key, new)) => (),
			Some(_) | None => unbind(surface, element, &old_binding),
		}
	}

	for (key, new) in next.iter().filter(|(key, _)| *key != CHILDREN) {
		match current.get(key) {
			Some(old) if old.same(new) && !LIVE_KEYS.contains(&key) => trace!(key, "Unchanged."),
			Some(_) | None => bind(surface, element, &binding(key, new)),
		}
	}

	*current = next;
}

/// Binds `props` onto a fresh `element`.
pub(crate) fn bind_props<S: Surface>(surface: &mut S, element: &S::Node, props: &Props) {
	for (key, value) in props.iter().filter(|(key, _)| *key != CHILDREN) {
		bind(surface, element, &binding(key, value));
	}
}

/// Binds only listeners and references, for surface nodes that already carry their attributes.
pub(crate) fn bind_handlers<S: Surface>(surface: &mut S, element: &S::Node, props: &Props) {
	for (key, value) in props.iter() {
		if let handler @ (Binding::Event(..) | Binding::Ref(_)) = binding(key, value) {
			bind(surface, element, &handler);
		}
	}
}

/// Releases listeners and references before `element` goes away.
pub(crate) fn release_props<S: Surface>(surface: &mut S, element: &S::Node, props: &Props) {
	for (key, value) in props.iter() {
		if let handler @ (Binding::Event(..) | Binding::Ref(_)) = binding(key, value) {
			unbind(surface, element, &handler);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classes_join_active_names() {
		let classes: [(Cow<'static, str>, bool); 3] = [("a".into(), true), ("b".into(), false), ("c".into(), true)];
		assert_eq!(class_string(&classes), "a c");
		assert_eq!(class_string(&[]), "");
	}

	#[test]
	fn styles_render_declarations() {
		let styles: [(Cow<'static, str>, Cow<'static, str>); 2] = [("color".into(), "red".into()), ("margin".into(), "0".into())];
		assert_eq!(style_string(&styles), "color:red;margin:0;");
	}

	#[test]
	fn event_names_are_lowercased() {
		let value = PropValue::Listener(Listener::new(|_| ()));
		assert!(matches!(binding("onClick", &value), Binding::Event(event, _) if event == "click"));
		assert!(matches!(binding("click", &value), Binding::Ignored));
		assert!(matches!(binding("on", &value), Binding::Ignored));
	}

	#[test]
	fn class_name_is_an_alias() {
		let value = PropValue::from("x");
		assert!(matches!(binding("className", &value), Binding::Attribute("class", AttrValue::Str(s)) if s == "x"));
	}
}
