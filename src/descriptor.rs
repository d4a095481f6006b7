//! The immutable input model: what a component asks to be rendered.
//!
//! [`Descriptor`]s are cheap to build and are consumed by the reconciler. They never alias live tree state,
//! so building or diffing never mutates a descriptor that is still held by the caller.

use crate::hooks::Hooks;
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
};
use std::{borrow::Cow, rc::Rc};

/// The reserved property key carrying child descriptors.
pub const CHILDREN: &str = "children";

/// The reserved property key binding a host's surface node to a [`NodeRef`].
pub const REF: &str = "ref";

/// A declarative description of desired UI shape.
#[derive(Debug, Clone)]
pub enum Descriptor {
	/// Renders nothing. Booleans, `()` and `None` all become this.
	Null,
	/// A text leaf.
	Text(Cow<'static, str>),
	/// A transparent sequence, diffed by index.
	List(Vec<Descriptor>),
	/// A host element, fragment or component.
	Element(Element),
}

impl Descriptor {
	#[must_use]
	pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
		Self::Text(text.into())
	}

	#[must_use]
	pub fn host(tag: impl Into<Cow<'static, str>>, props: Props) -> Self {
		Self::Element(Element {
			ty: ElementType::Tag(tag.into()),
			props,
		})
	}

	#[must_use]
	pub fn fragment(children: impl IntoIterator<Item = Descriptor>) -> Self {
		Self::Element(Element {
			ty: ElementType::Fragment,
			props: Props::new().with_children(children),
		})
	}

	#[must_use]
	pub fn component(component: Component, props: Props) -> Self {
		Self::Element(Element {
			ty: ElementType::Component(component),
			props,
		})
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Flattens a component's output into the child sequence it stands for.
	pub(crate) fn into_children(self) -> Vec<Descriptor> {
		match self {
			Self::List(items) => items,
			other => vec![other],
		}
	}
}

impl From<&'static str> for Descriptor {
	fn from(text: &'static str) -> Self {
		Self::Text(text.into())
	}
}

impl From<String> for Descriptor {
	fn from(text: String) -> Self {
		Self::Text(text.into())
	}
}

impl From<Cow<'static, str>> for Descriptor {
	fn from(text: Cow<'static, str>) -> Self {
		Self::Text(text)
	}
}

macro_rules! number_descriptor {
	($($number:ty),*) => {$(
		impl From<$number> for Descriptor {
			fn from(number: $number) -> Self {
				Self::Text(number.to_string().into())
			}
		}
	)*};
}
number_descriptor!(i32, i64, u32, u64, usize, f32, f64);

impl From<bool> for Descriptor {
	fn from(_: bool) -> Self {
		Self::Null
	}
}

impl From<()> for Descriptor {
	fn from((): ()) -> Self {
		Self::Null
	}
}

impl<T: Into<Descriptor>> From<Option<T>> for Descriptor {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

impl From<Vec<Descriptor>> for Descriptor {
	fn from(items: Vec<Descriptor>) -> Self {
		Self::List(items)
	}
}

impl From<Element> for Descriptor {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

#[derive(Debug, Clone)]
pub struct Element {
	pub ty: ElementType,
	pub props: Props,
}

#[derive(Debug, Clone)]
pub enum ElementType {
	/// A host element, created on the surface under this tag name.
	Tag(Cow<'static, str>),
	/// Transparent grouping of `props.children()`.
	Fragment,
	Component(Component),
}

/// The signature of a component function.
pub type Render = fn(&mut Hooks<'_>, &Props) -> Descriptor;

/// A component function reference.
///
/// Two [`Component`]s are the same component iff they wrap the same function, which is what decides
/// between re-invoking and replacing during a diff.
#[derive(Clone, Copy)]
pub struct Component {
	name: &'static str,
	render: Render,
}

impl Component {
	#[must_use]
	pub const fn new(name: &'static str, render: Render) -> Self {
		Self { name, render }
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		self.render as usize == other.render as usize
	}

	pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Descriptor {
		(self.render)(hooks, props)
	}
}

impl Debug for Component {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Component").field(&self.name).finish()
	}
}

/// An event listener. Compared and hashed by identity.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&dyn Any)>);

impl Listener {
	/// The handler receives the surface's event payload, e.g. a `web_sys::Event` on `DomSurface`.
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event);
	}

	fn addr(&self) -> *const () {
		Rc::as_ptr(&self.0).cast::<()>()
	}
}

impl PartialEq for Listener {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}
impl Eq for Listener {}

impl Hash for Listener {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state);
	}
}

impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Listener").field(&self.addr()).finish()
	}
}

/// Receives a host's surface node while it is bound through the reserved `ref` property.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<Rc<dyn Any>>>>);

impl NodeRef {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The bound surface node, if any and if it is a `T`.
	#[must_use]
	pub fn get<T: Clone + 'static>(&self) -> Option<T> {
		self.0.borrow().as_ref().and_then(|node| node.downcast_ref::<T>()).cloned()
	}

	#[must_use]
	pub fn is_bound(&self) -> bool {
		self.0.borrow().is_some()
	}

	pub(crate) fn bind<T: 'static>(&self, node: T) {
		*self.0.borrow_mut() = Some(Rc::new(node));
	}

	pub(crate) fn unbind(&self) {
		self.0.borrow_mut().take();
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for NodeRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("NodeRef").field("bound", &self.is_bound()).finish()
	}
}

/// A property value.
#[derive(Clone)]
pub enum PropValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Cow<'static, str>),
	/// Class names and whether each is active. Only meaningful under `class`.
	Classes(Vec<(Cow<'static, str>, bool)>),
	/// Style declarations. Only meaningful under `style`.
	Styles(Vec<(Cow<'static, str>, Cow<'static, str>)>),
	Listener(Listener),
	Ref(NodeRef),
	Children(Vec<Descriptor>),
	/// Opaque data for component props, compared by identity.
	Data(Rc<dyn Any>),
}

impl PropValue {
	pub fn classes<N: Into<Cow<'static, str>>>(classes: impl IntoIterator<Item = (N, bool)>) -> Self {
		Self::Classes(classes.into_iter().map(|(name, active)| (name.into(), active)).collect())
	}

	pub fn styles<N: Into<Cow<'static, str>>, V: Into<Cow<'static, str>>>(styles: impl IntoIterator<Item = (N, V)>) -> Self {
		Self::Styles(styles.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}

	pub fn data<T: 'static>(data: T) -> Self {
		Self::Data(Rc::new(data))
	}

	/// Whether rebinding `other` in place of `self` can be skipped.
	#[allow(clippy::float_cmp)]
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Classes(a), Self::Classes(b)) => a == b,
			(Self::Styles(a), Self::Styles(b)) => a == b,
			(Self::Listener(a), Self::Listener(b)) => a == b,
			(Self::Ref(a), Self::Ref(b)) => a.ptr_eq(b),
			(Self::Data(a), Self::Data(b)) => Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>(),
			_ => false,
		}
	}
}

impl Debug for PropValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
			Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
			Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
			Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
			Self::Classes(value) => f.debug_tuple("Classes").field(value).finish(),
			Self::Styles(value) => f.debug_tuple("Styles").field(value).finish(),
			Self::Listener(value) => value.fmt(f),
			Self::Ref(value) => value.fmt(f),
			Self::Children(value) => f.debug_tuple("Children").field(&value.len()).finish(),
			Self::Data(_) => f.write_str("Data(..)"),
		}
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i32> for PropValue {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<i64> for PropValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for PropValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&'static str> for PropValue {
	fn from(value: &'static str) -> Self {
		Self::Str(value.into())
	}
}

impl From<String> for PropValue {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}

impl From<Cow<'static, str>> for PropValue {
	fn from(value: Cow<'static, str>) -> Self {
		Self::Str(value)
	}
}

impl From<Listener> for PropValue {
	fn from(value: Listener) -> Self {
		Self::Listener(value)
	}
}

impl From<NodeRef> for PropValue {
	fn from(value: NodeRef) -> Self {
		Self::Ref(value)
	}
}

/// An insertion-ordered property map.
#[derive(Debug, Clone, Default)]
pub struct Props {
	entries: Vec<(Cow<'static, str>, PropValue)>,
}

impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
		self.insert(key, value);
		self
	}

	#[must_use]
	pub fn with_children(self, children: impl IntoIterator<Item = Descriptor>) -> Self {
		self.with(CHILDREN, PropValue::Children(children.into_iter().collect()))
	}

	/// Inserts or overwrites `key`, returning the previous value.
	pub fn insert(&mut self, key: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Option<PropValue> {
		let key = key.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot)) => Some(core::mem::replace(slot, value)),
			None => {
				self.entries.push((key, value));
				None
			}
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<PropValue> {
		let index = self.entries.iter().position(|(k, _)| k == key)?;
		Some(self.entries.remove(index).1)
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&PropValue> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, value)| value)
	}

	#[must_use]
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	pub fn keys(&self) -> impl Iterator<Item = &Cow<'static, str>> {
		self.entries.iter().map(|(key, _)| key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.entries.iter().map(|(key, value)| (&**key, value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[must_use]
	pub fn str(&self, key: &str) -> Option<&str> {
		match self.get(key)? {
			PropValue::Str(value) => Some(value),
			_ => None,
		}
	}

	#[must_use]
	pub fn int(&self, key: &str) -> Option<i64> {
		match self.get(key)? {
			PropValue::Int(value) => Some(*value),
			_ => None,
		}
	}

	#[must_use]
	pub fn bool(&self, key: &str) -> Option<bool> {
		match self.get(key)? {
			PropValue::Bool(value) => Some(*value),
			_ => None,
		}
	}

	/// Opaque data stored with [`PropValue::data`], if it is a `T`.
	#[must_use]
	pub fn data<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
		match self.get(key)? {
			PropValue::Data(data) => Rc::clone(data).downcast::<T>().ok(),
			_ => None,
		}
	}

	/// The descriptors under the reserved `children` key.
	#[must_use]
	pub fn children(&self) -> &[Descriptor] {
		match self.get(CHILDREN) {
			Some(PropValue::Children(children)) => children,
			_ => &[],
		}
	}

	pub(crate) fn take_children(&mut self) -> Vec<Descriptor> {
		match self.remove(CHILDREN) {
			Some(PropValue::Children(children)) => children,
			Some(_) | None => Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn component_identity_follows_function() {
		fn a(_: &mut Hooks<'_>, _: &Props) -> Descriptor {
			Descriptor::Null
		}
		fn b(_: &mut Hooks<'_>, _: &Props) -> Descriptor {
			Descriptor::Text("b".into())
		}

		assert!(Component::new("A", a).same(&Component::new("Renamed", a)));
		assert!(!Component::new("A", a).same(&Component::new("B", b)));
	}

	#[test]
	fn listener_identity() {
		let listener = Listener::new(|_| ());
		assert_eq!(listener, listener.clone());
		assert_ne!(listener, Listener::new(|_| ()));
		assert!(PropValue::from(listener.clone()).same(&PropValue::from(listener)));
	}

	#[test]
	fn props_insert_overwrites_in_place() {
		let mut props = Props::new().with("a", 1).with("b", "x");
		assert!(props.insert("a", 2).is_some());
		assert_eq!(props.keys().map(|key| &**key).collect::<Vec<&str>>(), ["a", "b"]);
		assert_eq!(props.int("a"), Some(2));
		assert_eq!(props.str("b"), Some("x"));
	}

	#[test]
	fn take_children_strips_reserved_key() {
		let mut props = Props::new().with("id", "x").with_children([Descriptor::from("a"), Descriptor::from(1)]);
		assert_eq!(props.children().len(), 2);
		assert_eq!(props.take_children().len(), 2);
		assert!(!props.contains_key(CHILDREN));
		assert_eq!(props.len(), 1);
	}

	#[test]
	fn null_like_values() {
		assert!(Descriptor::from(true).is_null());
		assert!(Descriptor::from(()).is_null());
		assert!(Descriptor::from(None::<&'static str>).is_null());
		assert!(matches!(Descriptor::from(Some("x")), Descriptor::Text(_)));
	}
}
