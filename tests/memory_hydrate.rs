mod log_;

use sapwood::{Component, Descriptor, Error, Hooks, Listener, MemoryNode, MemorySurface, Props, Root, Surface};

fn counter(hooks: &mut Hooks<'_>, _: &Props) -> Descriptor {
	let (count, set_count) = hooks.use_state(0);
	Descriptor::host(
		"button",
		Props::new()
			.with("id", "counter")
			.with("onClick", Listener::new(move |_| set_count.update(|count| count + 1)))
			.with_children([Descriptor::from("Count: "), Descriptor::from(count)]),
	)
}

const COUNTER: Component = Component::new("Counter", counter);

/// Builds `<button id="counter">Count: <!---->0<!----></button>` the way a server would have rendered it.
fn prerendered() -> (MemorySurface, MemoryNode, MemoryNode, MemoryNode) {
	let (mut surface, container) = MemorySurface::with_container();
	let button = surface.create_element("BUTTON");
	surface.set_property(&button, "id", &sapwood::AttrValue::Str("counter".to_owned()));
	surface.append(container, button);
	let label = surface.create_text("Count: ");
	surface.append(button, label);
	let separator = surface.create_comment("");
	surface.append(button, separator);
	let count = surface.create_text("0");
	surface.append(button, count);
	let separator = surface.create_comment("");
	surface.append(button, separator);
	surface.reset_stats();
	(surface, container, button, count)
}

#[test]
fn binds_to_existing_nodes() {
	log_::init();
	let (surface, container, button, count) = prerendered();

	let mut root = Root::hydrate(surface, container, Descriptor::component(COUNTER, Props::new())).unwrap();
	assert_eq!(root.surface().stats().created, 0);
	assert_eq!(root.surface().stats().removed, 2);
	assert_eq!(root.surface().inner_html(container), r#"<button id="counter">Count: 0</button>"#);
	assert_eq!(root.surface().listener_count(button, "click"), 1);

	root.run_mount_side_effects();
	assert_eq!(root.surface().dispatch(button, "click", &()), 1);
	assert_eq!(root.flush(), Ok(1));

	assert_eq!(root.surface().inner_html(container), r#"<button id="counter">Count: 1</button>"#);
	assert_eq!(root.surface().children(button)[1], count);
	assert_eq!(root.surface().stats().created, 0);
}

#[test]
fn missing_nodes_are_reported() {
	log_::init();
	let (surface, container) = MemorySurface::with_container();
	let error = Root::hydrate(surface, container, Descriptor::component(COUNTER, Props::new())).err();
	assert_eq!(error, Some(Error::SurfaceNodeMissing { expected: "<button>".to_owned() }));
}

#[test]
fn mismatched_nodes_are_reported() {
	log_::init();
	let (mut surface, container) = MemorySurface::with_container();
	let span = surface.create_element("span");
	surface.append(container, span);

	let error = Root::hydrate(surface, container, Descriptor::component(COUNTER, Props::new())).err();
	assert_eq!(
		error,
		Some(Error::SurfaceNodeMismatch {
			expected: "<button>".to_owned(),
			found: "<span>".to_owned(),
		})
	);
}

#[test]
fn text_must_bind_to_text() {
	log_::init();
	let (mut surface, container) = MemorySurface::with_container();
	let button = surface.create_element("button");
	surface.append(container, button);
	let nested = surface.create_element("b");
	surface.append(button, nested);

	let error = Root::hydrate(surface, container, Descriptor::component(COUNTER, Props::new())).err();
	assert_eq!(
		error,
		Some(Error::SurfaceNodeMismatch {
			expected: "text".to_owned(),
			found: "<b>".to_owned(),
		})
	);
}
