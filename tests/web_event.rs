#![cfg(target_arch = "wasm32")]

use sapwood::{Component, Descriptor, DomSurface, Hooks, Listener, Props, Root};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn clicker(hooks: &mut Hooks<'_>, _: &Props) -> Descriptor {
	let (clicks, set_clicks) = hooks.use_state(0);
	Descriptor::host(
		"BUTTON",
		Props::new()
			.with("id", "test-button")
			.with(
				"onClick",
				Listener::new(move |event| {
					event.downcast_ref::<web_sys::Event>().expect("Expected Event but received something else.");
					set_clicks.update(|clicks| clicks + 1);
				}),
			)
			.with_children([Descriptor::from(clicks)]),
	)
}

#[wasm_bindgen_test]
fn click() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();

	let mut root = Root::mount(DomSurface::new(document.clone()), body.into(), Descriptor::component(Component::new("Clicker", clicker), Props::new())).unwrap();
	root.run_mount_side_effects();

	let button: HtmlElement = document.get_element_by_id("test-button").unwrap().dyn_into().unwrap();
	assert_eq!(button.text_content().as_deref(), Some("0"));

	button.click();
	assert!(root.has_pending_renders());
	assert_eq!(root.flush(), Ok(1));
	assert_eq!(button.text_content().as_deref(), Some("1"));

	root.unmount();
	assert!(document.get_element_by_id("test-button").is_none());
}
