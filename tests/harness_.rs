#![allow(dead_code)]

use sapwood::{Component, Descriptor, Error, Hooks, MemoryNode, MemorySurface, PropValue, Props, RenderOptions, Root, SetState};
use std::{any::Any, cell::RefCell, rc::Rc};

#[path = "log_.rs"]
mod log_;

/// A root component that renders whatever children the test hands it.
pub struct Harness {
	content: RefCell<Vec<Descriptor>>,
	rerender: RefCell<Option<SetState<u32>>>,
}

fn harness(hooks: &mut Hooks<'_>, props: &Props) -> Descriptor {
	let (_, rerender) = hooks.use_state(0_u32);
	let harness = props.data::<Harness>("harness").expect("harness prop");
	*harness.rerender.borrow_mut() = Some(rerender);
	let content = harness.content.borrow().clone();
	Descriptor::List(content)
}

pub const HARNESS: Component = Component::new("Harness", harness);

impl Harness {
	pub fn mount(content: Vec<Descriptor>) -> (Rc<Self>, Root<MemorySurface>, MemoryNode) {
		Self::mount_with_options(content, RenderOptions::default()).expect("mount")
	}

	pub fn mount_with_options(content: Vec<Descriptor>, options: RenderOptions) -> Result<(Rc<Self>, Root<MemorySurface>, MemoryNode), Error> {
		log_::init();

		let harness = Rc::new(Self {
			content: RefCell::new(content),
			rerender: RefCell::new(None),
		});
		let (surface, container) = MemorySurface::with_container();
		let props = Props::new().with("harness", PropValue::Data(Rc::clone(&harness) as Rc<dyn Any>));
		let mut root = Root::mount_with_options(surface, container, Descriptor::component(HARNESS, props), options)?;
		root.run_mount_side_effects();
		Ok((harness, root, container))
	}

	/// Swaps in `content` and re-renders, returning the number of component passes.
	pub fn render(&self, root: &mut Root<MemorySurface>, content: Vec<Descriptor>) -> usize {
		self.try_render(root, content).expect("flush")
	}

	pub fn try_render(&self, root: &mut Root<MemorySurface>, content: Vec<Descriptor>) -> Result<usize, Error> {
		*self.content.borrow_mut() = content;
		self.rerender.borrow().as_ref().expect("mounted").update(|version| version + 1);
		root.flush()
	}
}

pub fn host(tag: &'static str, props: Props, children: Vec<Descriptor>) -> Descriptor {
	Descriptor::host(tag, props.with_children(children))
}

pub fn div(children: Vec<Descriptor>) -> Descriptor {
	host("div", Props::new(), children)
}

pub fn text(text: &'static str) -> Descriptor {
	Descriptor::text(text)
}
