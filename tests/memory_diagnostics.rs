use sapwood::{Component, Descriptor, Hooks, MemorySurface, Props, RenderOptions, Root, SetState};
use std::{
	cell::{Cell, RefCell},
	io,
	sync::{Arc, Mutex},
};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output so tests can search it.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
	}
}

impl io::Write for Captured {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> MakeWriter<'a> for Captured {
	type Writer = Self;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

thread_local! {
	static EXTRA_HOOK: Cell<bool> = Cell::new(false);
	static RERENDER: RefCell<Option<SetState<u32>>> = RefCell::new(None);
}

fn drifting(hooks: &mut Hooks<'_>, _: &Props) -> Descriptor {
	let (version, rerender) = hooks.use_state(0_u32);
	RERENDER.with(|slot| *slot.borrow_mut() = Some(rerender));
	if EXTRA_HOOK.with(Cell::get) {
		let _ = hooks.use_ref(());
	}
	version.into()
}

/// Mounts with the extra hook as `before`, re-renders with it as `after`, and returns the log.
fn render_twice(before: bool, after: bool, hook_diagnostics: bool) -> String {
	let captured = Captured::default();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(captured.clone())
		.with_ansi(false)
		.with_max_level(tracing::Level::WARN)
		.finish();

	tracing::subscriber::with_default(subscriber, || {
		EXTRA_HOOK.with(|extra| extra.set(before));
		let options = RenderOptions {
			hook_diagnostics,
			..RenderOptions::default()
		};
		let (surface, container) = MemorySurface::with_container();
		let mut root = Root::mount_with_options(surface, container, Descriptor::component(Component::new("Drifting", drifting), Props::new()), options).unwrap();
		root.run_mount_side_effects();

		EXTRA_HOOK.with(|extra| extra.set(after));
		RERENDER.with(|slot| slot.borrow().as_ref().unwrap().update(|version| version + 1));
		assert_eq!(root.flush(), Ok(1));
		assert_eq!(root.surface().inner_html(container), "1");
	});
	captured.text()
}

#[test]
fn fewer_hooks_are_reported() {
	let log = render_twice(true, false, true);
	assert!(log.contains("Fewer hooks were called than on a previous invocation."), "{}", log);
	assert!(log.contains("Drifting"), "{}", log);
}

#[test]
fn late_allocations_are_reported() {
	let log = render_twice(false, true, true);
	assert!(log.contains("A hook slot was allocated after the first invocation."), "{}", log);
	assert!(!log.contains("Fewer hooks"), "{}", log);
}

#[test]
fn stable_hooks_are_quiet() {
	let log = render_twice(true, true, true);
	assert!(!log.contains("hook"), "{}", log);
}

#[test]
fn diagnostics_can_be_disabled() {
	let log = render_twice(true, false, false);
	assert!(!log.contains("Fewer hooks"), "{}", log);
}
