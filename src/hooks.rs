//! Positional per-component state.
//!
//! A component receives its [`Hooks`] context explicitly. Every hook call claims the next slot of its kind,
//! so call-site N always reads and writes slot N. Hooks must therefore be called unconditionally and in the
//! same order on every invocation of a given instance.

use crate::{
	descriptor::{Listener, NodeRef},
	scheduler::{Lifecycle, Phase, Scheduler},
	tree::NodeId,
};
use core::{
	any::{type_name, Any},
	cell::{Ref, RefCell, RefMut},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{error, trace, warn};

/// Returned by an effect to undo it.
pub type Cleanup = Box<dyn FnOnce()>;

type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

struct EffectSlot {
	deps: Option<Box<dyn Any>>,
	cleanup: Option<Cleanup>,
	pending: Option<Effect>,
}

struct MemoSlot {
	value: Box<dyn Any>,
	deps: Box<dyn Any>,
}

/// The slot sequences of one component instance. Lives exactly as long as its node.
#[derive(Default)]
pub(crate) struct HookStore {
	states: Vec<Box<dyn Any>>,
	effects: Vec<EffectSlot>,
	refs: Vec<Box<dyn Any>>,
	memos: Vec<MemoSlot>,
	invocations: usize,
}

impl HookStore {
	/// Runs effects scheduled by the latest invocations, each after its previous cleanup.
	pub fn run_pending_effects(&mut self) -> usize {
		let mut ran = 0;
		for slot in &mut self.effects {
			if let Some(effect) = slot.pending.take() {
				if let Some(cleanup) = slot.cleanup.take() {
					cleanup();
				}
				slot.cleanup = effect();
				ran += 1;
			}
		}
		ran
	}

	/// Runs every outstanding cleanup.
	///
	/// An effect that never got to run still runs here, and is cleaned up immediately.
	pub fn teardown(&mut self) -> usize {
		let mut cleaned = 0;
		for slot in &mut self.effects {
			if let Some(cleanup) = slot.cleanup.take() {
				cleanup();
				cleaned += 1;
			}
			if let Some(effect) = slot.pending.take() {
				if let Some(cleanup) = effect() {
					cleanup();
					cleaned += 1;
				}
			}
		}
		cleaned
	}

	pub fn has_pending_effects(&self) -> bool {
		self.effects.iter().any(|slot| slot.pending.is_some())
	}
}

#[derive(Debug, Default, Clone, Copy)]
struct Cursor {
	state: usize,
	effect: usize,
	reference: usize,
	memo: usize,
}

/// The hook context handed to a component function during one invocation.
pub struct Hooks<'a> {
	store: &'a mut HookStore,
	cursor: Cursor,
	owner: NodeId,
	lifecycle: &'a Rc<Lifecycle>,
	scheduler: &'a Rc<Scheduler>,
	diagnostics: bool,
}

impl<'a> Hooks<'a> {
	pub(crate) fn new(store: &'a mut HookStore, owner: NodeId, lifecycle: &'a Rc<Lifecycle>, scheduler: &'a Rc<Scheduler>, diagnostics: bool) -> Self {
		Self {
			store,
			cursor: Cursor::default(),
			owner,
			lifecycle,
			scheduler,
			diagnostics,
		}
	}

	/// The name of the component being invoked.
	#[must_use]
	pub fn component_name(&self) -> &'static str {
		self.lifecycle.name()
	}

	/// Completes the invocation, checking the hook count against earlier ones.
	pub(crate) fn finish(self) {
		let Self { store, cursor, lifecycle, diagnostics, .. } = self;
		if diagnostics && store.invocations > 0 {
			let recorded = (store.states.len(), store.effects.len(), store.refs.len(), store.memos.len());
			let used = (cursor.state, cursor.effect, cursor.reference, cursor.memo);
			if used.0 < recorded.0 || used.1 < recorded.1 || used.2 < recorded.2 || used.3 < recorded.3 {
				warn!(
					component = lifecycle.name(),
					?recorded,
					?used,
					"Fewer hooks were called than on a previous invocation.\n\
					Hooks must be called unconditionally and in the same order every time."
				);
			}
		}
		store.invocations += 1;
	}

	fn note_allocation(&self, kind: &'static str, index: usize) {
		if self.diagnostics && self.store.invocations > 0 {
			warn!(
				component = self.lifecycle.name(),
				kind,
				index,
				"A hook slot was allocated after the first invocation. Are hooks called conditionally?"
			);
		}
	}

	fn note_mismatch(&self, kind: &'static str, index: usize, expected: &'static str) {
		error!(
			component = self.lifecycle.name(),
			kind,
			index,
			expected,
			"Hook slot holds a different type than requested; re-initialising it. Hooks were likely called out of order."
		);
	}

	/// A state slot initialised with `initial` on first use.
	pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
		self.use_state_with(move || initial)
	}

	/// A state slot initialised lazily by `init` on first use.
	pub fn use_state_with<T: Clone + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, SetState<T>) {
		let index = self.cursor.state;
		self.cursor.state += 1;

		let existing = self.store.states.get(index).map(|slot| slot.downcast_ref::<Rc<RefCell<T>>>().cloned());
		let cell = match existing {
			Some(Some(cell)) => cell,
			Some(None) => {
				self.note_mismatch("state", index, type_name::<T>());
				let cell = Rc::new(RefCell::new(init()));
				self.store.states[index] = Box::new(Rc::clone(&cell));
				cell
			}
			None => {
				self.note_allocation("state", index);
				let cell = Rc::new(RefCell::new(init()));
				self.store.states.push(Box::new(Rc::clone(&cell)));
				cell
			}
		};

		let value = cell.borrow().clone();
		let setter = SetState {
			cell,
			owner: self.owner,
			lifecycle: Rc::clone(self.lifecycle),
			scheduler: Rc::downgrade(self.scheduler),
		};
		(value, setter)
	}

	/// A state slot updated through `reducer`.
	pub fn use_reducer<S: Clone + 'static, A: 'static>(&mut self, reducer: fn(&S, A) -> S, initial: S) -> (S, Dispatch<S, A>) {
		let (state, set) = self.use_state(initial);
		(state, Dispatch { set, reducer })
	}

	/// Schedules `effect` to run after this commit, and again whenever `deps` differ from the previous invocation's.
	pub fn use_effect<D, F>(&mut self, deps: D, effect: F)
	where
		D: PartialEq + 'static,
		F: FnOnce() -> Option<Cleanup> + 'static,
	{
		self.effect_slot(Some(deps), effect);
	}

	/// Schedules `effect` to run after every commit of this component.
	pub fn use_effect_always<F>(&mut self, effect: F)
	where
		F: FnOnce() -> Option<Cleanup> + 'static,
	{
		self.effect_slot(None::<()>, effect);
	}

	fn effect_slot<D, F>(&mut self, deps: Option<D>, effect: F)
	where
		D: PartialEq + 'static,
		F: FnOnce() -> Option<Cleanup> + 'static,
	{
		let index = self.cursor.effect;
		self.cursor.effect += 1;

		if index >= self.store.effects.len() {
			self.note_allocation("effect", index);
			self.store.effects.push(EffectSlot {
				deps: deps.map(|deps| Box::new(deps) as Box<dyn Any>),
				cleanup: None,
				pending: Some(Box::new(effect)),
			});
			return;
		}

		let slot = &mut self.store.effects[index];
		let unchanged = match (&slot.deps, &deps) {
			(Some(previous), Some(next)) => previous.downcast_ref::<D>() == Some(next),
			_ => false,
		};
		if unchanged {
			trace!(index, "Effect dependencies unchanged.");
			return;
		}
		slot.deps = deps.map(|deps| Box::new(deps) as Box<dyn Any>);
		slot.pending = Some(Box::new(effect));
	}

	/// A mutable reference cell initialised once.
	pub fn use_ref<T: 'static>(&mut self, initial: T) -> RefHandle<T> {
		self.use_ref_with(move || initial)
	}

	pub fn use_ref_with<T: 'static>(&mut self, init: impl FnOnce() -> T) -> RefHandle<T> {
		self.ref_slot(|| RefHandle(Rc::new(RefCell::new(init()))))
	}

	/// A [`NodeRef`] to pass as a host's `ref` property.
	pub fn use_node_ref(&mut self) -> NodeRef {
		self.ref_slot(NodeRef::new)
	}

	fn ref_slot<H: Clone + 'static>(&mut self, init: impl FnOnce() -> H) -> H {
		let index = self.cursor.reference;
		self.cursor.reference += 1;

		let existing = self.store.refs.get(index).map(|slot| slot.downcast_ref::<H>().cloned());
		match existing {
			Some(Some(handle)) => handle,
			Some(None) => {
				self.note_mismatch("ref", index, type_name::<H>());
				let handle = init();
				self.store.refs[index] = Box::new(handle.clone());
				handle
			}
			None => {
				self.note_allocation("ref", index);
				let handle = init();
				self.store.refs.push(Box::new(handle.clone()));
				handle
			}
		}
	}

	/// A value recomputed synchronously whenever `deps` change.
	pub fn use_memo<T, D>(&mut self, deps: D, factory: impl FnOnce() -> T) -> T
	where
		T: Clone + 'static,
		D: PartialEq + 'static,
	{
		let index = self.cursor.memo;
		self.cursor.memo += 1;

		if let Some(slot) = self.store.memos.get(index) {
			if slot.deps.downcast_ref::<D>() == Some(&deps) {
				if let Some(value) = slot.value.downcast_ref::<T>() {
					return value.clone();
				}
				self.note_mismatch("memo", index, type_name::<T>());
			}
			let value = factory();
			self.store.memos[index] = MemoSlot {
				value: Box::new(value.clone()),
				deps: Box::new(deps),
			};
			return value;
		}

		self.note_allocation("memo", index);
		let value = factory();
		self.store.memos.push(MemoSlot {
			value: Box::new(value.clone()),
			deps: Box::new(deps),
		});
		value
	}

	/// A [`Listener`] that keeps its identity while `deps` are unchanged, so it isn't rebound.
	pub fn use_callback<D: PartialEq + 'static>(&mut self, deps: D, handler: impl Fn(&dyn Any) + 'static) -> Listener {
		self.use_memo(deps, move || Listener::new(handler))
	}
}

/// Updates one state slot and schedules its component for a coalesced re-render.
pub struct SetState<T> {
	cell: Rc<RefCell<T>>,
	owner: NodeId,
	lifecycle: Rc<Lifecycle>,
	scheduler: Weak<Scheduler>,
}

impl<T> Clone for SetState<T> {
	fn clone(&self) -> Self {
		Self {
			cell: Rc::clone(&self.cell),
			owner: self.owner,
			lifecycle: Rc::clone(&self.lifecycle),
			scheduler: Weak::clone(&self.scheduler),
		}
	}
}

impl<T> Debug for SetState<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SetState")
			.field("component", &self.lifecycle.name())
			.field("phase", &self.lifecycle.phase())
			.finish_non_exhaustive()
	}
}

impl<T: 'static> SetState<T> {
	pub fn set(&self, value: T) {
		self.update(move |_| value);
	}

	/// Replaces the state with `updater`'s result for the current state.
	pub fn update(&self, updater: impl FnOnce(&T) -> T) {
		if !self.lifecycle.accepts_updates() {
			return error!(
				component = self.lifecycle.name(),
				phase = ?self.lifecycle.phase(),
				"Dropped a state update on a component that is no longer mounted."
			);
		}

		let next = {
			let current = self.cell.borrow();
			updater(&current)
		};
		*self.cell.borrow_mut() = next;
		self.lifecycle.mark_dirty();

		match self.scheduler.upgrade() {
			Some(scheduler) => scheduler.schedule(self.owner, &self.lifecycle),
			None => warn!(component = self.lifecycle.name(), "State updated after its root was dropped."),
		}
	}

	/// The slot's current value, including updates not yet rendered.
	#[must_use]
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.cell.borrow().clone()
	}

	/// Whether updates through this setter are still applied.
	#[must_use]
	pub fn is_live(&self) -> bool {
		self.lifecycle.accepts_updates()
	}

	/// Where the owning component currently is in its lifetime.
	#[must_use]
	pub fn phase(&self) -> Phase {
		self.lifecycle.phase()
	}
}

/// Dispatches actions into a [`Hooks::use_reducer`] slot.
pub struct Dispatch<S, A> {
	set: SetState<S>,
	reducer: fn(&S, A) -> S,
}

impl<S, A> Clone for Dispatch<S, A> {
	fn clone(&self) -> Self {
		Self {
			set: self.set.clone(),
			reducer: self.reducer,
		}
	}
}

impl<S: 'static, A> Dispatch<S, A> {
	pub fn dispatch(&self, action: A) {
		let reducer = self.reducer;
		self.set.update(move |state| reducer(state, action));
	}
}

/// A mutable cell that persists across invocations without scheduling re-renders.
pub struct RefHandle<T>(Rc<RefCell<T>>);

impl<T> Clone for RefHandle<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<T> RefHandle<T> {
	#[must_use]
	pub fn current(&self) -> Ref<'_, T> {
		self.0.borrow()
	}

	#[must_use]
	pub fn current_mut(&self) -> RefMut<'_, T> {
		self.0.borrow_mut()
	}

	pub fn set(&self, value: T) -> T {
		self.0.replace(value)
	}

	#[must_use]
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.0.borrow().clone()
	}
}

impl<T: Debug> Debug for RefHandle<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RefHandle").field(&self.0.borrow()).finish()
	}
}
