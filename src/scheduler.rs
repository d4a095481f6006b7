//! Deferred, coalesced re-render bookkeeping.
//!
//! State setters never touch the tree. They flag the owning component's [`Lifecycle`] and enqueue it here;
//! [`Root::flush`](`crate::Root::flush`) drains the queue at the next turn boundary.

use crate::tree::NodeId;
use core::cell::{Cell, RefCell};
use std::{collections::VecDeque, rc::Rc};
use tracing::trace;

/// Where a component instance is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	/// Built and committed, but its mount effects haven't run yet.
	Mounting,
	Mounted,
	/// Its unmount traversal is running.
	Unmounting,
	/// Terminal.
	Unmounted,
}

/// Per-component flags shared between its tree node and its state setters.
#[derive(Debug)]
pub(crate) struct Lifecycle {
	name: &'static str,
	phase: Cell<Phase>,
	dirty: Cell<bool>,
	scheduled: Cell<bool>,
}

impl Lifecycle {
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			phase: Cell::new(Phase::Mounting),
			dirty: Cell::new(false),
			scheduled: Cell::new(false),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn phase(&self) -> Phase {
		self.phase.get()
	}

	pub fn set_phase(&self, phase: Phase) {
		trace!(component = self.name, from = ?self.phase.get(), to = ?phase, "Lifecycle transition.");
		self.phase.set(phase);
	}

	pub fn accepts_updates(&self) -> bool {
		matches!(self.phase.get(), Phase::Mounting | Phase::Mounted)
	}

	pub fn mark_dirty(&self) {
		self.dirty.set(true);
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty.get()
	}

	/// Called right before the component function is (re-)invoked.
	///
	/// Setter calls from here on schedule a follow-up pass.
	pub fn begin_render(&self) {
		self.dirty.set(false);
		self.scheduled.set(false);
	}
}

/// The single-threaded queue of components waiting for a re-render.
#[derive(Default)]
pub(crate) struct Scheduler {
	queue: RefCell<VecDeque<(NodeId, Rc<Lifecycle>)>>,
	waker: RefCell<Option<Rc<dyn Fn()>>>,
}

impl Scheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Enqueues `id` unless it is already waiting.
	pub fn schedule(&self, id: NodeId, lifecycle: &Rc<Lifecycle>) {
		if lifecycle.scheduled.replace(true) {
			trace!(component = lifecycle.name(), "Re-render already scheduled.");
			return;
		}

		let was_idle = {
			let mut queue = self.queue.borrow_mut();
			queue.push_back((id, Rc::clone(lifecycle)));
			queue.len() == 1
		};
		trace!(component = lifecycle.name(), "Scheduled re-render.");

		if was_idle {
			let waker = self.waker.borrow().clone();
			if let Some(waker) = waker {
				waker();
			}
		}
	}

	/// Puts a popped entry back at the front, keeping its `scheduled` flag.
	pub fn requeue(&self, id: NodeId, lifecycle: Rc<Lifecycle>) {
		self.queue.borrow_mut().push_front((id, lifecycle));
	}

	/// Removes the waiting entry with the smallest `key`, the earliest one among equals.
	pub fn pop_min_by_key(&self, key: impl Fn(NodeId) -> usize) -> Option<(NodeId, Rc<Lifecycle>)> {
		let mut queue = self.queue.borrow_mut();
		let (index, _) = queue.iter().enumerate().min_by_key(|(_, (id, _))| key(*id))?;
		queue.remove(index)
	}

	pub fn len(&self) -> usize {
		self.queue.borrow().len()
	}

	pub fn set_waker(&self, waker: Option<Rc<dyn Fn()>>) {
		*self.waker.borrow_mut() = waker;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use slotmap::KeyData;

	#[test]
	fn schedules_once_until_render_begins() {
		let scheduler = Scheduler::new();
		let lifecycle = Rc::new(Lifecycle::new("Test"));
		let id = NodeId::from(KeyData::from_ffi(1));

		scheduler.schedule(id, &lifecycle);
		scheduler.schedule(id, &lifecycle);
		assert_eq!(scheduler.len(), 1);

		lifecycle.begin_render();
		scheduler.schedule(id, &lifecycle);
		assert_eq!(scheduler.len(), 2);
	}

	#[test]
	fn pops_smallest_key_first() {
		let scheduler = Scheduler::new();
		let deep = NodeId::from(KeyData::from_ffi(1));
		let shallow = NodeId::from(KeyData::from_ffi(2));
		let also_shallow = NodeId::from(KeyData::from_ffi(3));
		scheduler.schedule(deep, &Rc::new(Lifecycle::new("Deep")));
		scheduler.schedule(shallow, &Rc::new(Lifecycle::new("Shallow")));
		scheduler.schedule(also_shallow, &Rc::new(Lifecycle::new("AlsoShallow")));

		let depth = |id: NodeId| if id == deep { 5 } else { 1 };
		let order: Vec<NodeId> = core::iter::from_fn(|| scheduler.pop_min_by_key(depth).map(|(id, _)| id)).collect();
		assert_eq!(order, [shallow, also_shallow, deep]);
	}

	#[test]
	fn wakes_only_when_becoming_busy() {
		let scheduler = Scheduler::new();
		let wakes = Rc::new(Cell::new(0));
		scheduler.set_waker(Some(Rc::new({
			let wakes = Rc::clone(&wakes);
			move || wakes.set(wakes.get() + 1)
		})));

		let a = Rc::new(Lifecycle::new("A"));
		let b = Rc::new(Lifecycle::new("B"));
		scheduler.schedule(NodeId::from(KeyData::from_ffi(1)), &a);
		scheduler.schedule(NodeId::from(KeyData::from_ffi(2)), &b);
		assert_eq!(wakes.get(), 1);

		while scheduler.pop_min_by_key(|_| 0).is_some() {}
		a.begin_render();
		scheduler.schedule(NodeId::from(KeyData::from_ffi(1)), &a);
		assert_eq!(wakes.get(), 2);
	}
}
