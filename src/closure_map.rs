use crate::{binding_cache::BindingCache, descriptor::Listener};
use js_sys::Function;
use tracing::{error, trace, warn, Level, level_filters::STATIC_MAX_LEVEL};
use wasm_bindgen::{closure::Closure, JsCast};

type EventClosure = Closure<dyn Fn(web_sys::Event)>;

fn function(closure: &EventClosure) -> Function {
	closure.as_ref().unchecked_ref::<Function>().clone()
}

/// One JavaScript closure per distinct [`Listener`], shared by all bindings of it.
#[derive(Default)]
pub(crate) struct ClosureMap(BindingCache<Listener, EventClosure>);

impl ClosureMap {
	/// Returns the function to register for `listener`, creating it if necessary.
	pub fn acquire(&mut self, listener: &Listener) -> Option<Function> {
		let bound = self.0.bind(listener.clone(), |listener| {
			let listener = listener.clone();
			Closure::wrap(Box::new(move |event: web_sys::Event| listener.call(&event)) as Box<dyn Fn(web_sys::Event)>)
		});
		match bound {
			Ok(closure) => Some(function(closure)),
			Err(error) => {
				error!(?listener, ?error, "Too many (more than 65k) active bindings of the same listener.");
				None
			}
		}
	}

	/// Returns the function that was registered for `listener`. It stays alive until [`ClosureMap::collect`].
	pub fn release(&mut self, listener: &Listener) -> Option<Function> {
		match self.0.unbind(listener) {
			Ok(Some(closure)) => Some(function(closure)),
			Ok(None) => {
				warn!(?listener, "Released a listener that was never bound.");
				None
			}
			Err(error) => {
				error!(?listener, ?error, "Released a listener more often than it was bound.");
				None
			}
		}
	}

	/// Drops closures with no remaining bindings.
	pub fn collect(&mut self) {
		let freed = self.0.sweep();
		trace!(freed, "Freed event closures.");
		if STATIC_MAX_LEVEL >= Level::WARN && self.0.capacity() >= 1000 {
			warn!(
				"The event closure cache capacity is large ({}).\n\
				This may point to listeners being recreated on every render. Consider `use_callback`.",
				self.0.capacity()
			);
		}
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}
}
