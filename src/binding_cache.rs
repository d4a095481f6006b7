//! Values shared by several bindings, kept until the last binding is gone.

use core::hash::Hash;
use hashbrown::HashMap;
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

struct Shared<C, V> {
	bindings: C,
	value: V,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingCountError {
	/// The counter type can't represent another binding.
	Saturated,
	/// Unbound more often than bound.
	Underflow,
}

/// One cached `V` per key, counted in `C`.
///
/// Values whose count drops to zero linger until [`BindingCache::sweep`],
/// so a key that is unbound and rebound within the same pass keeps its value.
pub(crate) struct BindingCache<K, V, C = u16> {
	entries: HashMap<K, Shared<C, V>>,
}

impl<K, V, C> Default for BindingCache<K, V, C> {
	fn default() -> Self {
		Self { entries: HashMap::new() }
	}
}

impl<K, V, C> BindingCache<K, V, C>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
{
	/// Adds a binding of `key`, creating its value first if it isn't cached.
	pub fn bind(&mut self, key: K, create: impl FnOnce(&K) -> V) -> Result<&V, BindingCountError> {
		let shared = self.entries.entry(key).or_insert_with_key(|key| Shared {
			bindings: C::zero(),
			value: create(key),
		});
		shared.bindings = shared.bindings.checked_add(&C::one()).ok_or(BindingCountError::Saturated)?;
		Ok(&shared.value)
	}

	/// Removes a binding of `key` and returns its value, which stays cached until the next sweep.
	pub fn unbind(&mut self, key: &K) -> Result<Option<&V>, BindingCountError> {
		let Some(shared) = self.entries.get_mut(key) else {
			return Ok(None);
		};
		shared.bindings = shared.bindings.checked_sub(&C::one()).ok_or(BindingCountError::Underflow)?;
		Ok(Some(&shared.value))
	}

	/// Drops the values without bindings. Returns how many were dropped.
	pub fn sweep(&mut self) -> usize {
		self.entries.extract_if(|_, shared| shared.bindings.is_zero()).count()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn capacity(&self) -> usize {
		self.entries.capacity()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn values_outlive_their_last_binding_until_swept() {
		let mut cache = BindingCache::<&str, String, u8>::default();
		let mut created = 0;
		for _ in 0..2 {
			let value = cache
				.bind("click", |key| {
					created += 1;
					format!("{}-handler", key)
				})
				.unwrap();
			assert_eq!(value, "click-handler");
		}
		assert_eq!(created, 1);

		assert_eq!(cache.unbind(&"click").unwrap().map(String::as_str), Some("click-handler"));
		assert_eq!(cache.sweep(), 0);
		assert!(cache.unbind(&"click").unwrap().is_some());
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.sweep(), 1);
		assert_eq!(cache.len(), 0);
		assert_eq!(cache.unbind(&"click"), Ok(None));
	}

	#[test]
	fn counts_are_checked() {
		let mut cache = BindingCache::<u32, (), u8>::default();
		for _ in 0..u8::MAX {
			cache.bind(1, |_| ()).unwrap();
		}
		assert_eq!(cache.bind(1, |_| ()), Err(BindingCountError::Saturated));

		cache.bind(2, |_| ()).unwrap();
		cache.unbind(&2).unwrap();
		assert_eq!(cache.unbind(&2), Err(BindingCountError::Underflow));
	}
}
