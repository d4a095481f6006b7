//! A hook-based component reconciler.
//!
//! Component functions return [`Descriptor`]s. A [`Root`] turns them into a live node tree bound to a [`Surface`],
//! and re-renders only the components whose state changed when [`Root::flush`] is called,
//! patching the surface in place.
//!
//! Children are matched by index only. Reordered lists are patched as in-place replacements.
//!
//! See the README for an example.

#![doc(html_root_url = "https://docs.rs/sapwood/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod build;
mod descriptor;
mod diff;
mod error;
mod hooks;
mod lifecycle;
mod load;
mod memory;
mod props;
mod renderer;
mod scheduler;
mod surface;
mod tree;

#[cfg(any(target_arch = "wasm32", test))]
mod binding_cache;
#[cfg(target_arch = "wasm32")]
mod closure_map;
#[cfg(target_arch = "wasm32")]
mod web;

pub use descriptor::{Component, Descriptor, Element, ElementType, Listener, NodeRef, PropValue, Props, Render, CHILDREN, REF};
pub use error::Error;
pub use hooks::{Cleanup, Dispatch, Hooks, RefHandle, SetState};
pub use memory::{MemoryNode, MemorySurface, MutationStats};
pub use renderer::{mount, run_mount_side_effects, RenderOptions, Root};
pub use scheduler::Phase;
pub use surface::{AttrValue, Surface, SurfaceNodeKind};
#[cfg(target_arch = "wasm32")]
pub use web::DomSurface;
