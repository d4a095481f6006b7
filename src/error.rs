use thiserror::Error;

/// Failures that abort a build, patch or binding pass.
///
/// Lifecycle-contract violations (like setting state on an unmounted component) are not among these.
/// They are logged and dropped instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	#[error("<{tag}> is a void element and can't have children")]
	VoidElementChildren { tag: String },

	#[error("the root descriptor must be a component element")]
	RootNotComponent,

	#[error("expected {expected} while binding to the surface, but found nothing")]
	SurfaceNodeMissing { expected: String },

	#[error("expected {expected} while binding to the surface, but found {found}")]
	SurfaceNodeMismatch { expected: String, found: String },

	#[error("depth limit of {limit} reached")]
	DepthLimit { limit: usize },

	#[error("more than {limit} re-render passes in a single flush")]
	UpdateLimit { limit: usize },
}
