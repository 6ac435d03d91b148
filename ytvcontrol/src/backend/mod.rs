//! Data-driven media player selection.
//!
//! Each OS has an ordered list of [`BackendDescriptor`]s. The
//! [`BackendResolver`] probes them in order and hands out the ones whose
//! executable is installed. Adding a player is a table entry, not a new
//! branch in the controller.

mod descriptor;
mod resolver;
mod table;

pub use descriptor::{ArgTemplate, BackendDescriptor, ControlTarget, Locator};
pub use resolver::{BackendResolver, ResolvedBackend};
pub use table::BackendTable;
