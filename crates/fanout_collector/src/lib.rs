//! The in-memory model of a discovered test suite.
//!
//! A [`SuiteTree`] is built once per run from the framework's discovery
//! result and gives every test method and every broken module a stable
//! position in discovery order.

mod discovered;
mod tree;
mod unit;

pub use discovered::{DiscoveredClass, DiscoveredMethod, DiscoveredModule};
pub use tree::{ClassNode, DiscoveryFailure, ModuleNode, SuiteTree};
pub use unit::{TestUnit, UnitId};
