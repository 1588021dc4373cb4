//! Convergence engine — plans the actions that bring the host to the desired
//! identity and applies them.
//!
//! The `planner` module builds the ordered action list and its notification
//! edges. The `executor` module applies it, tracking which actions changed
//! the host and firing notifications on change.

pub mod executor;
pub mod planner;

pub use executor::{ConvergenceExecutor, ConvergenceResult};
pub use planner::ActionPlanner;
