//! Order domain logic
//!
//! - [`transitions`] - state machine and role permission table
//! - [`pricing`] - decimal money arithmetic and cart totals
//! - [`pipeline`] - order creation (validate, snapshot, persist)
//! - [`assignment`] - driver claim coordination

pub mod assignment;
pub mod pipeline;
pub mod pricing;
pub mod transitions;

pub use transitions::TransitionActor;
