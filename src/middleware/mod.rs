//! The middleware chain: the `Middleware` trait, the fixed step
//! implementations, and per-operation chain assembly.
//!
//! Chains are assembled once per operation at startup by the builder and
//! executed by the router on every matching request: `before` hooks in chain
//! order, the operation handler, then `after` hooks in reverse order.

mod chain;
mod core;
mod steps;

pub use chain::{assemble_chain, OperationContext, Step, StepKind};
pub use core::{Handler, Middleware};
pub use steps::{
    CoercerStep, ContextTagStep, DefaultSetterStep, RequestValidationStep, ResponseValidationStep,
    SecurityStep,
};
