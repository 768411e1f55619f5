//! JIT compilation of typed value expressions to native code via Cranelift.
//!
//! [`compile_function`] creates a fresh JIT module, declares one function and
//! hands a [`JitFunction`] to the caller's body closure. Values produced
//! inside the body borrow that context; mutable variables are explicit stack
//! slots.
//!
//! # Function Signatures
//!
//! Parameters and the return value map from [`JitTypeTag`](crate::JitTypeTag)
//! to native types using the platform C calling convention:
//!
//! - **BOOL**: `u8` holding 0 or 1
//! - **INT8..INT64**: `i8`..`i64`
//! - **FLOAT / DOUBLE**: `f32` / `f64`
//! - **POINTER**: `*const u8`
//! - **VOID**: no return value


mod driver;
mod function;
mod helpers;

pub use driver::{compile_function, JitFn};
pub use function::{JitFunction, JitLiteral};
