//! Derby Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction that lets the Derby race
//! engines run both against a **real** clock (tokio) and a **virtual** one
//! (simulation and tests).
//!
//! # Core Concept
//!
//! Everything non-deterministic that the engines touch is intercepted here:
//! - Time (`now()`, `system_time()`, `sleep()` between host frames)
//! - Randomness (`random()` hands out the context's `RandomSource`)
//!
//! Swapping a `SimContext` seeded with `42` (or backed by a
//! `ScriptedRandom`) for the production `TokioContext` makes a whole
//! tournament reproducible.
//!
//! # Example
//!
//! ```ignore
//! use derby_env::{RaceContext, RandomSourceExt, SimContext};
//!
//! let ctx = SimContext::new(42);
//! let lanes = ctx.random().shuffle(&[1, 2, 3, 4]);
//! ctx.advance_time(Duration::from_millis(16));
//! ```

mod context;
mod error;
mod random;
mod sim_impl;
mod tokio_impl;
mod types;

pub use context::RaceContext;
pub use error::EnvError;
pub use random::{ChaChaRandom, RandomSource, RandomSourceExt, ScriptedRandom};
pub use sim_impl::SimContext;
pub use tokio_impl::TokioContext;
pub use types::unique_token;
