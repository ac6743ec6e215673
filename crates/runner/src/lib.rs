//! # Fragment Runner
//!
//! Test-time half of the bridge: makes sure the generated module for a test file is
//! reachable in the remote context, finds the requested fragment and runs it.
//!
//! ```text
//! RunRequest { content_hash, target, data }
//!     │
//!     ├──> AwaitingRegistry ── miss ──> reload, timeout × factor ──┐
//!     │        ▲                                                  │
//!     │        └──────────────────────────────────────────────────┘
//!     │        └── cumulative wait ≥ ceiling ──> Failed (RegistryTimeout)
//!     │
//!     ├──> Loaded: load record { named, anonymous } → resolve target
//!     │        └── miss ──> UnmatchedFunction
//!     │
//!     └──> Invoke: record[section][key](data) → JSON result
//! ```
//!
//! The remote side is reached only through [`RemoteAdapter`] and the scripts in
//! [`scripts`].

mod adapter;
mod error;
mod record;
mod request;
mod runner;
pub mod scripts;
mod wait;

pub use adapter::RemoteAdapter;
pub use error::{RemoteError, Result, RunnerError};
pub use record::{CandidateRecord, ResolvedFragment, Section};
pub use request::{FragmentTarget, RunRequest};
pub use runner::{Runner, WaitReport};
pub use wait::{Attempt, RetryPolicy, WaitState};
