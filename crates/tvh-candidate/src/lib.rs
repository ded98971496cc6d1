//! TVH Candidate: plugin-style loading of implementations under test.
//!
//! A candidate is an opaque unit exposing a fixed capability set. The
//! loader resolves the candidate's factory from an explicit
//! [`CandidateRegistry`], instantiates it (this runs arbitrary candidate
//! code — no isolation is provided), and pairs each capability's callable
//! with its raw source text so the anti-cheat analyzer can inspect it.
//!
//! # Flow
//!
//! ```text
//! source path → read text → resolve factory → instantiate
//!             → tokenize capability sources → validate capability set
//!             → LoadedCandidate
//! ```

pub mod loader;
pub mod registry;
pub mod samples;
pub mod source;

pub use loader::{LoadedCandidate, ModuleLoader};
pub use registry::{CandidateRegistry, CapArg, Capability, CapabilityFn, CapabilityMap};
