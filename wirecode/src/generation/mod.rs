//! Generation pipeline: model catalog, AI stream consumption, orchestration.
//!
//! One generation attempt moves through an explicit state machine:
//!
//! ```text
//! Idle -> Streaming -> Completed -> Persisted
//!              |            \-> PersistFailed
//!              \-> Failed
//! ```
//!
//! `Persisted` and `Failed` are terminal for the attempt; regeneration starts
//! a fresh attempt. If the stream fails or the model is unknown, nothing is
//! written - the record stays pending. If persistence fails after a completed
//! stream, the accumulated code is still returned to the caller so it can be
//! saved manually.

pub mod catalog;
pub mod orchestrator;
pub mod stream;

pub use orchestrator::{AttemptState, GenerationOutcome, Orchestrator};
pub use stream::{GenerationRequest, StreamEvent, clean_chunk, open_stream};
