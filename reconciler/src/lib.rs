//! Live argument stream reconciliation.
//!
//! This library turns the live event stream of a turn-based argument into
//! one consistent view:
//! - Event decoding into a closed set of typed events (`events`)
//! - The ordered ledger of finalized turns and in-flight drafts (`transcript`)
//! - Per-turn badges, the reaction log, and the live phase (`signals`)
//! - Session status, the one-shot report fetch, and stream health (`lifecycle`)
//! - The reducer and engine that route inputs between them (`engine`)
//!
//! # Usage
//!
//! ```
//! use reconciler::{Effect, Engine};
//!
//! let mut engine = Engine::default();
//! engine.ingest_raw(r#"{"event_type":"turn.token","turn_index":1,
//!     "payload":{"speaker_participant_id":"p1","token":"Hel"}}"#);
//! engine.ingest_raw(r#"{"event_type":"turn.token","turn_index":1,
//!     "payload":{"speaker_participant_id":"p1","token":"lo"}}"#);
//! assert_eq!(engine.snapshot().draft(1).unwrap().content, "Hello");
//!
//! let effects = engine.ingest_raw(r#"{"event_type":"argument.completed","payload":{}}"#);
//! assert_eq!(effects, vec![Effect::FetchReport]);
//! ```
//!
//! The engine performs no I/O. Callers run returned effects and feed their
//! results back in as inputs.

pub mod engine;
pub mod events;
pub mod lifecycle;
pub mod model;
pub mod signals;
pub mod transcript;

pub use engine::{
    reduce, ApplyStats, Effect, Engine, EngineConfig, Input, SessionAction, StatusLine,
    ViewSnapshot, ViewState,
};
pub use events::{decode, DecodeError, Decoded, Envelope, StreamEvent};
pub use lifecycle::{
    Completion, ConnectionHealth, LifecycleController, ReportState, SessionStatus,
};
pub use model::SessionSnapshot;
pub use signals::{Badge, Reaction};
pub use transcript::{ArgumentPhase, Draft, Turn};
