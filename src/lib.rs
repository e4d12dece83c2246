//! BriefOS: query dispatch and progressive reveal for the executive briefing
//! canvas.
//!
//! A query runs through the ordered handler chain ([`handlers`]), the result
//! is merged into the canvas ([`merge`]) and revealed over virtual time
//! ([`reveal`], [`typewriter`], [`timeline`]), all owned by the
//! [`engine::CanvasEngine`]. The [`driver`] runs the engine in real time.

pub mod actions;
pub mod driver;
pub mod engine;
pub mod error;
pub mod facts;
pub mod handlers;
pub mod merge;
pub mod normalizer;
pub mod registry;
pub mod reveal;
pub mod state;
pub mod timeline;
pub mod typewriter;
pub mod types;

pub use engine::{CanvasEngine, DispatchOptions};
pub use error::CanvasError;
pub use types::{CanvasSnapshot, Config, Section};
