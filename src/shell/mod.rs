// Composition root.
//
// Responsibilities
// - Read settings from the environment.
// - Build the state store client and the event store.
// - Expose the stream routes over HTTP.

pub mod config;
pub mod http;
pub mod state;
