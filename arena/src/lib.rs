//! Arena - single-flight agent exercise orchestrator.
//!
//! A conversation between scripted participants runs as one task at a time;
//! a human can inject input out-of-band through the input bridge, and every
//! conversation event fans out to websocket observers.

pub mod actors;
pub mod api;
pub mod app_state;
pub mod config;
pub mod driver;
pub mod input_bridge;
