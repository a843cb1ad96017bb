//! Wire envelopes and the local socket harness

pub mod protocol;
mod server;

pub use protocol::{RequestEnvelope, ResponseEnvelope};
pub use server::Server;
