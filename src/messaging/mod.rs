//! # Messaging Module
//!
//! Addressed command messages, single-reply envelopes and the in-process bus
//! that routes them by resource UUID.

pub mod bus;
pub mod message;

pub use bus::{Mailbox, MessageBus};
pub use message::{
    Command, CommandClass, CommandKind, Envelope, Message, Reply, ReplyPayload, ReplyResponder,
};
