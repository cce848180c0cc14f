//! Client side of the chat streaming protocol
//!
//! The response body of the chat endpoint is a sequence of `data: <payload>` lines.
//! Bytes are decoded incrementally ([`decoder`]), each complete line is classified
//! ([`frame`]), and the result is exposed as a lazy sequence of [`event::StreamEvent`]s
//! that always ends in exactly one terminal event ([`client`]).
pub mod client;
pub mod decoder;
pub mod event;
pub mod frame;

pub use client::{frame_events, ChatClient};
pub use event::StreamEvent;
