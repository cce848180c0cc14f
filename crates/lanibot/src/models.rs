//! These models represent the objects passed between the chat front end and the backend
//!
//! - turns, which make up the transcript shown to the cadet
//! - the request envelope posted to the chat endpoint
//! - session parameters chosen on the selection screen
//! - static questions served by the question endpoint
//!
//! The serialized forms match the backend's JSON exactly, so the same structs are
//! used for the wire format and for local state.
pub mod question;
pub mod request;
pub mod role;
pub mod turn;
