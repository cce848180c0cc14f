pub mod reducer;
pub mod transcript;

pub use reducer::{Conversation, SendOutcome};
pub use transcript::Transcript;
