pub mod conversation_key;
pub mod error;
pub mod types;

pub use conversation_key::*;
pub use error::DialogError;
pub use types::*;
