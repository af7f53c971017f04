pub mod broadcaster;
pub mod error;
pub mod message;
pub mod todo;

pub use broadcaster::*;
pub use error::*;
pub use message::*;
pub use todo::*;
