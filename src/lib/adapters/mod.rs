pub mod error;
pub mod http;
pub mod session;
pub mod websocket;

pub use error::AppError;
pub use http::{AppState, ExistingTodo, router};
pub use session::{Flash, FlashStore, SessionId};
