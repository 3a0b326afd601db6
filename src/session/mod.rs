pub mod history;
pub mod registry;
pub mod state;

pub use history::{ChatHistory, SqliteHistoryStore};
pub use registry::ConversationRegistry;
pub use state::{SessionEvent, SessionState};
