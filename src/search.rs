//! Search execution: the orchestrator, its result type and the persisted
//! search state built around it.

pub mod execution;
pub mod export;
pub mod notify;
pub mod orchestrator;
pub mod saved;

pub use self::execution::{SearchExecution, last_page};
pub use self::export::ExportTable;
pub use self::notify::{NotificationEntry, notification_entries, notification_text};
pub use self::orchestrator::{SearchOrchestrator, SearchRequest};
pub use self::saved::SavedSearch;
