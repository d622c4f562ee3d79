//! Application use cases

mod workspace;

pub use workspace::{InvoiceDraft, Notice, NoticeLevel, Workspace};
