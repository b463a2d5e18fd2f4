//! Events pushed to connections

mod server_event;

pub use server_event::{MessageView, ReplyPreview, ServerEvent, UserSummary};
