//! Ports the service layer depends on

mod quota;
mod repositories;
mod transport;

pub use quota::{QuotaDecision, QuotaPolicy, QuotaStore};
pub use repositories::{MessageRepository, RepoResult, RoomRepository, UserRepository};
pub use transport::Transport;
