pub mod connection;
pub mod feedback;
pub mod migrations;
pub mod sessions;

pub use connection::{connect, connect_with_settings, DbPool};
pub use feedback::{
    FeedbackRepository, InMemoryFeedbackRepository, RepositoryError, SqlFeedbackRepository,
};
pub use sessions::SqlSessionBackend;
