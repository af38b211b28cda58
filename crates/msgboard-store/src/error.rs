/// Errors raised when mutating the board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// A POST reached the store with an empty batch.
    #[error("no posts to add")]
    NoPosts,

    /// A restored post has an empty message body.
    #[error("restored post {index} has an empty message")]
    EmptyMessage { index: usize },

    /// Restore is only allowed before any post has been accepted.
    #[error("board already holds {count} posts")]
    BoardNotEmpty { count: usize },
}

pub type Result<T> = std::result::Result<T, ApplyError>;
