use igpull_graph::GraphError;
use igpull_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to shape record: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("Could not get user ID from profile")]
    MissingUserId,

    /// `aggregate_all` ran past its overall deadline.
    #[error("aggregation exceeded its {secs}s deadline")]
    DeadlineExceeded { secs: u64 },
}
