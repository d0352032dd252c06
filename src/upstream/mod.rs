pub mod sportmonks;

pub use sportmonks::SportMonksClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// A remote data provider the scheduler can poll.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issue one GET for `endpoint` with the given query parameters and return
    /// the decoded JSON body. No retries.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
