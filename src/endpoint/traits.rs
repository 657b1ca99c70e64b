use async_trait::async_trait;

use crate::{
    error::FanoutError,
    model::{ModelRequest, ModelResponse},
};

/// A hosted model that can be invoked by name.
///
/// One endpoint may serve several model ids; the dispatcher passes the id it
/// resolved the endpoint under with every call.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    async fn call(
        &self,
        model_id: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse, FanoutError>;
}
