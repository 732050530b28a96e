use std::time::Duration;

use async_trait::async_trait;
use sagechat_types::WireMessage;

use crate::EndpointError;

/// The proxy endpoint as seen from the client.
///
/// Futures are not required to be `Send` so browser implementations can
/// hold JS handles across awaits.
#[async_trait(?Send)]
pub trait ChatEndpoint {
    /// Send the whole conversation and return the assistant reply
    async fn send(&self, messages: &[WireMessage]) -> Result<WireMessage, EndpointError>;
}

/// Source of retry delays
#[async_trait(?Send)]
pub trait Timer {
    async fn sleep(&self, delay: Duration);
}
