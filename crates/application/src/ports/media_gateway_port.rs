//! Media gateway port - audio delivery through the third-party gateway

use async_trait::async_trait;
use domain::RecipientId;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for sending media messages
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaGatewayPort: Send + Sync {
    /// Send an audio message the gateway downloads from `media_url`
    async fn send_audio(
        &self,
        recipient: &RecipientId,
        media_url: &str,
    ) -> Result<String, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn MediaGatewayPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn MediaGatewayPort>();
    }
}
