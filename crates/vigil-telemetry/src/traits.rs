use crate::events::TrackActivityRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Delivery seam for telemetry events
///
/// The reporter only talks to this trait, so its gating logic is testable
/// without a network.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Deliver one event to the collector
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the collector rejects it.
    async fn deliver(&self, event: &TrackActivityRequest) -> Result<()>;

    /// Best-effort delivery for page teardown
    ///
    /// Beacon-style: short timeout, response ignored. Used for the
    /// page-leave event, which must not block or outlive teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent at all.
    async fn deliver_final(&self, event: &TrackActivityRequest) -> Result<()>;
}
