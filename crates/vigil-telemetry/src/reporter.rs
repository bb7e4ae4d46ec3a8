use chrono::{DateTime, Utc};
use std::sync::Arc;
use vigil_core::AuthState;

use crate::events::TrackActivityRequest;
use crate::traits::EventTransport;

/// The page this reporter instance is running on
#[derive(Debug, Clone)]
pub struct PageContext {
    pub path: String,
    pub referrer: String,
}

/// Fire-and-forget activity telemetry
///
/// Stateless aside from the page-load timestamp captured at construction.
/// Every operation is a no-op while the shared [`AuthState`] reads false,
/// and delivery failure is swallowed (debug log only) - never retried,
/// never surfaced to the caller.
pub struct ActivityReporter {
    transport: Arc<dyn EventTransport>,
    auth: Arc<AuthState>,
    page: PageContext,
    page_loaded_at: DateTime<Utc>,
}

impl ActivityReporter {
    #[must_use]
    pub fn new(
        transport: Arc<dyn EventTransport>,
        auth: Arc<AuthState>,
        page: PageContext,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            transport,
            auth,
            page,
            page_loaded_at: now,
        }
    }

    /// Report the initial page view
    pub async fn report_page_view(&self, now: DateTime<Utc>) {
        if !self.auth.is_authenticated() {
            return;
        }
        let event = TrackActivityRequest::page_view(&self.page.path, &self.page.referrer, now);
        self.send(&event).await;
    }

    /// Report page teardown with time spent on page
    ///
    /// Dropped entirely when the viewer stayed 5 seconds or less; otherwise
    /// delivered on the beacon path so it survives teardown.
    pub async fn report_page_leave(&self, now: DateTime<Utc>) {
        if !self.auth.is_authenticated() {
            return;
        }
        let elapsed = (now - self.page_loaded_at).num_seconds();
        let Some(event) = TrackActivityRequest::page_leave(&self.page.path, elapsed, now) else {
            return;
        };
        if let Err(e) = self.transport.deliver_final(&event).await {
            log::debug!("Activity tracking failed: {e}");
        }
    }

    /// Report a submission of the designated form
    ///
    /// Emits only when the tracked field is non-empty after trimming; the
    /// payload carries the input length, not the content.
    pub async fn report_form_submit(&self, form: &str, field_value: &str, now: DateTime<Utc>) {
        if !self.auth.is_authenticated() {
            return;
        }
        let Some(event) = TrackActivityRequest::form_submit(form, field_value, now) else {
            return;
        };
        self.send(&event).await;
    }

    async fn send(&self, event: &TrackActivityRequest) {
        if let Err(e) = self.transport.deliver(event).await {
            log::debug!("Activity tracking failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<TrackActivityRequest>>,
        finals: Mutex<Vec<TrackActivityRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl EventTransport for RecordingTransport {
        async fn deliver(&self, event: &TrackActivityRequest) -> Result<()> {
            if self.fail {
                anyhow::bail!("collector unreachable");
            }
            self.delivered.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn deliver_final(&self, event: &TrackActivityRequest) -> Result<()> {
            if self.fail {
                anyhow::bail!("collector unreachable");
            }
            self.finals.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn page_load() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn reporter(
        authenticated: bool,
        fail: bool,
    ) -> (ActivityReporter, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport {
            fail,
            ..RecordingTransport::default()
        });
        let reporter = ActivityReporter::new(
            transport.clone(),
            Arc::new(AuthState::new(authenticated)),
            PageContext {
                path: "/translate".to_string(),
                referrer: "https://example.com".to_string(),
            },
            page_load(),
        );
        (reporter, transport)
    }

    #[tokio::test]
    async fn test_page_view_delivers_once() {
        let (reporter, transport) = reporter(true, false);

        reporter.report_page_view(page_load()).await;

        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].activity_type, "page_view");
        assert_eq!(delivered[0].data["page"], "/translate");
    }

    #[tokio::test]
    async fn test_page_leave_respects_minimum_and_uses_beacon_path() {
        let (reporter, transport) = reporter(true, false);

        // 5 seconds on page: nothing at all
        reporter
            .report_page_leave(page_load() + Duration::seconds(5))
            .await;
        assert!(transport.finals.lock().unwrap().is_empty());

        // 6 seconds: exactly one beacon send, nothing on the regular path
        reporter
            .report_page_leave(page_load() + Duration::seconds(6))
            .await;
        let finals = transport.finals.lock().unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].activity_type, "page_leave");
        assert_eq!(finals[0].data["time_spent_seconds"], 6);
        assert!(transport.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_form_submit_skips_blank_input() {
        let (reporter, transport) = reporter(true, false);

        reporter
            .report_form_submit("translation", "  \t ", page_load())
            .await;
        assert!(transport.delivered.lock().unwrap().is_empty());

        reporter
            .report_form_submit("translation", "hello", page_load())
            .await;
        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].data["input_length"], 5);
    }

    #[tokio::test]
    async fn test_unauthenticated_viewer_sends_nothing() {
        let (reporter, transport) = reporter(false, false);

        reporter.report_page_view(page_load()).await;
        reporter
            .report_page_leave(page_load() + Duration::seconds(60))
            .await;
        reporter
            .report_form_submit("translation", "hello", page_load())
            .await;

        assert!(transport.delivered.lock().unwrap().is_empty());
        assert!(transport.finals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let (reporter, _transport) = reporter(true, true);

        // Nothing to assert beyond "does not panic, returns normally"
        reporter.report_page_view(page_load()).await;
        reporter
            .report_page_leave(page_load() + Duration::seconds(60))
            .await;
        reporter
            .report_form_submit("translation", "hello", page_load())
            .await;
    }
}
