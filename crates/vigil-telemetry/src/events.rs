//! Telemetry event payloads
//!
//! Everything here is pure payload construction; delivery lives behind
//! [`crate::traits::EventTransport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page-leave events shorter than this are considered noise and dropped
pub const MIN_PAGE_LEAVE_SECONDS: i64 = 5;

/// Wire envelope for `POST /api/track-activity`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackActivityRequest {
    pub activity_type: String,
    pub data: serde_json::Value,
}

/// Page view: fired once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewData {
    pub page: String,
    pub referrer: String,
    pub timestamp: DateTime<Utc>,
}

/// Page leave: how long the viewer stayed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLeaveData {
    pub page: String,
    pub time_spent_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Form submit: carries the input length, never the content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmitData {
    pub form: String,
    pub input_length: usize,
    pub timestamp: DateTime<Utc>,
}

impl TrackActivityRequest {
    fn envelope(activity_type: &str, data: &impl Serialize) -> Self {
        Self {
            activity_type: activity_type.to_string(),
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Build the page-view event
    #[must_use]
    pub fn page_view(page: &str, referrer: &str, now: DateTime<Utc>) -> Self {
        Self::envelope(
            "page_view",
            &PageViewData {
                page: page.to_string(),
                referrer: referrer.to_string(),
                timestamp: now,
            },
        )
    }

    /// Build the page-leave event
    ///
    /// Returns `None` unless the time on page strictly exceeds
    /// [`MIN_PAGE_LEAVE_SECONDS`].
    #[must_use]
    pub fn page_leave(page: &str, time_spent_seconds: i64, now: DateTime<Utc>) -> Option<Self> {
        if time_spent_seconds <= MIN_PAGE_LEAVE_SECONDS {
            return None;
        }
        Some(Self::envelope(
            "page_leave",
            &PageLeaveData {
                page: page.to_string(),
                time_spent_seconds,
                timestamp: now,
            },
        ))
    }

    /// Build the form-submit event
    ///
    /// Returns `None` when the tracked field is empty after trimming. The
    /// payload carries the raw (untrimmed) character count.
    #[must_use]
    pub fn form_submit(form: &str, field_value: &str, now: DateTime<Utc>) -> Option<Self> {
        if field_value.trim().is_empty() {
            return None;
        }
        Some(Self::envelope(
            "form_submit",
            &FormSubmitData {
                form: form.to_string(),
                input_length: field_value.chars().count(),
                timestamp: now,
            },
        ))
    }
}
