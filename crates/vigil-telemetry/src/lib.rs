pub mod client;
pub mod events;
pub mod reporter;
pub mod traits;

pub use client::CollectorClient;
pub use events::{
    FormSubmitData, PageLeaveData, PageViewData, TrackActivityRequest, MIN_PAGE_LEAVE_SECONDS,
};
pub use reporter::{ActivityReporter, PageContext};
pub use traits::EventTransport;
