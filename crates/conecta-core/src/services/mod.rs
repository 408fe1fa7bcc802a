//! Per-resource services over the shared `ApiClient`.
//!
//! Each method returns the unwrapped resource (or a `PaginatedResponse`) on
//! success and the original `ApiError` on failure. Presenting errors is the
//! caller's job.

pub mod auth;
pub mod dashboard;
pub mod posts;

pub use auth::AuthService;
pub use dashboard::{dashboard_counts, DashboardCounts};
pub use posts::{PostQuery, PostService, DEFAULT_PAGE_SIZE};
