use serde::Serialize;

use super::{AuthService, PostService};
use crate::api::ApiError;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub posts: u64,
    pub teachers: usize,
    pub students: usize,
}

/// Fetch post, teacher and student counts concurrently.
///
/// The post count comes from the pagination total of a one-item page.
pub async fn dashboard_counts(
    auth: &AuthService,
    posts: &PostService,
) -> Result<DashboardCounts, ApiError> {
    let (page, teachers, students) =
        futures::try_join!(posts.list_all(1, 1), auth.teachers(), auth.students())?;

    Ok(DashboardCounts {
        posts: page.total,
        teachers: teachers.len(),
        students: students.len(),
    })
}
