//! Post and comment operations against `/posts/*`.

use serde::Serialize;

use crate::api::{path_id, ApiClient, ApiError, ApiRequest};
use crate::models::{NewPost, PaginatedResponse, Post, PostUpdate};

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Listing filters for the public feed.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub page: u32,
    pub limit: u32,
    /// Free-text search; switches to the search endpoint when set.
    pub search: Option<String>,
    pub category: Option<String>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            category: None,
        }
    }
}

impl PostQuery {
    fn into_request(self) -> ApiRequest {
        let search = self.search.filter(|s| !s.trim().is_empty());
        let category = self.category.filter(|c| !c.trim().is_empty());

        let request = match search {
            Some(query) => ApiRequest::get("/posts/search").query("query", query.trim()),
            None => ApiRequest::get("/posts"),
        };
        let request = request.query("page", self.page).query("limit", self.limit);
        match category {
            Some(category) => request.query("category", category),
            None => request,
        }
    }
}

#[derive(Serialize)]
struct CommentBody<'a> {
    content: &'a str,
}

#[derive(Clone)]
pub struct PostService {
    api: ApiClient,
}

impl PostService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Published feed, optionally searched or filtered by category.
    pub async fn list(&self, query: PostQuery) -> Result<PaginatedResponse<Post>, ApiError> {
        self.api.send(query.into_request()).await
    }

    /// Every post including drafts (teacher/admin).
    pub async fn list_all(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<PaginatedResponse<Post>, ApiError> {
        let request = ApiRequest::get("/posts/all")
            .query("page", page)
            .query("limit", limit);
        self.api.send(request).await
    }

    pub async fn get(&self, id: &str) -> Result<Post, ApiError> {
        self.api.get(&format!("/posts/{}", path_id(id)?)).await
    }

    pub async fn create(&self, post: &NewPost) -> Result<Post, ApiError> {
        self.api.post("/posts", post).await
    }

    pub async fn update(&self, id: &str, update: &PostUpdate) -> Result<Post, ApiError> {
        self.api.patch(&format!("/posts/{}", path_id(id)?), update).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/posts/{}", path_id(id)?)).await
    }

    /// Add a comment; returns the post with its updated comment list.
    pub async fn add_comment(&self, post_id: &str, content: &str) -> Result<Post, ApiError> {
        let path = format!("/posts/{}/comments", path_id(post_id)?);
        self.api.post(&path, &CommentBody { content }).await
    }

    pub async fn update_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<Post, ApiError> {
        let path = format!("/posts/{}/comments/{}", path_id(post_id)?, path_id(comment_id)?);
        self.api.patch(&path, &CommentBody { content }).await
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), ApiError> {
        let path = format!("/posts/{}/comments/{}", path_id(post_id)?, path_id(comment_id)?);
        self.api.delete(&path).await
    }
}
