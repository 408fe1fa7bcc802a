//! Data models for platform entities.
//!
//! - `User`, `Role`: accounts and permissions
//! - `AuthResponse`, `AuthPayload`: login/register results
//! - `Post`, `Comment`, `PaginatedResponse`: content listings
//! - Request bodies: `NewAccount`, `ProfileUpdate`, `UserUpdate`, `NewPost`, `PostUpdate`

pub mod post;
pub mod user;

pub use post::{Comment, NewPost, PaginatedResponse, Post, PostStatus, PostUpdate};
pub use user::{
    AuthPayload, AuthResponse, Credentials, NewAccount, PasswordChange, ProfileUpdate, Role, User,
    UserUpdate,
};
