//! Output formatting helpers.

use chrono::{DateTime, Utc};
use conecta_core::models::{Post, User};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional timestamp as a short date
pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    match date {
        Some(dt) => dt.format("%d/%m/%Y").to_string(),
        None => "-".to_string(),
    }
}

pub fn user_line(user: &User) -> String {
    format!(
        "{:<24} {:<32} {:<8} {}",
        truncate_string(&user.name, 24),
        truncate_string(&user.email, 32),
        user.role,
        if user.is_active { "active" } else { "inactive" }
    )
}

pub fn post_line(post: &Post) -> String {
    format!(
        "{:<26} {:<40} {:<16} {:<10} {}",
        post.id,
        truncate_string(&post.title, 40),
        truncate_string(&post.category, 16),
        post.status.as_str(),
        format_date(post.created_at.as_ref())
    )
}

pub fn post_detail(post: &Post) -> String {
    let mut out = format!(
        "{}\n{} · {} · {}\n",
        post.title,
        post.author,
        post.category,
        format_date(post.created_at.as_ref())
    );
    if !post.tags.is_empty() {
        out.push_str(&format!("tags: {}\n", post.tags.join(", ")));
    }
    out.push('\n');
    out.push_str(&post.content);
    out.push_str("\n\n");
    if post.comments.is_empty() {
        out.push_str("No comments yet.\n");
    } else {
        out.push_str(&format!("Comments ({}):\n", post.comments.len()));
        for comment in &post.comments {
            out.push_str(&format!(
                "  [{}] {} ({}): {}\n",
                comment.id.as_deref().unwrap_or("-"),
                comment.author,
                format_date(comment.created_at.as_ref()),
                comment.content
            ));
        }
    }
    out
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
