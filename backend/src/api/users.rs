use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::server::AppState;
use crate::db::models::{NewUser, User};
use crate::db::repo;
use crate::error::{AppError, Result};

const MISSING_FIELDS: &str = "Name, phone, and email are required";
const INVALID_EMAIL: &str = "Please provide a valid email address";

/// Body of `POST /api/users`. Fields are optional here so that a missing one
/// surfaces as a validation error rather than a JSON rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserPayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<User>,
}

impl CreateUserPayload {
    /// Checks required fields and email shape. `phone` is required but not stored.
    pub fn validate(self) -> Result<NewUser> {
        let (name, email) = match (non_empty(self.name), non_empty(self.phone), non_empty(self.email)) {
            (Some(name), Some(_phone), Some(email)) => (name, email),
            _ => return Err(AppError::Validation(MISSING_FIELDS.to_string())),
        };

        if !is_valid_email(&email) {
            return Err(AppError::Validation(INVALID_EMAIL.to_string()));
        }

        Ok(NewUser {
            username: name,
            email,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Matches `^[^\s@]+@[^\s@]+\.[^\s@]+$`: one `@`, no whitespace, and a dot
/// inside the domain with at least one character on each side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(is_js_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Any dot that is neither the first nor the last char of the domain will do.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + c.len_utf8() < domain.len())
}

/// The characters matched by `\s` in a JavaScript regex. Differs from
/// `char::is_whitespace`: U+FEFF is included, U+0085 is not.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "The Gaadi Backend API is running!".to_string(),
    })
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    let new_user = payload.validate()?;

    let user = repo::insert_user(state.database().await?, &new_user).await?;
    tracing::info!(user_id = user.id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<ListUsersResponse>> {
    let users = repo::list_users(state.database().await?).await?;
    tracing::debug!(count = users.len(), "Listed users");

    Ok(Json(ListUsersResponse { users }))
}
