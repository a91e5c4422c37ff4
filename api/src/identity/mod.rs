use axum::http::request::Parts;
use serde::Serialize;
use sqlx::FromRow;

use crate::{App, error::AppError};

pub const COOKIE_NAME: &str = "auth_token";

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error("Authentication required, but no cookie `{COOKIE_NAME}` found in headers.")]
    NoCookie,

    #[error(
        "Unauthorized, please check if you're logged in by refreshing the \
         page. This could be due to an expired session or token has became invalid."
    )]
    Unauthorized,
}

/// The role attached to a user account. Editors and admins get to see the
/// real author behind every comment, everyone else only sees the
/// privacy-aware display author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Editor,
    Admin,
}

impl Role {
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Editor | Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub id: i32,
    pub name: String,
    pub role: Role,
}

#[derive(FromRow)]
struct ViewerRow {
    id: i32,
    name: String,
    role: String,
}

impl From<ViewerRow> for Viewer {
    fn from(row: ViewerRow) -> Self {
        let role = match row.role.as_str() {
            "admin" => Role::Admin,
            "editor" => Role::Editor,
            "member" => Role::Member,
            other => {
                tracing::warn!(user_id = row.id, role = other, "unknown role, demoting to member");
                Role::Member
            }
        };
        Viewer {
            id: row.id,
            name: row.name,
            role,
        }
    }
}

pub struct MaybeAuthUser(pub Result<Viewer, AuthenticationError>);

impl axum::extract::FromRequestParts<App> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let jar = axum_extra::extract::cookie::CookieJar::from_headers(&parts.headers);

        let session_token: &str = if let Some(t) = jar.get(COOKIE_NAME) {
            t.value()
        } else {
            return Ok(MaybeAuthUser(Err(AuthenticationError::NoCookie)));
        };

        let viewer = sqlx::query_as::<_, ViewerRow>(
            "
            SELECT u.id, u.name, u.role
            FROM sessions s JOIN users u
            ON s.user_id = u.id
            WHERE s.token = $1
            AND s.active = true
            AND s.expires_at > CURRENT_TIMESTAMP
            AND s.issued_at <= CURRENT_TIMESTAMP;
            ",
        )
        .bind(session_token)
        .fetch_optional(&state.pool)
        .await?;

        Ok(MaybeAuthUser(
            viewer
                .map(Viewer::from)
                .ok_or(AuthenticationError::Unauthorized),
        ))
    }
}

pub struct AuthUser(pub Viewer);

impl axum::extract::FromRequestParts<App> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(auth_user) = MaybeAuthUser::from_request_parts(parts, state).await?;

        Ok(AuthUser(auth_user?))
    }
}
