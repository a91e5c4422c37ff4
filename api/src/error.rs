use std::collections::HashMap;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;

use crate::{discussion::store::StoreError, identity::AuthenticationError};

pub enum AppError {
    Store {
        error: StoreError,

        #[cfg(debug_assertions)]
        backtrace: Option<backtrace::Backtrace>,
    },
    Authentication(AuthenticationError),
    BadRequest {
        msg: String,
        status: StatusCode,
    },
    Unhandled(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,

    #[cfg(debug_assertions)]
    debug_info: Option<HashMap<&'static str, Value>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, error_response) = match self {
            AppError::Store {
                error,
                #[cfg(debug_assertions)]
                backtrace,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                #[cfg(debug_assertions)]
                {
                    let frames_info = backtrace.as_ref().map(filter_backtrace);
                    ErrorResponse {
                        code: "DATABASE_ERR".into(),
                        msg: Some("Database error".into()),
                        debug_info: Some(HashMap::from([
                            (
                                "backtrace",
                                serde_json::to_value(&frames_info).unwrap_or(Value::Null),
                            ),
                            ("error", Value::String(error.to_string())),
                        ])),
                    }
                },
                #[cfg(not(debug_assertions))]
                ErrorResponse {
                    code: "SERVER_ERR".into(),
                    msg: Some("Internal server error".into()),
                },
            ),
            AppError::Authentication(e) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    code: "UNAUTHORIZED".into(),
                    msg: Some(e.to_string()),
                    #[cfg(debug_assertions)]
                    debug_info: None,
                },
            ),
            AppError::BadRequest { msg, status } => (
                status,
                ErrorResponse {
                    code: "BAD_REQUEST".into(),
                    msg: Some(msg),
                    #[cfg(debug_assertions)]
                    debug_info: None,
                },
            ),
            AppError::Unhandled(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    code: "ERR".into(),
                    msg: Some(e),
                    #[cfg(debug_assertions)]
                    debug_info: None,
                },
            ),
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store {
            error: e,

            #[cfg(debug_assertions)]
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::from(e).into()
    }
}

impl From<AuthenticationError> for AppError {
    fn from(e: AuthenticationError) -> Self {
        AppError::Authentication(e)
    }
}

impl From<(&'static str, StatusCode)> for AppError {
    fn from((msg, status): (&'static str, StatusCode)) -> Self {
        AppError::BadRequest {
            msg: msg.into(),
            status,
        }
    }
}

impl From<(String, StatusCode)> for AppError {
    fn from((msg, status): (String, StatusCode)) -> Self {
        AppError::BadRequest { msg, status }
    }
}

impl From<&'static str> for AppError {
    fn from(e: &'static str) -> Self {
        AppError::Unhandled(e.into())
    }
}

#[cfg(debug_assertions)]
#[derive(Serialize, Debug)]
struct FrameInfo {
    name: String,
    loc: String,
}

#[cfg(debug_assertions)]
fn filter_backtrace(backtrace: &backtrace::Backtrace) -> Vec<FrameInfo> {
    const MODULE_PREFIX: &str = concat!(env!("CARGO_PKG_NAME"), "::");
    let mut frames_info: Vec<FrameInfo> = Vec::new();

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            if let (Some(name), Some(filename), Some(lineno)) = (
                symbol.name().map(|n| n.to_string()),
                symbol.filename().map(|f| f.to_owned()),
                symbol.lineno(),
            ) {
                if name.contains(MODULE_PREFIX) {
                    frames_info.push(FrameInfo {
                        name,
                        loc: format!("{}:{}", filename.to_string_lossy(), lineno),
                    });
                }
            }
        }
    }

    frames_info
}
