use crate::pages::NoticePage;
use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tower_sessions::session;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<session::Error> for AppError {
    fn from(err: session::Error) -> Self {
        error!("session store failed: {err}");
        Self::internal("Your session could not be loaded. Please try again.")
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        error!("template failed: {err}");
        Self::internal("This page could not be displayed.")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let title = self.status.canonical_reason().unwrap_or("Error");
        let page = NoticePage {
            title,
            message: &self.message,
        };
        match page.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(err) => {
                error!("notice page failed: {err}");
                (self.status, self.message).into_response()
            }
        }
    }
}
