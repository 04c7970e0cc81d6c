//! A utility module for handling Axum's extractor rejections.

use axum::extract::rejection::{PathRejection, QueryRejection};

use crate::app::error::AppError;

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::RequestFormat(rejection.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::RequestFormat(rejection.to_string())
    }
}
