// src/models/mod.rs
pub mod profile;

use serde::Serialize;

pub use profile::{ProfileUpsert, UserProfile};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
