//! 基础设施层：HTTP 客户端

pub mod review_api;

pub use review_api::{ReviewApiClient, ScoreUpdate};
