//! Roof Estimate
//!
//! 住所検索 → 衛星画像の撮影 → 屋根解析 → 概算費用

pub mod capture;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod interactive;
pub mod places;
pub mod shell;
pub mod viewport;
pub mod vision;
