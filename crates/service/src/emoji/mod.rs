//! Emoji module: three-layer architecture (domain, repository, service) plus
//! the queue-name permission check.

pub mod domain;
pub mod permission;
pub mod repository;
pub mod service;

pub use service::EmojiService;
