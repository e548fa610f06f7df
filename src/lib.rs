//! DeedQuest service: configuration, collaborator clients and the HTTP layer
//! around the `deedquest-core` engine.

pub mod api;
pub mod config;
pub mod media;
