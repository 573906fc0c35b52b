pub mod admin;
pub mod application;
pub mod auth;
pub mod health;
pub mod super_admin;
pub mod video;
pub mod video_access;
