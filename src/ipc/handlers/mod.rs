pub mod admin;
pub mod announcements;
pub mod auth;
pub mod chatbot;
pub mod core;
pub mod courses;
pub mod faculty;
pub mod grades;
pub mod profile;
