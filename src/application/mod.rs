//! Application services: the cached collection, page controllers and admin flows.

pub mod admin;
pub mod auth;
pub mod collection;
pub mod error;
pub mod feed;
pub mod repos;
pub mod story;
