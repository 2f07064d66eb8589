//! Story listing, projection and admin engine.
//!
//! The crate keeps the persistence backend, file storage and authentication
//! behind traits (see [`application::repos`] and [`application::auth`]) and
//! implements the logic that sits on top of them: the published post
//! collection cache, the search/sort projection, adjacent-story navigation and
//! the admin write flows.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub(crate) mod util;
