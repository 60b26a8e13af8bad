//! Request and response bodies of the REST API.

pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod patch;
