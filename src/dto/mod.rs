//! Request and response bodies of the REST API.

pub mod health;
pub mod session;
pub mod word;
