//! Service layer: auth, passwords, breach check, OAuth clients, email.

pub mod auth;
pub mod breach;
pub mod mail;
pub mod oauth;
pub mod password;
