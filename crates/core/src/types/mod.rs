//! Core types for Thockshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod provider;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use provider::OAuthProvider;
pub use status::{OrderStatus, StockStatus, UserStatus};
