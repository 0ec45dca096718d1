//! HTTP request handlers.

pub mod checkout;
pub mod credits;
pub mod health;
pub mod images;
pub mod prompts;
pub mod webhooks;
