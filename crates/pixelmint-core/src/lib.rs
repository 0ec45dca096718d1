//! Core types and utilities for pixelmint.
//!
//! This crate provides the foundational types used throughout the service:
//!
//! - **Identifiers**: `UserId`, `ImageId`
//! - **Credits**: `CreditAccount`, `CreditPackage`
//! - **Images**: `Image`, `Prompt`
//! - **Suggestions**: `SuggestedPrompt`
//!
//! # Credit Unit
//!
//! **1 credit = 1 image generation.** Balances are plain `i64` counts; a
//! freshly seen user starts with [`INITIAL_CREDITS`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod ids;
pub mod image;
pub mod package;
pub mod suggested;

pub use account::{CreditAccount, INITIAL_CREDITS};
pub use error::{CoreError, Result};
pub use ids::{IdError, ImageId, UserId};
pub use image::{Image, Prompt, PromptError, MAX_PROMPT_CHARS};
pub use package::CreditPackage;
pub use suggested::SuggestedPrompt;
