//! Username payments on an EVM chain.
//!
//! A wallet session manager plus the approve-then-pay workflow for a
//! contract that maps usernames to addresses.
//!
//! # Architecture Overview
//!
//! ```text
//!   WalletProvider ──▶ session (negotiator) ──▶ Session { account, signer, handles }
//!                                                    │
//!          payments (workflow, registration, lookup) ◀┘
//!                 │
//!                 ▼
//!   transactions (allowance guard → submitter → outcome) ──▶ chain
//!                 │
//!                 ▼
//!             status (reporter)
//!
//!   Cross-cutting: config, observability, error
//! ```

pub mod app;
pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod observability;
pub mod payments;
pub mod session;
pub mod status;
pub mod transactions;

pub use app::UsernamePayApp;
pub use config::schema::AppConfig;
pub use error::{Error, Result};
