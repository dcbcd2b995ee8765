//! LinkShelf: save links with a note, pin, archive, trash and restore them,
//! with automatic archiving, trash retention and reading reminders.
//!
//! This library crate exposes all modules for use by the host binary and
//! integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod storage;
pub mod types;
