//! API handlers for Aliro.
//!
//! Registration and session endpoints live under [`auth`]; `health` and
//! `root` cover service introspection.

pub mod auth;
pub mod health;
pub mod root;
