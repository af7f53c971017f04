//! A server-rendered todo list with live updates.
//!
//! Pages are plain HTML over axum; every mutation re-renders the affected
//! fragments and pushes them to all open `/ws` connections.

pub mod adapters;
pub mod client;
pub mod config;
pub mod core;
pub mod storage;
pub mod transport;
pub mod views;

#[cfg(test)]
mod tests;
