//! Personal finance dashboard: savings goals, monthly records and expenses.
//!
//! The server (`backend`) stores the three entity kinds in SQLite
//! (`database`), derives the dashboard view from them (`dashboard`) and pushes
//! a fresh view to every realtime subscriber after each change. The terminal
//! client (`cli`) renders that view and issues create/delete requests.

pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod database;
