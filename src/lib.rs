//! Libris application library.
//!
//! Wires the catalog module into the kernel registry; the binary in
//! `main.rs` drives bootstrap and the HTTP server.

pub mod modules;
