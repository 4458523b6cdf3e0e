//! CalDAV implementation of the remindav calendar gateway.
//!
//! Authenticates with HTTP basic auth, discovers the principal and the
//! calendar-home-set at login, lists calendar collections via PROPFIND and
//! fetches events with a server-side time-range calendar-query REPORT.

pub mod client;
pub mod requests;

pub use client::CaldavGateway;
