//! TCP boundary for ArenaKV.
//!
//! Speaks a minimal HTTP/1.1-framed protocol: only the request line and
//! the body are interpreted, the response is a status line plus body, and
//! the socket is closed after every response.

pub mod handler;
pub mod request;
pub mod response;
pub mod server;
