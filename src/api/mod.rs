//! API module for HTTP and WebSocket endpoints
//!
//! This module provides the REST CRUD surface and the WebSocket push channel.

pub mod http;
pub mod rest;
pub mod websocket;
