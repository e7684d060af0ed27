//! Wire protocol handling
//!
//! This module provides:
//! - Request head reading shared by both ports
//! - The WebSocket upgrade handshake
//! - WebSocket frame encoding and inbound opcode inspection

pub mod constants;
pub mod frame;
pub mod handshake;
pub mod head;

pub use frame::{binary_frame, close_frame, encode_frame, inspect_opcode, pong_frame, Opcode};
pub use handshake::{compute_accept_key, Handshake};
pub use head::{read_head, RequestHead};
