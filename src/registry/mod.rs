//! Consumer connection registry
//!
//! The registry owns every upgraded consumer connection and is shared by all
//! connection tasks through an `Arc`.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<ConnectionRegistry>
//!                   ┌──────────────────────────┐
//!                   │ connections: Mutex<      │
//!                   │   HashMap<id, Arc<       │
//!                   │     ConsumerConnection { │
//!                   │       writer: Mutex<..>, │
//!                   │     }>>                  │
//!                   │ >                        │
//!                   └────────────┬─────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Producer]              [Consumer]              [Consumer]
//!   read chunk              read control            read control
//!        │                  frames, reply           frames, reply
//!        └──► broadcaster ──► snapshot() ──► send() ──► TCP
//! ```
//!
//! The registry lock is only held to mutate or copy the membership. Each
//! connection's own writer lock serialises frames from the broadcaster and
//! from control-frame replies.

pub mod entry;
pub mod store;

pub use entry::{BoxedWriter, ConsumerConnection};
pub use store::ConnectionRegistry;
