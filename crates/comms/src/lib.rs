//! # Crosstrace Comms
//!
//! Communication analysis over extracted message rows: who each thread
//! was exchanged with, how intense the traffic was, and readable
//! transcripts of it.
//!
//! Exports rarely state the counterparty outright, so
//! [`ThreadPeerResolver`] reconstructs it per `(device, platform)` from
//! whatever each row carries: group names announced earlier in the
//! thread, the chat type, the message direction, and what prior messages
//! in the same thread already established. [`assemble`] then groups
//! filtered rows into per-conversation transcripts with cleaned text and
//! display times, and [`thread_transcript`] reads a single thread
//! directly, whether or not its peer ever resolved.
//!
//! Everything is a pure transformation over the rows handed in; one
//! malformed row degrades to a skip, never an error.

mod error;
mod filter;
mod policy;
mod resolver;
mod transcript;

pub use error::{CommsError, Result};
pub use filter::{filter_by_person, ConversationQuery};
pub use policy::ResolverPolicy;
pub use resolver::{ResolvedPeers, ThreadPeerResolver};
pub use transcript::{assemble, clean_text, extract_display_time, thread_transcript};
