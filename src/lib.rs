//! hexandtabler: byte-editor core with table-aware search and an encoding
//! guesser.
//!
//! The crate provides:
//! - A 256-slot byte/glyph table (`charmap`) and its `.tbl` text codec (`table`)
//! - A nibble-addressed cursor/selection model with copy/paste (`editor`)
//! - Bounded undo/redo (`history`)
//! - Exact and relative-offset search/replace (`search`)
//! - A known-plaintext mapping guesser with a background worker (`guess`)
//! - A single-owner facade tying them together (`session`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use hexandtabler::search::{FindOptions, SearchKind};
//! use hexandtabler::session::Session;
//!
//! let mut session = Session::default();
//! session.set_buffer(b"..HELLO..HELLO".to_vec());
//!
//! let hit = session
//!     .find("HELLO", SearchKind::Char, FindOptions::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(hit.start, 2);
//!
//! let replaced = session
//!     .replace_all("48 45", "4A 45", SearchKind::Hex, true)
//!     .unwrap();
//! assert_eq!(replaced, 2);
//! assert_eq!(session.buffer(), b"..JELLO..JELLO");
//! ```

pub mod charmap;
pub mod editor;
pub mod guess;
pub mod history;
pub mod io;
pub mod search;
pub mod session;
pub mod table;

#[cfg(feature = "cli")]
pub mod cli;
