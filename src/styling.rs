//! Terminal output helpers.
//!
//! Uses the anstyle ecosystem:
//! - anstream for auto-detecting color support
//! - anstyle for composable styling
//! - Semantic emoji constants for domain-specific use
//!
//! Use `println!` for data output and `eprintln!` for hints and warnings so
//! that piped output stays machine-readable.

// Re-exports from anstream (auto-detecting output)
pub use anstream::{eprint, eprintln, print, println};

// Re-exports from anstyle (for composition)
pub use anstyle::Style;

pub const ERROR_EMOJI: &str = "❌";
pub const HINT_EMOJI: &str = "💡";
pub const WARNING_EMOJI: &str = "⚠️";
