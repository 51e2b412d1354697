//! Mention parsing
//!
//! Two parsers live here:
//!
//! - [`MentionParser`] drives routing. It only accepts the strict emphasis form
//!   `**@Name**` and validates every candidate against the agent directory.
//! - [`highlight`] is for display. It matches bare `@word` tokens in prose and
//!   performs no validation.
//!
//! # Examples
//!
//! ```text
//! "**@Sindri** please implement the API"   -> ["Sindri"]
//! "ping @sindri when done"                 -> [] (routing), ["sindri"] (display)
//! ```

pub mod highlight;
mod parser;

pub use highlight::{display_mentions, render_highlighted, DisplayMention};
pub use parser::{is_mentioned, resolve_candidate, MentionParser, MentionToken};
