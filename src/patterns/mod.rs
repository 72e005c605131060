//! Event spec compilation.
//!
//! An event spec is either a **literal** name (`"user.created"`) or a
//! **pattern**. A spec is a pattern as soon as it contains one of the sentinel
//! characters `~ * ^ $ ? ( ) [ ]`:
//!
//! ```text
//!  "user.created"   ─► literal   key = "user.created"
//!  "user.*"         ─► glob      key = "/user\.(.*)/"
//!  "~^a.b$"         ─► regex     key = "/^a.b$/"
//!  "~/^a.b$/"       ─► regex     key = "/^a.b$/"   (already delimited)
//! ```
//!
//! ## Contents
//! - [`PatternCompiler`] compiles a spec into a [`CompiledSpec`]
//! - [`Matcher`] compiled regular expression keyed by its delimited source
//! - [`is_pattern`], [`pattern_key`] pure helpers used for lookups

mod compiler;

pub use compiler::{CompiledSpec, Matcher, PatternCompiler, is_pattern, pattern_key};
