//! Parsers for Linux `/proc` and `/sys` provider files.
//!
//! The parsers are pure string-in/struct-out functions so they can be
//! tested without any filesystem at all; the samplers own the reads.

pub mod parser;
