//! File I/O for query input.
//!
//! Documents are read from disk or stdin, decompressed if gzipped, and parsed
//! in whichever format the caller names or the input suggests.

pub mod loader;
