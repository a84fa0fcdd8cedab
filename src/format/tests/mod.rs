//! Unit tests for annotation document reading and writing.
//!
//! These tests cover record conversion, version handling, lenient loading of
//! malformed records, and file round-trips.

mod document_tests;
