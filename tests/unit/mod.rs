//! Unit tests for lms-quiz modules
//!
//! These tests drive the public API without network I/O.

mod test_api_types;
mod test_config;
mod test_errors;
mod test_responses;
mod test_storage;
