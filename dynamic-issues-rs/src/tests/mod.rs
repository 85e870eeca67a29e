//! Scenario tests for issue extraction
//!
//! These exercise the extractor end to end against temp directories and
//! an in-memory sink.
