//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small fixture site and run the full
//! crawl cycle end-to-end.

mod crawl_tests;
mod pause_tests;
mod support;
