//! Tests for result caching

mod file_cache_tests;
