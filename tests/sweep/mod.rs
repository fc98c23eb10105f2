//! Tests for sweep construction, dispatch and results

mod parallel_tests;
