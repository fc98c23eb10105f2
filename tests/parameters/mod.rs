//! Tests for the parameter system

mod materialize_tests;
