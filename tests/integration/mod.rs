//! Integration tests for the mock server

mod debug;
mod mock;
