//! Integration tests against an in-memory catalog

mod catalog_tests;
mod common;
mod loans_tests;
