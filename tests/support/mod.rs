//! Shared helpers for integration tests.
//!
//! Each test binary uses a different subset.

#![allow(dead_code)]

pub mod login_site;
pub mod pdf_fixture;
pub mod socket_guard;
