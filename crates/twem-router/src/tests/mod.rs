//! Tests for the twem-router crate.

mod helpers;
