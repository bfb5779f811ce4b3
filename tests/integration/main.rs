//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the marketplaces and the webhook
//! and run full marketplace runs end-to-end.

mod common;
mod hubspot_tests;
mod salesforce_tests;
