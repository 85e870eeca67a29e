//! Integration tests for the query client
//!
//! These run against a local WireMock server standing in for the Cosmos
//! data plane, the AAD token endpoint, and Azure Resource Manager.

mod query_mock_tests;
