//! Test fixtures for idgraph integration tests
//!
//! Provides the OAuth-style authorization relationship kind, its query
//! parameter constants, and identity helpers shared across test suites.

pub mod authorization;

pub use authorization::{
    authorization_kind, authorize, create_application, create_user, ACCESS_TOKEN, APPLICATION,
    AUTHORIZATION, AUTHORIZATION_CODE, REFRESH_TOKEN, USER,
};
