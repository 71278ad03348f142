//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestLibrary, TEST_USER};
//!
//! #[test]
//! fn test_recommend() {
//!     let library = TestLibrary::create();
//!     let user_id = library.add_user(TEST_USER);
//!     // ...
//! }
//! ```

mod constants;
mod fixtures;
mod library;

// Public API - this is what tests import
pub use constants::*;
pub use library::TestLibrary;

#[allow(unused_imports)]
pub use fixtures::{test_catalog_json, write_test_catalog};
