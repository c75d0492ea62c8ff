//! Common test infrastructure
//!
//! Integration tests talk to a local fake service instead of Steam,
//! SteamSpy, the regional score site and Ollama.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeService, APP_WITH_REVIEWS};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let service = FakeService::spawn().await;
//!     let url = service.url("/appreviews/100");
//! }
//! ```

mod constants;
mod server;
mod workbooks;

pub use constants::*;
pub use server::FakeService;
#[allow(unused_imports)]
pub use workbooks::{write_games_workbook, write_regional_workbook, write_scored_workbook};
