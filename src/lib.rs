// Library root
// ------------
// The binary (`main.rs`) wires these modules into one run: load the cache,
// authenticate, upload new images, then rewrite the markdown documents.
//
// Module responsibilities:
// - `api`: the `Uploader` trait and the SM.MS HTTP client.
// - `cache`: the JSON file mapping local image paths to hosted URLs.
// - `scan`: walks the image tree and uploads what is not cached yet.
// - `rewrite`: replaces local image references in `*.md` files.
// - `ui`: terminal prompts and spinners.
pub mod api;
pub mod cache;
pub mod error;
pub mod rewrite;
pub mod scan;
pub mod ui;

pub use error::{Result, SyncError};
