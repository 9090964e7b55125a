//! Test doubles shared by core and server tests.

mod mock_inspector;

pub use mock_inspector::{sample_video_info, MockInspector};
