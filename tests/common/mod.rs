//! Shared fixtures for the integration tests.

pub mod blobs;
pub mod server;

#[allow(unused_imports)]
pub use blobs::*;
#[allow(unused_imports)]
pub use server::*;

use syncbridge::room::RoomCode;

#[allow(dead_code)]
pub fn room() -> RoomCode {
    RoomCode::parse("482913").unwrap()
}
