//! Seed metadata embedded in game state blobs

pub mod codec;
pub mod document;

pub use codec::{SeedDecodeError, StateCodec, CHUNK_WIDTH, FORMAT_VERSION};
pub use document::Seed;
