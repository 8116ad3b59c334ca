//! The payload module turns telegram user data into typed channel values and
//! back.

pub mod decoder;
pub mod encoder;
pub mod value;

pub use decoder::{decode, decode_channel, decode_with_registry};
pub use encoder::{command_raw, encode_channel, encode_command_payload};
pub use value::{ChannelValue, CommandValue, DecodedValue, InvalidReason, Validity};
