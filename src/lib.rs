//! QR Code generator conforming to ISO/IEC 18004. Payloads go in as text,
//! bytes or pre-built segments; a frozen module matrix comes out, readable
//! through [`QR::width`] and [`QR::get_module`].

pub mod builder;
mod common;

pub use builder::{
    encode_binary, encode_segments, encode_segments_advanced, encode_text, QRBuilder, QR,
};
pub use common::bitstream::BitStream;
pub use common::codec::{total_encoded_bits, Mode, Segment};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{Color, ECLevel, Version};
