//! Advertising payload builder.
//!
//! Layout (AD structures, max 31 bytes):
//! ```text
//! [0x02, 0x01, 0x06]            Flags: LE General Discoverable, BR/EDR not supported
//! [len,  0x09, name bytes...]   Complete Local Name
//! [len,  0x08, name bytes...]   Shortened Local Name (when the full name does not fit)
//! ```

use crate::error::Error;
use heapless::Vec;

/// Maximum legacy advertising payload size.
pub const ADV_PAYLOAD_MAX: usize = 31;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_SHORTENED_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// LE General Discoverable Mode | BR/EDR Not Supported.
pub const FLAGS_GENERAL_DISCOVERABLE: u8 = 0x06;

/// Advertising payload, sized for legacy advertising.
pub type AdvPayload = Vec<u8, ADV_PAYLOAD_MAX>;

/// Build the advertising payload carrying `name`.
///
/// A name that does not fit is truncated and tagged as shortened.  An
/// empty name is rejected.
pub fn build(name: &str) -> Result<AdvPayload, Error> {
    if name.is_empty() {
        return Err(Error::InvalidName);
    }

    let mut payload = AdvPayload::new();
    payload
        .extend_from_slice(&[2, AD_TYPE_FLAGS, FLAGS_GENERAL_DISCOVERABLE])
        .map_err(|_| Error::BufferOverflow)?;

    let room = ADV_PAYLOAD_MAX - payload.len() - 2;
    let bytes = name.as_bytes();
    let (name_bytes, ad_type) = if bytes.len() <= room {
        (bytes, AD_TYPE_COMPLETE_LOCAL_NAME)
    } else {
        (&bytes[..room], AD_TYPE_SHORTENED_LOCAL_NAME)
    };

    payload
        .extend_from_slice(&[name_bytes.len() as u8 + 1, ad_type])
        .map_err(|_| Error::BufferOverflow)?;
    payload
        .extend_from_slice(name_bytes)
        .map_err(|_| Error::BufferOverflow)?;
    Ok(payload)
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
