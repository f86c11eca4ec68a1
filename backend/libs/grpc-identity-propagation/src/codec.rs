//! Identity Metadata Codec
//!
//! The identity travels as a JSON document under the `identity` metadata key.
//! Metadata values must be visible ASCII, so anything outside that range is
//! written as a JSON `\uXXXX` escape; decoders see ordinary JSON.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use tonic::metadata::AsciiMetadataValue;

use crate::error::IdentityError;
use crate::identity::Identity;

/// Metadata key the identity is carried under
pub const IDENTITY_METADATA_KEY: &str = "identity";

/// Serialize an identity into a metadata value
///
/// ## Errors
///
/// - `IdentityError::Encode` if serialization fails
/// - `IdentityError::InvalidMetadata` if the document is not a legal metadata value
pub fn encode(identity: &Identity) -> Result<AsciiMetadataValue, IdentityError> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    identity
        .serialize(&mut serializer)
        .map_err(IdentityError::Encode)?;

    // AsciiFormatter only emits ASCII, so the conversion is lossless
    let json = String::from_utf8_lossy(&buf).into_owned();
    Ok(AsciiMetadataValue::try_from(json)?)
}

/// Deserialize an identity from a raw metadata value
///
/// ## Errors
///
/// Returns `IdentityError::MalformedIdentity` wrapping the JSON error.
pub fn decode(value: &[u8]) -> Result<Identity, IdentityError> {
    serde_json::from_slice(value).map_err(IdentityError::MalformedIdentity)
}

/// Compact JSON with every byte outside printable ASCII escaped
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    writer.write_all(format!("\\u{:04x}", unit).as_bytes())?;
                }
            }
        }
        Ok(())
    }
}
