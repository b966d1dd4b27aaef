//! Corruption check for exported documents.
//!
//! The hash is the 32-bit `h * 31 + c` rolling hash over UTF-16 code units. It
//! catches truncated or hand-edited exports. It is not a cryptographic
//! integrity guarantee and must not be used to authenticate a payload.

use serde_json::Value;

/// Checksum of a document in its canonical form (sorted keys, compact).
pub fn checksum(value: &Value) -> String {
    // serde_json's default map is ordered, so to_string is canonical.
    let canonical = value.to_string();
    hash_str(&canonical)
}

fn hash_str(s: &str) -> String {
    let hash = s
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    format!("{:08x}", hash as u32)
}
