// Clipboard payloads for copy/paste.
//
// Copy produces two representations of the same bytes: the raw payload and an
// uppercase space-separated hex string. Paste resolves whatever the clipboard
// holds back into bytes using a fixed fallback chain.

use crate::charmap::CharMap;

/// Clipboard contents as seen by the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    /// Raw byte payload, when the clipboard carries one.
    pub raw: Option<Vec<u8>>,
    /// Plain text representation.
    pub text: String,
}

impl ClipboardPayload {
    /// Payload produced by copying `bytes` out of the buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            raw: Some(bytes.to_vec()),
            text: to_hex_string(bytes),
        }
    }

    /// Text-only payload, e.g. pasted from another application.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            raw: None,
            text: text.into(),
        }
    }

    /// Resolve the payload into the bytes a paste should write.
    ///
    /// Order: raw payload; char-map decoding of the text (unmapped -> 0x00);
    /// if that decodes to all zeros, the text parsed as hex; finally the
    /// text's own bytes.
    pub fn resolve(&self, map: &CharMap) -> Vec<u8> {
        if let Some(raw) = &self.raw
            && !raw.is_empty()
        {
            return raw.clone();
        }
        if self.text.is_empty() {
            return Vec::new();
        }

        let decoded = map.encode_lossy(&self.text);
        if decoded.iter().any(|&b| b != 0) {
            return decoded;
        }

        parse_hex_string(&self.text).unwrap_or_else(|| self.text.as_bytes().to_vec())
    }
}

/// Uppercase hex, one space between bytes.
pub fn to_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex pairs with all whitespace ignored.
///
/// Returns `None` for empty input, odd digit counts or non-hex characters.
pub fn parse_hex_string(s: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;

    if digits.is_empty() || !digits.len().is_multiple_of(2) {
        return None;
    }
    Some(digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
