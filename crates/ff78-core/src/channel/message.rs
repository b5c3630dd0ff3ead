//! Message encoding inside one directional part.
//!
//! # Layout
//!
//! ```text
//! Word     Field      Description
//! ──────────────────────────────────────────────────────────
//! 0        kind       Field index from the edition table
//! 1        length     UTF-16 code units (text), 1 (value), 0 (empty)
//! 2..      payload    Text: two code units per word, low half first,
//!                     followed by a NUL unit. Value: one word.
//! ```

use crate::error::{Error, Result};
use crate::layout::PART_WORDS;

/// Words before the payload
pub const HEADER_WORDS: usize = 2;

/// Largest payload that fits in one part
pub const MAX_PAYLOAD_WORDS: usize = PART_WORDS - HEADER_WORDS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Text(String),
    Value(u32),
}

/// An outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: u32,
    pub payload: Payload,
}

impl Message {
    pub fn empty(kind: u32) -> Self {
        Self {
            kind,
            payload: Payload::Empty,
        }
    }

    pub fn text(kind: u32, text: impl Into<String>) -> Self {
        Self {
            kind,
            payload: Payload::Text(text.into()),
        }
    }

    pub fn value(kind: u32, value: u32) -> Self {
        Self {
            kind,
            payload: Payload::Value(value),
        }
    }

    pub fn flag(kind: u32, flag: bool) -> Self {
        Self::value(kind, u32::from(flag))
    }

    /// Encode into the words written at the start of a part
    pub fn encode(&self) -> Result<Vec<u32>> {
        let (length, payload) = match &self.payload {
            Payload::Empty => (0, Vec::new()),
            Payload::Value(value) => (1, vec![*value]),
            Payload::Text(text) => {
                let mut units: Vec<u16> = text.encode_utf16().collect();
                let length = units.len();
                units.push(0);
                (length, pack_units(&units))
            }
        };

        if payload.len() > MAX_PAYLOAD_WORDS {
            return Err(Error::PayloadTooLarge {
                size: payload.len() * 4,
                capacity: MAX_PAYLOAD_WORDS * 4,
            });
        }

        let mut words = Vec::with_capacity(HEADER_WORDS + payload.len());
        words.push(self.kind);
        words.push(length as u32);
        words.extend(payload);
        Ok(words)
    }
}

/// A message as read from a part; its payload type depends on `kind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub kind: u32,
    pub length: u32,
    pub data: Vec<u32>,
}

impl RawMessage {
    /// Number of payload words following a header with `length`
    ///
    /// Large enough for either reading: `length` code units plus NUL, or one value.
    pub fn payload_words(length: u32) -> Result<usize> {
        let words = length as usize / 2 + 1;
        if words > MAX_PAYLOAD_WORDS {
            return Err(Error::InvalidMessage(format!(
                "payload length {} exceeds part capacity",
                length
            )));
        }
        Ok(if length == 0 { 0 } else { words })
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Interpret the payload as a value
    pub fn value(&self) -> Result<u32> {
        match (self.length, self.data.first()) {
            (1, Some(&value)) => Ok(value),
            _ => Err(Error::InvalidMessage(format!(
                "kind {} does not carry a value (length {})",
                self.kind, self.length
            ))),
        }
    }

    /// Interpret the payload as UTF-16 text
    pub fn text(&self) -> Result<String> {
        let length = self.length as usize;
        let units = unpack_units(&self.data);
        if units.len() < length {
            return Err(Error::InvalidMessage(format!(
                "kind {} has {} code units, expected {}",
                self.kind,
                units.len(),
                length
            )));
        }
        if units.get(length).is_some_and(|&unit| unit != 0) {
            return Err(Error::InvalidMessage(format!(
                "kind {} text is not NUL terminated",
                self.kind
            )));
        }
        String::from_utf16(&units[..length])
            .map_err(|e| Error::InvalidMessage(format!("kind {}: {}", self.kind, e)))
    }
}

fn pack_units(units: &[u16]) -> Vec<u32> {
    units
        .chunks(2)
        .map(|pair| {
            let low = u32::from(pair[0]);
            let high = pair.get(1).copied().map(u32::from).unwrap_or(0);
            low | (high << 16)
        })
        .collect()
}

fn unpack_units(words: &[u32]) -> Vec<u16> {
    words
        .iter()
        .flat_map(|&word| [word as u16, (word >> 16) as u16])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(words: &[u32]) -> RawMessage {
        RawMessage {
            kind: words[0],
            length: words[1],
            data: words[HEADER_WORDS..].to_vec(),
        }
    }

    #[test]
    fn test_encode_text_layout() {
        let words = Message::text(13, "lang-en").encode().unwrap();
        // 7 units + NUL = 4 words
        assert_eq!(words.len(), HEADER_WORDS + 4);
        assert_eq!(words[0], 13);
        assert_eq!(words[1], 7);
        assert_eq!(words[2], u32::from(b'l') | (u32::from(b'a') << 16));
        assert_eq!(words[5], u32::from(b'n'));
    }

    #[test]
    fn test_encode_even_length_text_adds_nul_word() {
        let words = Message::text(9, "ab").encode().unwrap();
        assert_eq!(words, vec![9, 2, 0x0062_0061, 0]);
    }

    #[test]
    fn test_encode_value_and_flag() {
        assert_eq!(Message::value(18, 7).encode().unwrap(), vec![18, 1, 7]);
        assert_eq!(Message::flag(22, true).encode().unwrap(), vec![22, 1, 1]);
        assert_eq!(Message::flag(22, false).encode().unwrap(), vec![22, 1, 0]);
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(Message::empty(24).encode().unwrap(), vec![24, 0]);
    }

    #[test]
    fn test_text_decodes_non_ascii() {
        let words = Message::text(12, "C:\\ゲーム\\FF8").encode().unwrap();
        let message = raw(&words);
        assert_eq!(message.text().unwrap(), "C:\\ゲーム\\FF8");
    }

    #[test]
    fn test_value_decode() {
        let message = raw(&Message::value(17, 3).encode().unwrap());
        assert_eq!(message.value().unwrap(), 3);
        assert!(raw(&Message::empty(17).encode().unwrap()).value().is_err());
    }

    #[test]
    fn test_text_without_nul_is_rejected() {
        let message = RawMessage {
            kind: 11,
            length: 1,
            data: vec![0x0041_0041],
        };
        assert!(message.text().is_err());
    }

    #[test]
    fn test_payload_too_large() {
        let text = "x".repeat(MAX_PAYLOAD_WORDS * 2);
        let result = Message::text(11, text).encode();
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_largest_text_fits() {
        // MAX_PAYLOAD_WORDS * 2 units including the NUL
        let text = "x".repeat(MAX_PAYLOAD_WORDS * 2 - 1);
        let words = Message::text(11, text).encode().unwrap();
        assert_eq!(words.len(), PART_WORDS);
    }

    #[test]
    fn test_payload_words() {
        assert_eq!(RawMessage::payload_words(0).unwrap(), 0);
        assert_eq!(RawMessage::payload_words(1).unwrap(), 1);
        assert_eq!(RawMessage::payload_words(2).unwrap(), 2);
        assert_eq!(RawMessage::payload_words(7).unwrap(), 4);
        assert!(RawMessage::payload_words(u32::MAX).is_err());
    }
}
