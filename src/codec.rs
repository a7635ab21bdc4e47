//! Physical layout of a treebin document.
//!
//! ```text
//! [ UTF-8 tree text ] [ 0x00 ] [ binary buffer ... ]
//! ```
//!
//! The text is everything before the first NUL byte. The binary buffer starts at
//! the byte right after the terminator, and region offsets stored in the text are
//! relative to that byte, not to the start of the file.

use crate::error::{Result, TreeBinError};

/// Byte separating the text portion from the binary buffer.
pub const TERMINATOR: u8 = 0;

/// Lays out `text` and `binary` as one document.
pub fn encode(text: &str, binary: &[u8]) -> Result<Vec<u8>> {
    if text.as_bytes().contains(&TERMINATOR) {
        return Err(TreeBinError::Format(
            "tree text must not contain a NUL byte".into(),
        ));
    }
    let mut out = Vec::with_capacity(text.len() + 1 + binary.len());
    out.extend_from_slice(text.as_bytes());
    out.push(TERMINATOR);
    out.extend_from_slice(binary);
    Ok(out)
}

/// Splits a document into its text and binary portions.
pub fn decode(bytes: &[u8]) -> Result<(&str, &[u8])> {
    let split = bytes
        .iter()
        .position(|b| *b == TERMINATOR)
        .ok_or_else(|| TreeBinError::Format("missing NUL terminator after tree text".into()))?;
    let (text, rest) = bytes.split_at(split);
    let text = std::str::from_utf8(text)
        .map_err(|e| TreeBinError::Format(format!("tree text is not UTF-8: {e}")))?;
    Ok((text, rest.get(1..).unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_follows_terminator() {
        let doc = encode("{}", &[0, 1, 2]).expect("encode");
        assert_eq!(doc, vec![b'{', b'}', 0, 0, 1, 2]);
        let (text, binary) = decode(&doc).expect("decode");
        assert_eq!(text, "{}");
        assert_eq!(binary, &[0, 1, 2]);
    }

    #[test]
    fn empty_binary_is_allowed() {
        let (text, binary) = decode(b"{\"a\":1}\0").expect("decode");
        assert_eq!(text, "{\"a\":1}");
        assert!(binary.is_empty());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(decode(b"{}"), Err(TreeBinError::Format(_))));
        assert!(matches!(decode(&[0xFF, 0xFE, 0]), Err(TreeBinError::Format(_))));
        assert!(matches!(encode("a\0b", &[]), Err(TreeBinError::Format(_))));
    }
}
