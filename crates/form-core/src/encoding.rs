//! PDF text string encoding
//!
//! Field names and values in this template are Korean, so they travel as
//! UTF-16BE strings with a byte-order mark. ASCII-only strings stay in the
//! single-byte form.

/// Decode a PDF text string (UTF-16BE with BOM, or single-byte)
pub fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        // PDFDocEncoding is Latin-1 compatible for the range we care about
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encode a string as a PDF text string
///
/// ASCII input is stored as-is; anything else becomes UTF-16BE with BOM.
pub fn encode_pdf_text(s: &str) -> Vec<u8> {
    if s.is_ascii() {
        return s.as_bytes().to_vec();
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_roundtrip() {
        let bytes = encode_pdf_text("name");
        assert_eq!(bytes, b"name");
        assert_eq!(decode_pdf_text(&bytes), "name");
    }

    #[test]
    fn test_korean_roundtrip() {
        let bytes = encode_pdf_text("총계 시간");
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_pdf_text(&bytes), "총계 시간");
    }

    #[test]
    fn test_mixed_roundtrip() {
        let bytes = encode_pdf_text("9월 시간");
        assert_eq!(decode_pdf_text(&bytes), "9월 시간");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_pdf_text(b"Off"), "Off");
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_pdf_text(b""), "");
    }
}
