//! `encodeURI`/`decodeURI` as defined by ECMAScript.
//!
//! Patch text bodies are escaped with exactly this character set, so any other
//! percent-encoding scheme would produce hunks other implementations reject.

use super::TextError;

/// Characters `encodeURI` leaves untouched besides ASCII alphanumerics.
const URI_UNESCAPED: &str = ";,/?:@&=+$-_.!~*'()#";

/// Characters `decodeURI` refuses to unescape.
const URI_RESERVED: &str = ";/?:@&=+$,#";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

pub fn encode_uri(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || URI_UNESCAPED.contains(ch) {
            out.push(ch);
            continue;
        }
        let mut buf = [0u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
    }
    out
}

/// Decode percent escapes, keeping escapes of reserved characters verbatim.
pub fn decode_uri(text: &str) -> Result<String, TextError> {
    decode_uri_in(text, "decodeURI")
}

pub(crate) fn decode_uri_in(text: &str, context: &'static str) -> Result<String, TextError> {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let byte = hex_byte(bytes, i).ok_or_else(|| TextError::illegal_escape(context, text))?;
        if byte < 0x80 {
            if URI_RESERVED.as_bytes().contains(&byte) {
                out.extend_from_slice(&bytes[i..i + 3]);
            } else {
                out.push(byte);
            }
            i += 3;
            continue;
        }
        let width = match byte {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return Err(TextError::illegal_escape(context, text)),
        };
        let mut seq = vec![byte];
        for k in 1..width {
            let at = i + 3 * k;
            let next = hex_byte(bytes, at).ok_or_else(|| TextError::illegal_escape(context, text))?;
            seq.push(next);
        }
        let decoded =
            std::str::from_utf8(&seq).map_err(|_| TextError::illegal_escape(context, text))?;
        out.extend_from_slice(decoded.as_bytes());
        i += 3 * width;
    }
    String::from_utf8(out).map_err(|_| TextError::illegal_escape(context, text))
}

fn hex_byte(bytes: &[u8], at: usize) -> Option<u8> {
    if bytes.get(at) != Some(&b'%') {
        return None;
    }
    let hi = (*bytes.get(at + 1)? as char).to_digit(16)?;
    let lo = (*bytes.get(at + 2)? as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn encode_keeps_the_unescaped_set() {
        check!(encode_uri("A-Z a-z 0-9 ;,/?:@&=+$-_.!~*'()#") == "A-Z%20a-z%200-9%20;,/?:@&=+$-_.!~*'()#");
    }

    #[test]
    fn encode_escapes_control_and_unicode() {
        check!(encode_uri("a\nb%") == "a%0Ab%25");
        check!(encode_uri("é") == "%C3%A9");
        check!(encode_uri("🚀") == "%F0%9F%9A%80");
    }

    #[test]
    fn decode_reverses_encode() {
        let text = "line one\nline two: 100% \u{1F680} [x] {y} `z`";
        let_assert!(Ok(decoded) = decode_uri(&encode_uri(text)));
        check!(decoded == text);
    }

    #[test]
    fn decode_keeps_reserved_escapes() {
        let_assert!(Ok(decoded) = decode_uri("%3B%2F%41"));
        check!(decoded == "%3B%2FA");
    }

    #[test]
    fn decode_rejects_broken_escapes() {
        check!(decode_uri("%").is_err());
        check!(decode_uri("%G1").is_err());
        check!(decode_uri("%C3").is_err());
        check!(decode_uri("%FF").is_err());
    }
}
