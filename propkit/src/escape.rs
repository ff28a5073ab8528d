//! Byte decoding and backslash-escape handling for property values.
//!
//! Property files are stored as single-byte Latin-1 text; anything outside
//! Latin-1 is written as `\uXXXX` escapes and recovered by [`unescape`].

use encoding_rs::Encoding;

/// Decodes raw file bytes as Latin-1, one byte per code point.
///
/// Files that start with a UTF-8 or UTF-16 byte-order mark are decoded with
/// that encoding instead.
pub fn decode_latin1(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return decoded.into_owned();
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes backslash escapes: `\uXXXX` (surrogate pairs combined),
/// `\UXXXXXXXX`, `\xHH`, octal `\ooo`, and the single-character escapes.
///
/// Unknown or truncated escapes are kept verbatim; an unpaired surrogate
/// becomes U+FFFD.
pub fn unescape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'f' => Some('\u{0c}'),
            'b' => Some('\u{08}'),
            'v' => Some('\u{0b}'),
            'a' => Some('\u{07}'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.push(decoded);
            i += 2;
            continue;
        }

        match next {
            '\n' => i += 2,
            'u' => match hex_at(&chars, i + 2, 4) {
                Some(unit) if (0xD800..0xDC00).contains(&unit) => {
                    let low = (chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u'))
                        .then(|| hex_at(&chars, i + 8, 4))
                        .flatten()
                        .filter(|low| (0xDC00..0xE000).contains(low));
                    match low {
                        Some(low) => {
                            let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                            i += 12;
                        }
                        None => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            i += 6;
                        }
                    }
                }
                Some(unit) => {
                    out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
                    i += 6;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            'U' => match hex_at(&chars, i + 2, 8).and_then(char::from_u32) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 10;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            'x' => match hex_at(&chars, i + 2, 2).and_then(char::from_u32) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 4;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            '0'..='7' => {
                let digits = chars[i + 1..]
                    .iter()
                    .take(3)
                    .take_while(|d| matches!(d, '0'..='7'))
                    .count();
                let code = chars[i + 1..i + 1 + digits]
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + d.to_digit(8).unwrap_or(0));
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                i += 1 + digits;
            }
            _ => {
                out.push('\\');
                i += 1;
            }
        }
    }

    out
}

fn hex_at(chars: &[char], start: usize, len: usize) -> Option<u32> {
    let digits = chars.get(start..start + len)?;
    digits
        .iter()
        .try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}

/// Inverse of [`unescape`]: keeps printable ASCII, writes everything else as
/// escapes so the result is plain Latin-1 safe text.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '\t' => out.push_str(r"\t"),
            '\r' => out.push_str(r"\r"),
            '\u{0c}' => out.push_str(r"\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out
}
