//! Character to byte offset conversion
//!
//! Acme addresses text in runes while tree-sitter spans are UTF-8 byte
//! offsets. The conversion consumes the text one character at a time.

use crate::error::EncodingError;

/// Number of UTF-8 bytes occupied by the first `count` characters of `chars`.
pub fn byte_offset<I>(chars: I, count: usize) -> Result<usize, EncodingError>
where
    I: IntoIterator<Item = char>,
{
    let mut chars = chars.into_iter();
    let mut bytes = 0;
    for consumed in 0..count {
        let Some(c) = chars.next() else {
            return Err(EncodingError::EndOfInput {
                requested: count,
                available: consumed,
            });
        };
        bytes += c.len_utf8();
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        for (offset, expected) in [(0, 0), (1, 1), (5, 5)] {
            assert_eq!(byte_offset("abcdef".chars(), offset), Ok(expected));
        }
    }

    #[test]
    fn test_multibyte() {
        for (offset, expected) in [(0, 0), (1, 3), (5, 11)] {
            assert_eq!(byte_offset("日本語def".chars(), offset), Ok(expected));
        }
    }

    #[test]
    fn test_end_of_buffer_is_valid() {
        assert_eq!(byte_offset("héllo".chars(), 5), Ok(6));
    }

    #[test]
    fn test_past_end_fails() {
        assert_eq!(
            byte_offset("ab".chars(), 3),
            Err(EncodingError::EndOfInput {
                requested: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_matches_char_indices() {
        let text = "package ü; var 日 = \"🦀\"";
        for (index, (byte, _)) in text.char_indices().enumerate() {
            assert_eq!(byte_offset(text.chars(), index), Ok(byte));
        }
    }
}
