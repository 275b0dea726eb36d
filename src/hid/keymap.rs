//! USB HID usage code → printable character (US layout).
//!
//! Only used to pick the character overlaid on the key feedback image,
//! so control keys (Enter, Backspace, Tab) deliberately resolve to
//! nothing: the display has no glyph for them.

/// Unshifted character for every usage code. `0` = no character.
static UNSHIFTED: [u8; 256] = build_unshifted();

const fn build_unshifted() -> [u8; 256] {
    let mut table = [0u8; 256];

    // 0x04..=0x1D: a..z
    let mut i = 0;
    while i < 26 {
        table[0x04 + i] = b'a' + i as u8;
        i += 1;
    }

    // 0x1E..=0x26: 1..9, 0x27: 0
    let mut d = 0;
    while d < 9 {
        table[0x1E + d] = b'1' + d as u8;
        d += 1;
    }
    table[0x27] = b'0';

    table[0x2C] = b' ';
    table[0x2D] = b'-';
    table[0x2E] = b'=';
    table[0x2F] = b'[';
    table[0x30] = b']';
    table[0x31] = b'\\';
    table[0x33] = b';';
    table[0x34] = b'\'';
    table[0x35] = b'`';
    table[0x36] = b',';
    table[0x37] = b'.';
    table[0x38] = b'/';
    table
}

/// Shifted symbol for the digit row and punctuation keys.
fn shifted_symbol(code: u8) -> Option<char> {
    let ch = match code {
        0x1E => '!',
        0x1F => '@',
        0x20 => '#',
        0x21 => '$',
        0x22 => '%',
        0x23 => '^',
        0x24 => '&',
        0x25 => '*',
        0x26 => '(',
        0x27 => ')',
        0x2D => '_',
        0x2E => '+',
        0x2F => '{',
        0x30 => '}',
        0x31 => '|',
        0x33 => ':',
        0x34 => '"',
        0x35 => '~',
        0x36 => '<',
        0x37 => '>',
        0x38 => '?',
        _ => return None,
    };
    Some(ch)
}

/// Resolve the character to display for a key press.
///
/// With `shift`, letters are upper-cased and punctuation uses the shifted
/// symbol; keys without a shifted symbol (space) keep their base character.
pub fn key_code_to_display_char(code: u8, shift: bool) -> Option<char> {
    let base = UNSHIFTED[code as usize];
    if base == 0 {
        return None;
    }
    let base = base as char;
    if !shift {
        return Some(base);
    }
    if base.is_ascii_lowercase() {
        return Some(base.to_ascii_uppercase());
    }
    Some(shifted_symbol(code).unwrap_or(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_follow_shift() {
        assert_eq!(key_code_to_display_char(0x04, false), Some('a'));
        assert_eq!(key_code_to_display_char(0x1D, false), Some('z'));
        assert_eq!(key_code_to_display_char(0x04, true), Some('A'));
        assert_eq!(key_code_to_display_char(0x1D, true), Some('Z'));
    }

    #[test]
    fn digit_row() {
        assert_eq!(key_code_to_display_char(0x1E, false), Some('1'));
        assert_eq!(key_code_to_display_char(0x27, false), Some('0'));
        assert_eq!(key_code_to_display_char(0x1E, true), Some('!'));
        assert_eq!(key_code_to_display_char(0x1F, true), Some('@'));
        assert_eq!(key_code_to_display_char(0x27, true), Some(')'));
    }

    #[test]
    fn punctuation_pairs() {
        let pairs = [
            (0x2D, '-', '_'),
            (0x2E, '=', '+'),
            (0x2F, '[', '{'),
            (0x30, ']', '}'),
            (0x31, '\\', '|'),
            (0x33, ';', ':'),
            (0x34, '\'', '"'),
            (0x35, '`', '~'),
            (0x36, ',', '<'),
            (0x37, '.', '>'),
            (0x38, '/', '?'),
        ];
        for (code, plain, shifted) in pairs {
            assert_eq!(key_code_to_display_char(code, false), Some(plain));
            assert_eq!(key_code_to_display_char(code, true), Some(shifted));
        }
    }

    #[test]
    fn space_ignores_shift() {
        assert_eq!(key_code_to_display_char(0x2C, false), Some(' '));
        assert_eq!(key_code_to_display_char(0x2C, true), Some(' '));
    }

    #[test]
    fn control_and_unmapped_keys_have_no_char() {
        for code in [0x00, 0x01, 0x28, 0x29, 0x2A, 0x2B, 0x32, 0x39, 0x3A, 0xE0, 0xFF] {
            assert_eq!(key_code_to_display_char(code, false), None, "code {:#04x}", code);
            assert_eq!(key_code_to_display_char(code, true), None, "code {:#04x}", code);
        }
    }
}
