//! Character-set table for the 7-bit printable range (33..=126).
//!
//! Each set only lists the codes it remaps; every other code maps to itself.
//! Sets 5 to 9 are plain ASCII.

pub const NUM_CHARACTER_SETS: usize = 10;

const FIRST_PRINTABLE: u8 = 33;
const LAST_PRINTABLE: u8 = 126;

type Overrides = &'static [(u8, &'static str)];

const SET_0: Overrides = &[];

const SET_1: Overrides = &[
    (92, "√"),
    (94, "↑"),
    (95, "_\u{8}"),
    (96, "`\u{8}"),
    (123, "π"),
    (124, "Ⱶ"),
    (125, "→"),
    (126, "~\u{8}"),
];

const SET_2: Overrides = &[
    (35, "£"),
    (39, "´\u{8}"),
    (92, "ç"),
    (94, "ˆ\u{8}"),
    (95, "_\u{8}"),
    (96, "`\u{8}"),
    (123, "¨\u{8}"),
    (124, "˙\u{8}"),
    (125, "˙\u{8}"),
    (126, "'"),
];

const SET_3: Overrides = &[
    (35, "£"),
    (91, "0"),
    (92, "Æ"),
    (93, "𝟶"),
    (94, "æ"),
    (95, "_\u{8}"),
    (123, "\u{8}¨"),
    (124, "\u{8}˙"),
    (125, "\u{8}˙"),
    (126, "\u{8}'"),
];

const SET_4: Overrides = &[
    (35, "¿"),
    (39, "´\u{8}"),
    (91, "0"),
    (92, "Æ"),
    (93, "𝟶"),
    (94, "ˆ\u{8}"),
    (95, "_\u{8}"),
    (123, "\u{8}~"),
    (124, "\u{8}~"),
    (125, "\u{8}~"),
    (126, "\u{8}~"),
];

const SETS: [Overrides; NUM_CHARACTER_SETS] = [
    SET_0, SET_1, SET_2, SET_3, SET_4, SET_0, SET_0, SET_0, SET_0, SET_0,
];

/// Glyph sequence for `code` in character set `set`.
///
/// Returns `None` for codes outside the printable range, which are copied through untouched.
pub fn lookup(set: usize, code: u8) -> Option<&'static str> {
    if !(FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&code) {
        return None;
    }
    let overrides = SETS.get(set).copied().unwrap_or(SET_0);
    overrides
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, glyph)| *glyph)
        .or_else(|| ascii_glyph(code))
}

fn ascii_glyph(code: u8) -> Option<&'static str> {
    const ASCII: &str = "!\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";
    let idx = usize::from(code.checked_sub(FIRST_PRINTABLE)?);
    ASCII.get(idx..idx + 1)
}

/// Substitute a raw label through the given character set.
///
/// The instrument's slashed zero (`0`, backspace, `/`) collapses to a plain zero and the
/// record-separator / group-separator control bytes are dropped.
pub fn substitute(set: usize, raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match u8::try_from(c).ok().and_then(|b| lookup(set, b)) {
            Some(glyph) => out.push_str(glyph),
            None => out.push(c),
        }
    }
    out.replace("0\u{8}/", "0").replace(['\u{1E}', '\u{1D}'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_set_is_identity() {
        for code in FIRST_PRINTABLE..=LAST_PRINTABLE {
            let expected = (code as char).to_string();
            assert_eq!(lookup(0, code), Some(expected.as_str()));
            assert_eq!(lookup(7, code), Some(expected.as_str()));
        }
    }

    #[test]
    fn control_and_space_are_not_mapped() {
        assert_eq!(lookup(0, b' '), None);
        assert_eq!(lookup(1, 0x08), None);
        assert_eq!(lookup(1, 127), None);
    }

    #[test]
    fn european_sets_remap_pound_sign() {
        assert_eq!(lookup(2, b'#'), Some("£"));
        assert_eq!(lookup(3, b'#'), Some("£"));
        assert_eq!(lookup(4, b'#'), Some("¿"));
        assert_eq!(lookup(1, b'{'), Some("π"));
    }

    #[test]
    fn out_of_range_set_falls_back_to_ascii() {
        assert_eq!(lookup(42, b'#'), Some("#"));
    }

    #[test]
    fn substitute_collapses_slashed_zero() {
        assert_eq!(substitute(0, "10\u{8}/0 V"), "100 V");
        assert_eq!(substitute(0, "A\u{1E}B\u{1D}C"), "ABC");
    }

    #[test]
    fn substitute_applies_active_set() {
        assert_eq!(substitute(1, "x{y"), "xπy");
        assert_eq!(substitute(0, "x{y"), "x{y");
    }
}
