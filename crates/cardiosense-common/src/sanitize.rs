// Text clean-up for suggestions and warnings before they reach a user.
// Ayurveda and yoga content carries IAST transliteration (ā, ṛ, ś, ...), and
// provider output mixes precomposed letters with base + combining-mark
// sequences. Everything is brought to one precomposed form so the same
// herb or asana name always compares and renders identically.
//
// Every stage below is idempotent and no stage can produce input that an
// earlier stage would change, so `sanitize_text` is idempotent as a whole.

/// Sanitize a user-facing string: drop invisible/control characters,
/// normalize typographic punctuation, compose IAST diacritics and collapse
/// whitespace.
pub fn sanitize_text(raw: &str) -> String {
    let visible = remove_invisible_chars(raw);
    let plain = normalize_punctuation(&visible);
    let composed = compose_iast(&plain);
    collapse_whitespace(&composed)
}

/// Remove zero-width, bidi-control and C0/C1 control characters.
/// Whitespace controls become spaces so words stay separated.
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if matches!(c, '\n' | '\t' | '\r') {
                return Some(' ');
            }
            if matches!(
                c,
                '\u{200B}'  // Zero-width space
                | '\u{200C}' // Zero-width non-joiner
                | '\u{200D}' // Zero-width joiner
                | '\u{200E}' // Left-to-right mark
                | '\u{200F}' // Right-to-left mark
                | '\u{202A}'..='\u{202E}' // Bidi embeddings / overrides
                | '\u{2060}'..='\u{2064}' // Word joiner, invisible operators
                | '\u{FEFF}' // BOM
            ) || c.is_control()
            {
                return None;
            }
            Some(c)
        })
        .collect()
}

fn normalize_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201F}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

const MACRON: char = '\u{0304}';
const DOT_BELOW: char = '\u{0323}';
const DOT_ABOVE: char = '\u{0307}';
const TILDE: char = '\u{0303}';
const ACUTE: char = '\u{0301}';

/// Decomposed IAST sequences and their precomposed letters.
/// Three-character sequences are listed so longest-match can find them.
const IAST_COMPOSITIONS: &[(&[char], char)] = &[
    (&['r', DOT_BELOW, MACRON], '\u{1E5D}'), // ṝ
    (&['R', DOT_BELOW, MACRON], '\u{1E5C}'), // Ṝ
    (&['l', DOT_BELOW, MACRON], '\u{1E39}'), // ḹ
    (&['L', DOT_BELOW, MACRON], '\u{1E38}'), // Ḹ
    (&['a', MACRON], '\u{0101}'),            // ā
    (&['A', MACRON], '\u{0100}'),            // Ā
    (&['i', MACRON], '\u{012B}'),            // ī
    (&['I', MACRON], '\u{012A}'),            // Ī
    (&['u', MACRON], '\u{016B}'),            // ū
    (&['U', MACRON], '\u{016A}'),            // Ū
    (&['e', MACRON], '\u{0113}'),            // ē
    (&['o', MACRON], '\u{014D}'),            // ō
    (&['r', DOT_BELOW], '\u{1E5B}'),         // ṛ
    (&['R', DOT_BELOW], '\u{1E5A}'),         // Ṛ
    (&['l', DOT_BELOW], '\u{1E37}'),         // ḷ
    (&['L', DOT_BELOW], '\u{1E36}'),         // Ḷ
    (&['m', DOT_ABOVE], '\u{1E41}'),         // ṁ
    (&['M', DOT_ABOVE], '\u{1E40}'),         // Ṁ
    (&['m', DOT_BELOW], '\u{1E43}'),         // ṃ
    (&['M', DOT_BELOW], '\u{1E42}'),         // Ṃ
    (&['h', DOT_BELOW], '\u{1E25}'),         // ḥ
    (&['H', DOT_BELOW], '\u{1E24}'),         // Ḥ
    (&['n', DOT_ABOVE], '\u{1E45}'),         // ṅ
    (&['N', DOT_ABOVE], '\u{1E44}'),         // Ṅ
    (&['n', TILDE], '\u{00F1}'),             // ñ
    (&['N', TILDE], '\u{00D1}'),             // Ñ
    (&['t', DOT_BELOW], '\u{1E6D}'),         // ṭ
    (&['T', DOT_BELOW], '\u{1E6C}'),         // Ṭ
    (&['d', DOT_BELOW], '\u{1E0D}'),         // ḍ
    (&['D', DOT_BELOW], '\u{1E0C}'),         // Ḍ
    (&['n', DOT_BELOW], '\u{1E47}'),         // ṇ
    (&['N', DOT_BELOW], '\u{1E46}'),         // Ṇ
    (&['s', ACUTE], '\u{015B}'),             // ś
    (&['S', ACUTE], '\u{015A}'),             // Ś
    (&['s', DOT_BELOW], '\u{1E63}'),         // ṣ
    (&['S', DOT_BELOW], '\u{1E62}'),         // Ṣ
];

/// Greedy longest-match composition. Composed letters are never the base of
/// another entry, so a second pass finds nothing new.
fn compose_iast(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    'outer: while i < chars.len() {
        for (sequence, composed) in IAST_COMPOSITIONS {
            let end = i + sequence.len();
            if end <= chars.len() && chars[i..end] == **sequence {
                out.push(*composed);
                i = end;
                continue 'outer;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_composes_decomposed_iast() {
        let decomposed = "Tr\u{0131}phala\u{0304} and s\u{0301}ava\u{0304}sana";
        let clean = sanitize_text(decomposed);
        assert!(clean.contains("phalā"));
        assert!(clean.contains("śavāsana"));
    }

    #[test]
    fn test_long_vowel_r_prefers_three_char_sequence() {
        assert_eq!(sanitize_text("pitr\u{0323}\u{0304}n"), "pit\u{1E5D}n");
    }

    #[test]
    fn test_precomposed_input_unchanged() {
        let s = "Vṛkṣāsana (tree pose) with prāṇāyāma";
        assert_eq!(sanitize_text(s), s);
    }

    #[test]
    fn test_strips_zero_width_and_collapses_space() {
        let s = "  Arjuna\u{200B} bark\n\n  (Terminalia\tarjuna)  ";
        assert_eq!(sanitize_text(s), "Arjuna bark (Terminalia arjuna)");
    }

    #[test]
    fn test_typographic_punctuation() {
        assert_eq!(sanitize_text("“Walk” 30 min — daily…"), "\"Walk\" 30 min - daily...");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn test_sanitize_idempotent_on_iast(
            s in "[aiurlmnhtdsAIURLMNHTDS \u{0304}\u{0323}\u{0307}\u{0303}\u{0301}\u{200B}\u{2014}\u{2026}\n\t]{0,40}"
        ) {
            let once = sanitize_text(&s);
            let twice = sanitize_text(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_sanitize_idempotent_on_any_string(s in "\\PC{0,60}") {
            let once = sanitize_text(&s);
            prop_assert_eq!(sanitize_text(&once), once);
        }
    }
}
