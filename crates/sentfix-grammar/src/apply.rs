use sentfix_core::GrammarMatch;

/// Apply the first suggested replacement of each match to `text`.
///
/// Offsets are UTF-16 code units into the unmodified `text`. Matches are
/// applied in offset order with a running shift. A match is skipped when it
/// has no replacements, falls outside the text, or its span no longer holds
/// the text it originally flagged (an earlier overlapping match rewrote it).
/// A match whose span would split a surrogate pair is skipped too.
pub fn apply_matches(text: &str, matches: &[GrammarMatch]) -> String {
    let original: Vec<u16> = text.encode_utf16().collect();
    let mut units = original.clone();

    let mut ordered: Vec<&GrammarMatch> = matches
        .iter()
        .filter(|m| !m.replacements.is_empty())
        .collect();
    ordered.sort_by_key(|m| m.offset);

    let mut shift: isize = 0;
    for m in ordered {
        let end = m.offset + m.length;
        if end > original.len()
            || splits_surrogate_pair(&original, m.offset)
            || splits_surrogate_pair(&original, end)
        {
            continue;
        }
        let flagged = &original[m.offset..end];

        let Ok(from) = usize::try_from(m.offset as isize + shift) else {
            continue;
        };
        let to = from + m.length;
        if to > units.len() || units[from..to] != *flagged {
            continue;
        }

        let replacement: Vec<u16> = m.replacements[0].encode_utf16().collect();
        shift += replacement.len() as isize - m.length as isize;
        units.splice(from..to, replacement);
    }

    String::from_utf16_lossy(&units)
}

/// True when `at` falls between the high and low halves of a surrogate pair.
fn splits_surrogate_pair(units: &[u16], at: usize) -> bool {
    at > 0
        && at < units.len()
        && (0xD800..0xDC00).contains(&units[at - 1])
        && (0xDC00..0xE000).contains(&units[at])
}
