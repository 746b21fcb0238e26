//! Body-copy sanitiser.
//!
//! Copy that passed through a UTF-8 / Windows-1252 mix-up arrives with
//! sequences like `â€™` where an apostrophe should be. This module decodes
//! HTML entities and folds those artifacts back into plain punctuation.

/// Mis-decoded sequences and their plain replacements, longest first so a
/// double-encoded sequence is never half-replaced by a shorter pattern.
const ARTIFACTS: &[(&str, &str)] = &[
    ("Ã¢â‚¬â„¢", "'"),
    ("Ã¢â‚¬Ëœ", "'"),
    ("Ã¢â‚¬Å“", "\""),
    ("Ã¢â‚¬â€œ", "-"),
    ("Ã¢â‚¬â€\u{9d}", "-"),
    ("Ã¢â‚¬Â¦", "..."),
    ("Ã¢â‚¬", "'"),
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("â€¢", "*"),
    ("â†’", "->"),
    ("Â\u{a0}", " "),
    ("â€", "\""),
];

/// Decode entities and normalise encoding artifacts in `s`.
pub fn clean_text(s: &str) -> String {
    let mut out = unescape_entities(s);
    for (bad, good) in ARTIFACTS {
        if out.contains(bad) {
            out = out.replace(bad, good);
        }
    }
    out
}

/// Longest entity body we try to decode (`#x10FFFF` is 8 chars).
const MAX_ENTITY_LEN: usize = 10;

/// Decode named and numeric HTML character references. Anything that does
/// not parse is left untouched.
fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|(_, c)| *c == ';')
            .and_then(|(semi, _)| decode_entity(&after[..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "rsquo" | "lsquo" => Some('\''),
        "rdquo" | "ldquo" => Some('"'),
        "ndash" | "mdash" => Some('-'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
