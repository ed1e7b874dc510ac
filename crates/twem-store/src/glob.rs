//! Redis-style glob matching for `KEYS`.

/// Match `text` against a glob `pattern`.
///
/// Supports `*`, `?`, character classes (`[abc]`, `[^a]`, `[a-z]`) and
/// backslash escapes.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', _)) => {
            let rest = trim_stars(pattern);
            if rest.is_empty() {
                return true;
            }
            (0..=text.len()).any(|i| glob_match(rest, &text[i..]))
        }
        Some((b'?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((b'[', rest)) => match text.split_first() {
            Some((&c, text_rest)) => {
                let (matched, after) = match_class(rest, c);
                matched && glob_match(after, text_rest)
            }
            None => false,
        },
        Some((b'\\', [escaped, rest @ ..])) => {
            text.first() == Some(escaped) && glob_match(rest, &text[1..])
        }
        Some((p, rest)) => text.first() == Some(p) && glob_match(rest, &text[1..]),
    }
}

fn trim_stars(mut pattern: &[u8]) -> &[u8] {
    while let [b'*', rest @ ..] = pattern {
        pattern = rest;
    }
    pattern
}

/// Match one byte against a class body (after `[`), returning whether it
/// matched and the pattern after the closing `]`.
fn match_class(pattern: &[u8], c: u8) -> (bool, &[u8]) {
    let (negate, mut p) = match pattern {
        [b'^', rest @ ..] => (true, rest),
        _ => (false, pattern),
    };
    let mut matched = false;

    loop {
        match p {
            [] => break,
            [b']', rest @ ..] => {
                p = rest;
                break;
            }
            [b'\\', escaped, rest @ ..] => {
                matched |= *escaped == c;
                p = rest;
            }
            [lo, b'-', hi, rest @ ..] if *hi != b']' => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                matched |= (lo..=hi).contains(&c);
                p = rest;
            }
            [x, rest @ ..] => {
                matched |= *x == c;
                p = rest;
            }
        }
    }

    (matched != negate, p)
}
