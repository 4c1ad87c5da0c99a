//! RFC 1459 casemapping and IRC glob matching.
//!
//! Nicknames, channel names and ban masks all compare case-insensitively
//! under the `rfc1459` mapping, where `[]\~` are the uppercase forms of
//! `{}|^`.

/// Lowercase a single character under RFC 1459 rules.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Casefold a string for use as a map key.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality under RFC 1459 rules.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| irc_lower_char(x) == irc_lower_char(y))
}

/// Match `text` against an IRC glob `pattern` (`*` any run, `?` one char).
///
/// Comparison is casemapped. Runs in O(n*m) worst case without allocation
/// beyond the two char buffers, using the classic backtrack-to-last-star
/// approach.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().map(irc_lower_char).collect();
    let t: Vec<char> = text.chars().map(irc_lower_char).collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_maps_rfc1459_specials() {
        assert_eq!(irc_to_lower("#Chan[1]"), "#chan{1}");
        assert_eq!(irc_to_lower("Nick\\Away~"), "nick|away^");
    }

    #[test]
    fn eq_is_casemapped() {
        assert!(irc_eq("Foo[]", "foo{}"));
        assert!(!irc_eq("foo", "foob"));
    }

    #[test]
    fn wildcard_basic() {
        assert!(wildcard_match("*!*@evil.example", "bob!b@evil.example"));
        assert!(wildcard_match("b?b!*@*", "BOB!x@y"));
        assert!(!wildcard_match("*!*@evil.example", "bob!b@good.example"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("?", ""));
    }

    #[test]
    fn wildcard_backtracks() {
        assert!(wildcard_match("*a*b", "xxaxxab"));
        assert!(!wildcard_match("*a*b", "xxaxxa"));
        assert!(wildcard_match("a**b", "ab"));
    }

    #[test]
    fn wildcard_uses_casemap() {
        assert!(wildcard_match("nick[away]!*@*", "NICK{AWAY}!u@h"));
    }
}
