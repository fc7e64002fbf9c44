//! Canonical scalar forms.
//!
//! Every function is total: input that does not parse as the requested form
//! comes back as whitespace-collapsed text, so a typo in a config shows up as
//! a textual change instead of aborting the parse.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Upper bound on elements produced by expanding one `a-b` range
pub const MAX_RANGE_EXPANSION: u64 = 65_536;

/// How a scalar value is canonicalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Whitespace collapsed, otherwise verbatim
    #[default]
    Text,
    /// Case-folded
    Keyword,
    /// IPv4/IPv6 address
    Ip,
    /// Network prefix, host bits cleared
    Cidr,
    /// `address mask` pair rewritten as `address/len`
    IpMask,
    Integer,
}

/// Split on whitespace outside double quotes; quoted runs stay inside their token verbatim
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quote = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quote = false;
            }
            continue;
        }
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(&text[s..i]);
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            if c == '"' {
                in_quote = true;
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

pub fn collapse_whitespace(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Strip one pair of surrounding double quotes
pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

pub fn canonicalize(kind: ValueKind, text: &str) -> String {
    let text = collapse_whitespace(text);
    let canonical = match kind {
        ValueKind::Text => None,
        ValueKind::Keyword => Some(text.to_lowercase()),
        ValueKind::Ip => canonical_ip(&text),
        ValueKind::Cidr => canonical_cidr(&text),
        ValueKind::IpMask => canonical_ip_mask(&text),
        ValueKind::Integer => canonical_integer(&text),
    };
    canonical.unwrap_or(text)
}

pub fn canonical_ip(text: &str) -> Option<String> {
    unquote(text).parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// `10.1.2.3/24` -> `10.1.2.0/24`; a bare address gets a host prefix length
pub fn canonical_cidr(text: &str) -> Option<String> {
    let text = unquote(text);
    let (addr, len) = match text.split_once('/') {
        Some((addr, len)) => (addr.parse::<IpAddr>().ok()?, Some(len.parse::<u8>().ok()?)),
        None => (text.parse::<IpAddr>().ok()?, None),
    };
    match addr {
        IpAddr::V4(v4) => {
            let len = len.unwrap_or(32);
            if len > 32 {
                return None;
            }
            let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };
            Some(format!("{}/{}", Ipv4Addr::from(u32::from(v4) & mask), len))
        }
        IpAddr::V6(v6) => {
            let len = len.unwrap_or(128);
            if len > 128 {
                return None;
            }
            let mask = if len == 0 { 0 } else { u128::MAX << (128 - len) };
            Some(format!("{}/{}", Ipv6Addr::from(u128::from(v6) & mask), len))
        }
    }
}

/// `10.0.0.1 255.255.255.0` -> `10.0.0.1/24`; trailing tokens (`secondary`) are kept
pub fn canonical_ip_mask(text: &str) -> Option<String> {
    let mut tokens = text.split_whitespace();
    let addr = tokens.next()?.parse::<Ipv4Addr>().ok()?;
    let mask = u32::from(tokens.next()?.parse::<Ipv4Addr>().ok()?);
    let len = mask.leading_ones();
    if mask.checked_shl(len).unwrap_or(0) != 0 {
        return None;
    }
    let mut out = format!("{}/{}", addr, len);
    for rest in tokens {
        out.push(' ');
        out.push_str(rest);
    }
    Some(out)
}

pub fn canonical_integer(text: &str) -> Option<String> {
    let text = unquote(text);
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse::<i128>().ok().map(|n| n.to_string())
}

/// Split a value list and expand numeric ranges: `10,20,30-32` -> 10 20 30 31 32.
///
/// `[` and `]` tokens (braced-CLI lists) are dropped. A range that is
/// reversed, non-numeric or larger than [`MAX_RANGE_EXPANSION`] is kept as
/// one element.
pub fn split_values(text: &str, separator: &str, expand_ranges: bool) -> Vec<String> {
    let pieces: Vec<&str> = if separator.trim().is_empty() {
        text.split_whitespace().collect()
    } else {
        text.split(separator).collect()
    };

    let mut out = Vec::new();
    for piece in pieces {
        let piece = piece.trim().trim_matches(|c| c == '[' || c == ']').trim();
        if piece.is_empty() {
            continue;
        }
        match expand_ranges.then(|| expand_range(piece)).flatten() {
            Some(expanded) => out.extend(expanded),
            None => out.push(piece.to_string()),
        }
    }
    out
}

fn expand_range(piece: &str) -> Option<Vec<String>> {
    let (lo, hi) = piece.split_once('-')?;
    let lo = lo.trim().parse::<u64>().ok()?;
    let hi = hi.trim().parse::<u64>().ok()?;
    if hi < lo || hi - lo >= MAX_RANGE_EXPANSION {
        return None;
    }
    Some((lo..=hi).map(|n| n.to_string()).collect())
}

/// Drop a leading sequence number (`10 permit ip any any` -> `permit ip any any`)
pub fn strip_sequence(text: &str) -> String {
    let tokens = tokenize(text);
    let is_number = |t: &&str| t.chars().all(|c| c.is_ascii_digit());
    let skip = match tokens.as_slice() {
        [first, ..] if is_number(first) => 1,
        [first, second, ..]
            if (first.eq_ignore_ascii_case("seq") || first.eq_ignore_ascii_case("sequence"))
                && is_number(second) =>
        {
            2
        }
        _ => 0,
    };
    if skip == tokens.len() {
        return tokens.join(" ");
    }
    tokens[skip..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  ip   route \t 0.0.0.0  "), "ip route 0.0.0.0");
    }

    #[test]
    fn test_quoted_whitespace_is_kept() {
        assert_eq!(
            collapse_whitespace(r#"description  "core  uplink"   ;"#),
            r#"description "core  uplink" ;"#
        );
        assert_eq!(tokenize(r#"set key="a b" x"#), vec!["set", r#"key="a b""#, "x"]);
    }

    #[test]
    fn test_ipv6_normalized() {
        assert_eq!(
            canonical_ip("2001:0db8:0000:0000:0000:0000:0000:0001").as_deref(),
            Some("2001:db8::1")
        );
        assert_eq!(canonical_ip("not-an-ip"), None);
    }

    #[test]
    fn test_cidr_clears_host_bits() {
        assert_eq!(canonical_cidr("10.1.2.3/24").as_deref(), Some("10.1.2.0/24"));
        assert_eq!(canonical_cidr("10.1.2.3").as_deref(), Some("10.1.2.3/32"));
        assert_eq!(canonical_cidr("0.0.0.0/0").as_deref(), Some("0.0.0.0/0"));
        assert_eq!(canonical_cidr("2001:db8::1/64").as_deref(), Some("2001:db8::/64"));
        assert_eq!(canonical_cidr("10.0.0.0/33"), None);
    }

    #[test]
    fn test_ip_mask_to_prefix_length() {
        assert_eq!(
            canonical_ip_mask("10.0.0.1 255.255.255.0").as_deref(),
            Some("10.0.0.1/24")
        );
        assert_eq!(
            canonical_ip_mask("10.0.0.1 255.255.255.252 secondary").as_deref(),
            Some("10.0.0.1/30 secondary")
        );
        assert_eq!(canonical_ip_mask("10.0.0.1 255.0.255.0"), None);
    }

    #[test]
    fn test_canonicalize_falls_back_to_text() {
        assert_eq!(canonicalize(ValueKind::Ip, " dhcp "), "dhcp");
        assert_eq!(canonicalize(ValueKind::Integer, "0042"), "42");
        assert_eq!(canonicalize(ValueKind::Keyword, "Enable"), "enable");
    }

    #[test]
    fn test_split_values_expands_ranges() {
        assert_eq!(
            split_values("10,20,30-32", ",", true),
            vec!["10", "20", "30", "31", "32"]
        );
        assert_eq!(split_values("[ 10 20 ]", " ", false), vec!["10", "20"]);
        assert_eq!(split_values("5-1", ",", true), vec!["5-1"]);
    }

    #[test]
    fn test_strip_sequence() {
        assert_eq!(strip_sequence("10 permit ip any any"), "permit ip any any");
        assert_eq!(strip_sequence("seq 5 deny 10.0.0.0/8"), "deny 10.0.0.0/8");
        assert_eq!(strip_sequence("permit ip any any"), "permit ip any any");
        assert_eq!(strip_sequence("100"), "100");
    }
}
