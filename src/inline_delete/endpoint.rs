//! Endpoint and anti-forgery token derivation.

use std::sync::LazyLock;

use regex::Regex;

static CHANGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+/change/?$").expect("change suffix pattern is valid"));

/// Strips a trailing `/{id}/change/` from a change-form path.
pub fn admin_root(path: &str) -> &str {
    match CHANGE_SUFFIX.find(path) {
        Some(found) => &path[..found.start()],
        None => path,
    }
}

/// `{admin_root}/{segment}/{row_id}/`
pub fn delete_url(path: &str, segment: &str, row_id: &str) -> String {
    let root = admin_root(path).trim_end_matches('/');
    format!("{root}/{segment}/{row_id}/")
}

/// Value of cookie `name` in a `document.cookie` string, percent-decoded.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() != name {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| percent_decode(value))
    })
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let (high, low) = (bytes[index + 1], bytes[index + 2]);
            if high.is_ascii_hexdigit() && low.is_ascii_hexdigit() {
                decoded.push(hex_value(high) << 4 | hex_value(low));
                index += 3;
                continue;
            }
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
