// LogTrace - GPL-3.0-or-later
// This file is part of LogTrace.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// LogTrace is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogTrace is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogTrace.  If not, see <https://www.gnu.org/licenses/>.

use fancy_regex::Regex;
use std::sync::LazyLock;

// Order matters: UUIDs contain hex runs, URLs and IPs contain numbers
static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b")
        .expect("valid regex literal")
});
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid regex literal"));
static IP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<![\w.])\d{1,3}(?:\.\d{1,3}){3}(?::\d+)?(?![\w.])").expect("valid regex literal")
});
static HEX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b0x[0-9a-fA-F]+\b|\b(?=[0-9a-fA-F]*\d)[0-9a-fA-F]{8,}\b")
        .expect("valid regex literal")
});
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<![\w.])[-+]?\d+(?:\.\d+)?(?![\w.])").expect("valid regex literal")
});

/// Replace variable substrings of a message with typed placeholders
/// (`<UUID>`, `<URL>`, `<IP>`, `<HEX>`, `<NUM>`).
///
/// Unlike a plain normalization key this keeps case and whitespace, since
/// the miner tokenizes the result afterwards.
#[must_use]
pub fn mask_message(message: &str) -> String {
    let patterns: [(&Regex, &str); 5] = [
        (&*UUID_PATTERN, "<UUID>"),
        (&*URL_PATTERN, "<URL>"),
        (&*IP_PATTERN, "<IP>"),
        (&*HEX_PATTERN, "<HEX>"),
        (&*NUMBER_PATTERN, "<NUM>"),
    ];

    patterns
        .into_iter()
        .fold(message.to_string(), |masked, (pattern, placeholder)| {
            pattern.replace_all(&masked, placeholder).into_owned()
        })
}

/// Whether a token is a placeholder left by [`mask_message`]
#[must_use]
pub fn is_mask(token: &str) -> bool {
    matches!(token, "<UUID>" | "<URL>" | "<IP>" | "<HEX>" | "<NUM>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_numbers_and_ip() {
        let msg = "User 12345 logged in from 192.168.1.100";
        assert_eq!(mask_message(msg), "User <NUM> logged in from <IP>");
    }

    #[test]
    fn test_mask_uuid() {
        let msg = "Request ID: 550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(mask_message(msg), "Request ID: <UUID>");
    }

    #[test]
    fn test_mask_url() {
        let msg = "Fetching https://api.example.com/data?id=3";
        assert_eq!(mask_message(msg), "Fetching <URL>");
    }

    #[test]
    fn test_mask_hex() {
        assert_eq!(mask_message("ptr 0xdeadBEEF freed"), "ptr <HEX> freed");
        assert_eq!(mask_message("commit 3fa9c0e1d2 applied"), "commit <HEX> applied");
    }

    #[test]
    fn test_keeps_identifiers() {
        // Numbers glued to words or dotted names are not values
        let msg = "c.e.Api2 - handler v2 took 15 ms";
        assert_eq!(mask_message(msg), "c.e.Api2 - handler v2 took <NUM> ms");
    }

    #[test]
    fn test_is_mask() {
        assert!(is_mask("<NUM>"));
        assert!(!is_mask("<*>"));
        assert!(!is_mask("NUM"));
    }
}
