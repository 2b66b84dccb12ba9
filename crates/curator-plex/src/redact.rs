// SPDX-License-Identifier: GPL-3.0-or-later

use url::Url;

const REDACTED: &str = "REDACTED";

/// Query keys whose values are credentials (matched case-insensitively).
const SENSITIVE_QUERY_KEYS: &[&str] = &["x-plex-token", "token", "access_token", "api_key", "apikey"];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_QUERY_KEYS
        .iter()
        .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
}

/// Render `url` for logging with every token-bearing query value replaced.
pub fn redact_url(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| is_sensitive_key(&key)) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if is_sensitive_key(&key) {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
