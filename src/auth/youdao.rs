//! Youdao open-platform `v3` request signature.

use secrecy::{ExposeSecret, SecretString};

use super::signing::sha256_hex;

pub const SIGN_TYPE: &str = "v3";

/// `q` itself when at most 20 characters, otherwise first 10 + length + last 10.
pub fn truncate_input(q: &str) -> String {
    let chars: Vec<char> = q.chars().collect();
    let len = chars.len();
    if len <= 20 {
        return q.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[len - 10..].iter().collect();
    format!("{head}{len}{tail}")
}

/// `sha256(appKey + truncate(q) + salt + curtime + appSecret)`, lowercase hex.
pub fn sign(app_key: &str, app_secret: &SecretString, q: &str, salt: &str, curtime: i64) -> String {
    sha256_hex(format!(
        "{app_key}{}{salt}{curtime}{}",
        truncate_input(q),
        app_secret.expose_secret()
    ))
}
