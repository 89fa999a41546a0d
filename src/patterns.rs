//! Keyword tables and compiled patterns shared by the classifiers.

use once_cell::sync::Lazy;
use regex::Regex;

pub const SMS_SPAM_KEYWORDS: &[&str] = &[
    "free",
    "winner",
    "congratulations",
    "claim now",
    "urgent",
    "click here",
    "limited time",
    "act now",
    "you have won",
    "prize",
    "lottery",
    "gift card",
    "verify account",
    "suspended",
    "expired",
    "update now",
    "confirm your identity",
    "pay now",
    "loan approved",
    "investment opportunity",
    "guaranteed",
    "no credit check",
];

/// Matched case-sensitively against the raw sender.
pub const SUSPICIOUS_SENDER_TOKENS: &[&str] = &["+44", "+1", "+91", "UNKNOWN", "BLOCKED"];

pub const EMAIL_SPAM_KEYWORDS: &[&str] = &[
    "act now",
    "limited offer",
    "exclusive deal",
    "winner",
    "congratulations",
    "claim your prize",
    "urgent action required",
    "verify your account",
    "suspended account",
    "click here",
    "free money",
    "guaranteed income",
    "no credit check",
    "get rich quick",
    "investment opportunity",
    "work from home",
    "viagra",
    "pharmacy",
    "weight loss",
    "lose weight fast",
    "buy now",
    "discount",
    "sale",
    "clearance",
    "limited time",
    "expires soon",
];

pub const SUSPICIOUS_EMAIL_DOMAINS: &[&str] = &["mail.ru", "yandex.com", "qq.com", "163.com"];

pub static SMS_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(http|https|www\.|bit\.ly|tinyurl)").expect("Invalid SMS link regex"));

pub static EMAIL_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(http|https|www\.|bit\.ly|tinyurl|short\.link)").expect("Invalid email link regex")
});

pub static SMS_URGENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(urgent|immediate|now|hurry|expires|limited)").expect("Invalid SMS urgency regex")
});

pub static EMAIL_URGENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(urgent|immediate|now|hurry|expires|limited|act now|verify)")
        .expect("Invalid email urgency regex")
});

pub static REPEATED_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!{2,}|\${2,}").expect("Invalid punctuation regex"));

/// Number of `table` phrases found in `haystack`, which must already be lower-cased.
pub fn count_keywords(haystack: &str, table: &[&str]) -> usize {
    table
        .iter()
        .filter(|keyword| haystack.contains(*keyword))
        .count()
}

pub fn contains_any(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| haystack.contains(token))
}
