//! Date-format patterns in the `YYYY-MM-DD-HH-mm-ss` style.
//!
//! Tokens are matched longest first. Text inside `[...]` is copied verbatim without
//! the brackets; an unmatched `[` is an ordinary character. Anything that is not a
//! token passes through unchanged.

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

// Longest first so `YYYY` wins over `YY` and `Y`.
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "DDDD", "dddd", "MMM", "DDD", "ddd", "SSS", "YY", "MM", "DD", "Do", "HH",
    "hh", "kk", "mm", "ss", "SS", "WW", "ZZ", "Y", "M", "D", "d", "H", "h", "k", "m", "s", "S",
    "W", "Q", "Z", "A", "a", "X", "x",
];

pub fn format_timestamp<Tz: TimeZone>(pattern: &str, at: &DateTime<Tz>) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while let Some(first) = rest.chars().next() {
        if first == '[' {
            if let Some(close) = rest.find(']') {
                out.push_str(&rest[1..close]);
                rest = &rest[close + 1..];
                continue;
            }
        }

        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str(&render_token(token, at));
            rest = &rest[token.len()..];
            continue;
        }

        out.push(first);
        rest = &rest[first.len_utf8()..];
    }

    out
}

fn render_token<Tz: TimeZone>(token: &str, at: &DateTime<Tz>) -> String {
    let hour12 = match at.hour() % 12 {
        0 => 12,
        h => h,
    };
    let hour24 = match at.hour() {
        0 => 24,
        h => h,
    };
    let millis = at.timestamp_subsec_millis().min(999);
    let month_name = MONTHS[at.month0() as usize];
    let weekday_name = WEEKDAYS[at.weekday().num_days_from_sunday() as usize];

    match token {
        "YYYY" => format!("{:04}", at.year()),
        "YY" => format!("{:02}", at.year().rem_euclid(100)),
        "Y" => at.year().to_string(),
        "MMMM" => month_name.to_string(),
        "MMM" => month_name[..3].to_string(),
        "MM" => format!("{:02}", at.month()),
        "M" => at.month().to_string(),
        "DD" => format!("{:02}", at.day()),
        "D" => at.day().to_string(),
        "Do" => ordinal(at.day()),
        "dddd" => weekday_name.to_string(),
        "ddd" => weekday_name[..3].to_string(),
        "d" => at.weekday().num_days_from_sunday().to_string(),
        "HH" => format!("{:02}", at.hour()),
        "H" => at.hour().to_string(),
        "hh" => format!("{:02}", hour12),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", at.minute()),
        "m" => at.minute().to_string(),
        "ss" => format!("{:02}", at.second()),
        "s" => at.second().to_string(),
        "DDDD" => format!("{:03}", at.ordinal()),
        "DDD" => at.ordinal().to_string(),
        "Q" => (at.month0() / 3 + 1).to_string(),
        "WW" => format!("{:02}", at.iso_week().week()),
        "W" => at.iso_week().week().to_string(),
        "kk" => format!("{:02}", hour24),
        "k" => hour24.to_string(),
        "SSS" => format!("{:03}", millis),
        "SS" => format!("{:02}", millis / 10),
        "S" => (millis / 100).to_string(),
        "Z" => utc_offset(at.offset().fix().local_minus_utc(), ":"),
        "ZZ" => utc_offset(at.offset().fix().local_minus_utc(), ""),
        "A" => (if at.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if at.hour() < 12 { "am" } else { "pm" }).to_string(),
        "X" => at.timestamp().to_string(),
        "x" => at.timestamp_millis().to_string(),
        other => other.to_string(),
    }
}

/// `+05:30` style offset, with `separator` between hours and minutes.
fn utc_offset(seconds: i32, separator: &str) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{}{:02}{}{:02}", sign, minutes / 60, separator, minutes % 60)
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}
