//! Unicode date patterns (`yyyyMMdd`, `yy/MM`, `HH'h'mm`, …).
//!
//! Templates carry user-facing date formats written with the familiar
//! pattern letters rather than `time`'s format descriptions, so they are
//! interpreted here. Runs of a recognised letter become a date component,
//! text between single quotes is copied verbatim (`''` is a literal quote)
//! and everything else, including letters we don't support, passes through
//! unchanged.

use crate::render::zero_pad;
use time::macros::format_description;
use time::{Month, PrimitiveDateTime, Weekday};

/// Parses the `yyyy:MM:dd HH:mm:ss` form that EXIF date tags use.
pub fn parse_exif(value: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value.trim(), format_description!("[year]:[month]:[day] [hour]:[minute]:[second]")).ok()
}

/// Renders `datetime` according to a Unicode date pattern.
pub fn format(datetime: PrimitiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
                continue;
            }
            // Quoted literal, until the closing quote or end of pattern.
            while let Some(q) = chars.next() {
                if q == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        out.push('\'');
                        continue;
                    }
                    break;
                }
                out.push(q);
            }
            continue;
        }
        if !c.is_ascii_alphabetic() {
            out.push(c);
            continue;
        }
        let mut count = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            count += 1;
        }
        component(&mut out, datetime, c, count);
    }
    out
}

fn component(out: &mut String, dt: PrimitiveDateTime, letter: char, count: usize) {
    let padded = |out: &mut String, value: i64| out.push_str(&zero_pad(i128::from(value), count));
    match letter {
        'y' | 'u' if count == 2 => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
        'y' | 'u' => padded(out, i64::from(dt.year())),
        'M' | 'L' => match count {
            1 | 2 => padded(out, i64::from(u8::from(dt.month()))),
            3 => out.push_str(&month_name(dt.month())[..3]),
            _ => out.push_str(month_name(dt.month())),
        },
        'd' => padded(out, i64::from(dt.day())),
        'D' => padded(out, i64::from(dt.ordinal())),
        'E' | 'e' | 'c' if count <= 3 => out.push_str(&weekday_name(dt.weekday())[..3]),
        'E' | 'e' | 'c' => out.push_str(weekday_name(dt.weekday())),
        'H' => padded(out, i64::from(dt.hour())),
        'k' => padded(out, i64::from(if dt.hour() == 0 { 24 } else { dt.hour() })),
        'h' => padded(out, i64::from(twelve_hour(dt.hour()))),
        'K' => padded(out, i64::from(dt.hour() % 12)),
        'm' => padded(out, i64::from(dt.minute())),
        's' => padded(out, i64::from(dt.second())),
        'S' => {
            // Fractional seconds, truncated (or zero-extended) to `count` digits.
            let mut nanos = format!("{:09}", dt.nanosecond());
            nanos.truncate(count);
            out.push_str(&nanos);
            (nanos.len()..count).for_each(|_| out.push('0'));
        },
        'a' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
        other => (0..count).for_each(|_| out.push(other)),
    }
}

fn twelve_hour(hour: u8) -> u8 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}
