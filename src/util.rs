use crate::attr::Value;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::any::Any;
use std::fmt::{self, Write as _};
use std::time::Duration;
use unicode_general_category::{get_general_category, GeneralCategory};

pub(crate) const ANSI_ESC: char = '\u{1b}';
pub(crate) const ANSI_RESET: &str = "\u{1b}[0m";
pub(crate) const ANSI_FAINT: &str = "\u{1b}[2m";
pub(crate) const ANSI_RESET_FAINT: &str = "\u{1b}[22m";
pub(crate) const ANSI_BRIGHT_RED: &str = "\u{1b}[91m";
pub(crate) const ANSI_BRIGHT_GREEN: &str = "\u{1b}[92m";
pub(crate) const ANSI_BRIGHT_YELLOW: &str = "\u{1b}[93m";
pub(crate) const ANSI_BRIGHT_CYAN: &str = "\u{1b}[96m";
pub(crate) const ANSI_GRAY: &str = "\u{1b}[90m";
pub(crate) const ANSI_WHITE: &str = "\u{1b}[97m";

/// Last-resort reporting for failures inside the logger itself. Bypasses
/// every handler and writes straight to stderr.
pub fn fallback_error(msg: impl fmt::Display) {
    eprintln!("{msg}");
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Reports whether `s` must be quoted to stay a single `key=value` token.
///
/// The empty string always needs quoting. ANSI escape bytes do not force
/// quoting on their own, and neither does a backslash.
pub fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    s.chars().any(|c| {
        if c.is_ascii() {
            c != '\\' && !is_safe_ascii(c)
        } else {
            !is_printable(c)
        }
    })
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space. Other
/// separators and every `C*` category (control, format, private use,
/// surrogate, unassigned) are not printable.
pub fn is_printable(c: char) -> bool {
    if c.is_ascii() {
        return c == ' ' || c.is_ascii_graphic();
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::PrivateUse
            | GeneralCategory::Surrogate
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

fn is_safe_ascii(c: char) -> bool {
    match c {
        ' ' | '=' | '"' => false,
        '\u{1b}' | '\u{7f}' => true,
        c => !c.is_ascii_control(),
    }
}

/// Removes ANSI escape sequences: everything from an ESC up to and including
/// the next ASCII letter.
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if c == ANSI_ESC {
            in_escape = true;
        } else if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Appends `s` as a double-quoted literal with control and non-printable
/// characters escaped. With `keep_esc`, ESC bytes pass through raw so that
/// embedded color sequences still take effect.
fn append_quoted(buf: &mut Vec<u8>, s: &str, keep_esc: bool) {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            ANSI_ESC if keep_esc => out.push(c),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if !is_printable(c) && (c as u32) <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if !is_printable(c) => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    buf.extend_from_slice(out.as_bytes());
}

/// Appends a string token, quoting it when `quote` is set and the text needs
/// it. Without color, ANSI sequences are stripped first so that they neither
/// leak into plain output nor force quoting.
pub(crate) fn append_string(buf: &mut Vec<u8>, s: &str, quote: bool, color: bool) {
    let stripped;
    let s = if quote && !color {
        stripped = strip_ansi(s);
        stripped.as_str()
    } else {
        s
    };
    if quote && needs_quoting(s) {
        append_quoted(buf, s, color);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Appends the SGR sequence selecting palette color `color`.
pub(crate) fn append_ansi(buf: &mut Vec<u8>, color: u8, faint: bool) {
    buf.extend_from_slice(b"\x1b[");
    if faint {
        buf.extend_from_slice(b"2;");
    }
    let code = if color < 8 {
        format!("{}", u32::from(color) + 30)
    } else if color < 16 {
        format!("{}", u32::from(color) + 82)
    } else {
        format!("38;5;{color}")
    };
    buf.extend_from_slice(code.as_bytes());
    buf.push(b'm');
}

/// Human form of a duration using the largest fitting units:
/// `0s`, `250ns`, `1.5µs`, `20ms`, `1.5s`, `1m30s`, `2h0m5s`.
pub fn format_duration(d: Duration) -> String {
    const NS_PER_US: u128 = 1_000;
    const NS_PER_MS: u128 = 1_000_000;
    const NS_PER_S: u128 = 1_000_000_000;

    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NS_PER_US {
        return format!("{nanos}ns");
    }
    if nanos < NS_PER_MS {
        return format!("{}µs", decimal(nanos, NS_PER_US));
    }
    if nanos < NS_PER_S {
        return format!("{}ms", decimal(nanos, NS_PER_MS));
    }

    let secs = nanos / NS_PER_S;
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let rest = (secs % 60) * NS_PER_S + nanos % NS_PER_S;
    let _ = write!(out, "{}s", decimal(rest, NS_PER_S));
    out
}

fn decimal(value: u128, unit: u128) -> String {
    let (whole, frac) = (value / unit, value % unit);
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// RFC 3339 timestamp with exactly three fractional digits, truncated.
pub fn format_rfc3339_millis(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fills `{}` placeholders in `format` with `args` in order.
///
/// `{{` and `}}` produce literal braces. A placeholder with no argument left
/// renders as `{!MISSING}`; leftover arguments are appended as
/// `{!EXTRA a, b}`.
pub fn format_message(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len() + args.len() * 8);
    let mut args = args.iter();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(v) => {
                        let _ = write!(out, "{v}");
                    }
                    None => out.push_str("{!MISSING}"),
                }
            }
            _ => out.push(c),
        }
    }
    let extra: Vec<String> = args.map(ToString::to_string).collect();
    if !extra.is_empty() {
        let _ = write!(out, "{{!EXTRA {}}}", extra.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quoting_rules() {
        let cases = [
            ("", true),
            ("abc", false),
            ("a b", true),
            ("a=b", true),
            ("a\"b", true),
            ("a\\b", false),
            ("line\nbreak", true),
            ("你好", false),
            ("abc123", false),
            ("\u{1b}[31mred\u{1b}[0m", false),
            ("non\u{a0}breaking", true),
            ("a\u{200b}b", true),
            ("x\u{feff}y", true),
            ("\u{e000}", true),
            ("a\u{2028}b", true),
            ("\u{10ffff}", true),
            ("é\u{301}", false),
        ];
        for (s, want) in cases {
            assert_eq!(needs_quoting(s), want, "needs_quoting({s:?})");
        }
    }

    #[test]
    fn strip_ansi_removes_sequences() {
        assert_eq!(strip_ansi("\u{1b}[31mred\u{1b}[0m text"), "red text");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn append_string_quotes_only_when_needed() {
        let mut buf = Vec::new();
        append_string(&mut buf, "value", true, false);
        assert_eq!(buf, b"value");

        buf.clear();
        append_string(&mut buf, "two words", true, false);
        assert_eq!(buf, b"\"two words\"");

        buf.clear();
        append_string(&mut buf, "", true, false);
        assert_eq!(buf, b"\"\"");

        buf.clear();
        append_string(&mut buf, "tab\there", true, false);
        assert_eq!(buf, b"\"tab\\there\"");

        buf.clear();
        append_string(&mut buf, "two words", false, false);
        assert_eq!(buf, b"two words");
    }

    #[test]
    fn append_string_escapes_invisible_characters() {
        let cases = [
            ("a\u{200b}b", "\"a\\u200bb\""),
            ("x\u{feff}y", "\"x\\ufeffy\""),
            ("\u{e000}", "\"\\ue000\""),
            ("a\u{2028}b", "\"a\\u2028b\""),
            ("non\u{a0}breaking", "\"non\\u00a0breaking\""),
            ("\u{f0000}", "\"\\U000f0000\""),
            ("a b\u{7f}", "\"a b\\x7f\""),
            ("你好 世界", "\"你好 世界\""),
        ];
        for (s, want) in cases {
            let mut buf = Vec::new();
            append_string(&mut buf, s, true, false);
            assert_eq!(String::from_utf8(buf).unwrap(), want, "append_string({s:?})");
        }
    }

    #[test]
    fn append_string_strips_ansi_without_color() {
        let mut buf = Vec::new();
        append_string(&mut buf, "\u{1b}[31mred\u{1b}[0m", true, false);
        assert_eq!(buf, b"red");

        buf.clear();
        append_string(&mut buf, "\u{1b}[31mred alert\u{1b}[0m", true, true);
        assert_eq!(buf, "\"\u{1b}[31mred alert\u{1b}[0m\"".as_bytes());
    }

    #[test]
    fn ansi_palette_codes() {
        let mut buf = Vec::new();
        append_ansi(&mut buf, 1, false);
        assert_eq!(buf, b"\x1b[31m");
        buf.clear();
        append_ansi(&mut buf, 9, false);
        assert_eq!(buf, b"\x1b[91m");
        buf.clear();
        append_ansi(&mut buf, 42, true);
        assert_eq!(buf, b"\x1b[2;38;5;42m");
    }

    #[test]
    fn durations_use_human_units() {
        let cases = [
            (Duration::ZERO, "0s"),
            (Duration::from_nanos(250), "250ns"),
            (Duration::from_nanos(1_500), "1.5µs"),
            (Duration::from_millis(20), "20ms"),
            (Duration::from_micros(1_250), "1.25ms"),
            (Duration::from_millis(1_500), "1.5s"),
            (Duration::from_secs(90), "1m30s"),
            (Duration::from_secs(7_205), "2h0m5s"),
        ];
        for (d, want) in cases {
            assert_eq!(format_duration(d), want);
        }
    }

    #[test]
    fn rfc3339_millis_has_three_digits() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let t = utc.with_ymd_and_hms(2024, 3, 9, 10, 20, 30).unwrap();
        assert_eq!(format_rfc3339_millis(&t), "2024-03-09T10:20:30.000Z");

        let t = t + chrono::Duration::nanoseconds(123_987_654);
        assert_eq!(format_rfc3339_millis(&t), "2024-03-09T10:20:30.123Z");

        let plus2 = FixedOffset::east_opt(2 * 3600).unwrap();
        let t = plus2.with_ymd_and_hms(2024, 3, 9, 10, 20, 30).unwrap();
        assert_eq!(format_rfc3339_millis(&t), "2024-03-09T10:20:30.000+02:00");
    }

    #[test]
    fn format_message_placeholders() {
        let args: Vec<Value> = vec![42.into(), "x".into()];
        assert_eq!(format_message("got {} and {}", &args), "got 42 and x");
        assert_eq!(format_message("{{literal}} {}", &args[..1]), "{literal} 42");
        assert_eq!(format_message("{} {}", &args[..1]), "42 {!MISSING}");
        assert_eq!(format_message("only", &args), "only{!EXTRA 42, x}");
    }
}
