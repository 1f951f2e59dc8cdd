//! Resolving the date expressions accepted on the command line.

use crate::error::{Error, Result};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

const ABSOLUTE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// Resolve a date expression relative to `today`.
///
/// Understands `today`, `yesterday`, `tomorrow`, absolute dates such as
/// `2021-05-01` or `1 May 2021`, offsets like `in 3 days` and `2 weeks ago`,
/// and weekdays (`friday`, `last friday`, `next friday`). Matching ignores
/// case and surrounding whitespace.
///
/// # Errors
///
/// [`Error::DateParse`] if the expression isn't recognised or lands outside
/// the representable range.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use friendtracker::parse_natural_date;
///
/// let today = NaiveDate::from_ymd_opt(2021, 5, 10).unwrap();
/// assert_eq!(
///     parse_natural_date("in 3 days", today).unwrap(),
///     NaiveDate::from_ymd_opt(2021, 5, 13).unwrap()
/// );
/// assert!(parse_natural_date("whenever", today).is_err());
/// ```
pub fn parse_natural_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let text = input.trim().to_lowercase();
    resolve(&text, today).ok_or_else(|| Error::DateParse {
        input: input.to_string(),
    })
}

fn resolve(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        ["today"] | ["now"] => Some(today),
        ["yesterday"] => today.pred_opt(),
        ["tomorrow"] => today.succ_opt(),
        ["in", n, unit] => shift(today, amount(n)?, unit, Direction::Forward),
        [n, unit, "ago"] => shift(today, amount(n)?, unit, Direction::Back),
        ["last", day] => previous_weekday(today, day.parse().ok()?),
        ["next", day] => next_weekday(today, day.parse().ok()?),
        [day] if day.parse::<Weekday>().is_ok() => previous_weekday(today, day.parse().ok()?),
        _ => ABSOLUTE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok()),
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Back,
}

fn amount(word: &str) -> Option<u32> {
    match word {
        "a" | "an" | "one" => Some(1),
        _ => word.parse().ok(),
    }
}

fn shift(today: NaiveDate, n: u32, unit: &str, direction: Direction) -> Option<NaiveDate> {
    let unit = unit.strip_suffix('s').unwrap_or(unit);
    let (days, months) = match unit {
        "day" => (u64::from(n), 0),
        "week" => (u64::from(n) * 7, 0),
        "month" => (0, n),
        "year" => (0, n.checked_mul(12)?),
        _ => return None,
    };
    match direction {
        Direction::Forward => today
            .checked_add_days(Days::new(days))?
            .checked_add_months(Months::new(months)),
        Direction::Back => today
            .checked_sub_days(Days::new(days))?
            .checked_sub_months(Months::new(months)),
    }
}

/// The closest `day` strictly before `today`.
fn previous_weekday(today: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let back = (7 + today.weekday().num_days_from_monday() - day.num_days_from_monday()) % 7;
    let back = if back == 0 { 7 } else { back };
    today.checked_sub_days(Days::new(u64::from(back)))
}

/// The closest `day` strictly after `today`.
fn next_weekday(today: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + day.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // A Monday.
    fn today() -> NaiveDate {
        date(2021, 5, 10)
    }

    fn parse(input: &str) -> NaiveDate {
        parse_natural_date(input, today()).unwrap()
    }

    #[test]
    fn keywords() {
        assert_eq!(parse("today"), today());
        assert_eq!(parse("  Yesterday "), date(2021, 5, 9));
        assert_eq!(parse("TOMORROW"), date(2021, 5, 11));
    }

    #[test]
    fn absolute_dates() {
        assert_eq!(parse("2021-05-01"), date(2021, 5, 1));
        assert_eq!(parse("2021/05/01"), date(2021, 5, 1));
        assert_eq!(parse("01.05.2021"), date(2021, 5, 1));
        assert_eq!(parse("May 1 2021"), date(2021, 5, 1));
        assert_eq!(parse("may 1, 2021"), date(2021, 5, 1));
        assert_eq!(parse("1 May 2021"), date(2021, 5, 1));
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(parse("in 3 days"), date(2021, 5, 13));
        assert_eq!(parse("in a week"), date(2021, 5, 17));
        assert_eq!(parse("7 days ago"), date(2021, 5, 3));
        assert_eq!(parse("2 weeks ago"), date(2021, 4, 26));
        assert_eq!(parse("in 1 month"), date(2021, 6, 10));
        assert_eq!(parse("a year ago"), date(2020, 5, 10));
    }

    #[test]
    fn weekdays() {
        assert_eq!(parse("friday"), date(2021, 5, 7));
        assert_eq!(parse("last monday"), date(2021, 5, 3));
        assert_eq!(parse("next monday"), date(2021, 5, 17));
        assert_eq!(parse("next wed"), date(2021, 5, 12));
    }

    #[test]
    fn rejects_nonsense() {
        for input in ["", "someday", "in three fortnights", "2021-13-01", "in -2 days"] {
            let err = parse_natural_date(input, today()).unwrap_err();
            assert!(matches!(err, Error::DateParse { .. }), "{input}");
        }
    }
}
