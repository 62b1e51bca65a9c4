//! Display strings for delivery badges and panels (en-US).

use chrono::NaiveDate;

/// `"Fri, Oct 18"`
#[must_use]
pub fn short_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

/// `"Friday, October 18"`
#[must_use]
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

/// `"Wed, Oct 23 - Thu, Oct 24"`, collapsed to one date when both ends agree.
#[must_use]
pub fn range_text(min: NaiveDate, max: NaiveDate) -> String {
    if min == max {
        short_date(min)
    } else {
        format!("{} - {}", short_date(min), short_date(max))
    }
}

/// Relative arrival text used in compact badges.
#[must_use]
pub fn countdown_text(business_days: u32) -> String {
    match business_days {
        0 | 1 => "Tomorrow".to_owned(),
        2..=5 => format!("In {business_days} days"),
        _ => "In about a week".to_owned(),
    }
}

/// `"3-4 business days"`, or `"3 business days"` for a single value.
#[must_use]
pub fn business_days_text(min: u32, max: u32) -> String {
    if min == max {
        format!("{min} business days")
    } else {
        format!("{min}-{max} business days")
    }
}

/// `"2h 15m"` above an hour, `"45 min"` below.
#[must_use]
pub fn time_remaining_text(total_minutes: u32) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dates() {
        assert_eq!(short_date(date(2024, 10, 18)), "Fri, Oct 18");
        assert_eq!(short_date(date(2024, 11, 4)), "Mon, Nov 4");
        assert_eq!(long_date(date(2024, 10, 18)), "Friday, October 18");
    }

    #[test]
    fn test_range_text_collapses() {
        let d = date(2024, 10, 18);
        assert_eq!(range_text(d, d), "Fri, Oct 18");
        assert_eq!(range_text(d, date(2024, 10, 21)), "Fri, Oct 18 - Mon, Oct 21");
    }

    #[test]
    fn test_countdown_text() {
        assert_eq!(countdown_text(1), "Tomorrow");
        assert_eq!(countdown_text(2), "In 2 days");
        assert_eq!(countdown_text(5), "In 5 days");
        assert_eq!(countdown_text(6), "In about a week");
    }

    #[test]
    fn test_business_days_text() {
        assert_eq!(business_days_text(3, 4), "3-4 business days");
        assert_eq!(business_days_text(2, 2), "2 business days");
    }

    #[test]
    fn test_time_remaining_text() {
        assert_eq!(time_remaining_text(135), "2h 15m");
        assert_eq!(time_remaining_text(45), "45 min");
        assert_eq!(time_remaining_text(60), "1h 0m");
    }
}
