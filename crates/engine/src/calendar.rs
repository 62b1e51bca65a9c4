//! Business-day calendar anchored to the warehouse time zone.
//!
//! All wall-clock questions ("is it past 2 PM?", "what day is it?") are
//! answered in the configured IANA zone through `chrono-tz`, never with a fixed
//! UTC offset, so the cutoff moves correctly across daylight-saving changes.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

/// Minutes left before the cutoff at which the countdown turns critical.
const CRITICAL_MINUTES: u32 = 60;
/// Minutes left before the cutoff at which the countdown turns urgent.
const HIGH_MINUTES: u32 = 120;

/// Cutoff hour and time zone for same-day dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    timezone: Tz,
    cutoff_hour: u32,
}

/// How pressing the same-day countdown is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    High,
    Critical,
}

/// Why an order placed now will not ship today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedReason {
    Weekend,
    AfterCutoff,
}

/// Same-day dispatch status at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CutoffStatus {
    /// Orders placed now still ship today.
    Open {
        minutes_remaining: u32,
        urgency: Urgency,
    },
    /// Orders placed now ship on `next_business_day`.
    Closed {
        reason: ClosedReason,
        next_business_day: NaiveDate,
    },
}

impl CutoffStatus {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

impl BusinessCalendar {
    /// Create a calendar. Cutoff hours past 23 are clamped to 23.
    #[must_use]
    pub fn new(timezone: Tz, cutoff_hour: u32) -> Self {
        Self {
            timezone,
            cutoff_hour: cutoff_hour.min(23),
        }
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub const fn cutoff_hour(&self) -> u32 {
        self.cutoff_hour
    }

    /// `now` as wall-clock time in the calendar's zone.
    #[must_use]
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.timezone)
    }

    /// Today's date in the calendar's zone.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_time(now).date_naive()
    }

    /// True once the local hour has reached the cutoff hour.
    #[must_use]
    pub fn is_past_cutoff(&self, now: DateTime<Utc>) -> bool {
        self.local_time(now).hour() >= self.cutoff_hour
    }

    /// Saturday or Sunday.
    #[must_use]
    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Walk forward `days` business days from `start`.
    ///
    /// With `past_cutoff_adjust` the walk begins one calendar day later; the
    /// adjustment is applied once, not per counted day. Weekend days are never
    /// counted and never returned: a zero-day walk that would land on a
    /// weekend rolls forward to Monday.
    #[must_use]
    pub fn add_business_days(start: NaiveDate, days: u32, past_cutoff_adjust: bool) -> NaiveDate {
        let mut date = start;
        if past_cutoff_adjust {
            let Some(next) = date.succ_opt() else {
                return date;
            };
            date = next;
        }

        let mut counted = 0;
        while counted < days {
            let Some(next) = date.succ_opt() else {
                return date;
            };
            date = next;
            if !Self::is_weekend(date) {
                counted += 1;
            }
        }

        if days == 0 {
            return roll_to_weekday(date);
        }
        date
    }

    /// First business day strictly after `date`.
    #[must_use]
    pub fn next_business_day(date: NaiveDate) -> NaiveDate {
        Self::add_business_days(date, 1, false)
    }

    /// Same-day dispatch countdown for the storefront banner.
    #[must_use]
    pub fn cutoff_status(&self, now: DateTime<Utc>) -> CutoffStatus {
        let local = self.local_time(now);
        let today = local.date_naive();

        if Self::is_weekend(today) {
            return CutoffStatus::Closed {
                reason: ClosedReason::Weekend,
                next_business_day: Self::next_business_day(today),
            };
        }

        let minutes_now = local.hour() * 60 + local.minute();
        let cutoff_minutes = self.cutoff_hour * 60;

        if minutes_now < cutoff_minutes {
            let minutes_remaining = cutoff_minutes - minutes_now;
            let urgency = if minutes_remaining < CRITICAL_MINUTES {
                Urgency::Critical
            } else if minutes_remaining < HIGH_MINUTES {
                Urgency::High
            } else {
                Urgency::Normal
            };
            return CutoffStatus::Open {
                minutes_remaining,
                urgency,
            };
        }

        CutoffStatus::Closed {
            reason: ClosedReason::AfterCutoff,
            next_business_day: Self::next_business_day(today),
        }
    }
}

impl Default for BusinessCalendar {
    /// 2 PM cutoff, US Eastern time.
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York, 14)
    }
}

fn roll_to_weekday(mut date: NaiveDate) -> NaiveDate {
    while BusinessCalendar::is_weekend(date) {
        let Some(next) = date.succ_opt() else {
            break;
        };
        date = next;
    }
    date
}
