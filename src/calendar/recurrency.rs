use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Unit in which a recurrence rule repeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Recurrency {
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Every allowed weekday. Normalized to [`Recurrency::Weekly`] on validation.
    PerWeekday,
    /// Same offset from Easter Sunday, every `n` years.
    Easter,
}

impl Recurrency {
    /// Adds `every` units to `from`. Month and year arithmetic clamps to the last
    /// day of the target month. Returns `None` for [`Recurrency::Once`] and when the
    /// result leaves chrono's supported range.
    pub fn add_duration(&self, from: NaiveDate, every: u32) -> Option<NaiveDate> {
        match self {
            Recurrency::Once => None,
            Recurrency::Daily => from.checked_add_signed(Duration::days(every as i64)),
            Recurrency::PerWeekday => from.checked_add_signed(Duration::days(1)),
            Recurrency::Weekly => from.checked_add_signed(Duration::weeks(every as i64)),
            Recurrency::Monthly => from.checked_add_months(Months::new(every)),
            Recurrency::Yearly => from.checked_add_months(Months::new(every.checked_mul(12)?)),
            Recurrency::Easter => shift_easter(from, every as i32),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recurrency::Once => "once",
            Recurrency::Daily => "daily",
            Recurrency::Weekly => "weekly",
            Recurrency::Monthly => "monthly",
            Recurrency::Yearly => "yearly",
            Recurrency::PerWeekday => "per weekday",
            Recurrency::Easter => "Easter-relative",
        }
    }

    /// Noun used in "Every ..." descriptions.
    pub(crate) fn unit_text(&self) -> Option<&'static str> {
        match self {
            Recurrency::Daily => Some("day"),
            Recurrency::Monthly => Some("month"),
            Recurrency::Yearly | Recurrency::Easter => Some("year"),
            Recurrency::Once | Recurrency::Weekly | Recurrency::PerWeekday => None,
        }
    }
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn shift_easter(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let offset = date - easter_sunday(date.year())?;
    let target = easter_sunday(date.year().checked_add(years)?)?;
    target.checked_add_signed(offset)
}
