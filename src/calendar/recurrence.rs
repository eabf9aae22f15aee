use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    event::EventCandidate,
    recurrency::Recurrency,
    weekday::{weekday_name, WeekdayMask},
};
use crate::errors::{CalendarError, CalendarResult};

/// Number of consecutive days [`RecurrenceRule::first_available_date`] inspects.
const WEEK_SCAN_DAYS: i64 = 7;

/// "Every N units, on these weekdays, at most M times": the rule a generator expands
/// into occurrences.
///
/// `start_date`/`end_date` describe the span of a single occurrence. A rule spanning
/// several days (e.g. a holiday from Dec 24 to Jan 6) produces occurrences with the
/// same length; the generation horizon is owned by the generator, not the rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Recurrency>,
    #[serde(default = "RecurrenceRule::default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub weekdays: WeekdayMask,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            frequency: Some(Recurrency::Monthly),
            interval: Self::default_interval(),
            weekdays: WeekdayMask::EMPTY,
            start_date: None,
            end_date: None,
            max_occurrences: None,
            start_time: None,
            end_time: None,
        }
    }
}

impl RecurrenceRule {
    pub fn new(frequency: Recurrency) -> Self {
        Self {
            frequency: Some(frequency),
            ..Self::default()
        }
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn on(mut self, weekdays: WeekdayMask) -> Self {
        self.weekdays = weekdays;
        self
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn ending(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn limited_to(mut self, occurrences: u32) -> Self {
        self.max_occurrences = Some(occurrences);
        self
    }

    pub fn at(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    fn default_interval() -> u32 {
        1
    }

    /// Normalizes and checks the rule. `per_weekday` becomes `weekly`; `once` is forced
    /// to a single occurrence with interval 0.
    pub fn validate(&mut self) -> CalendarResult<()> {
        match self.frequency {
            Some(Recurrency::PerWeekday) => self.frequency = Some(Recurrency::Weekly),
            Some(Recurrency::Once) => {
                self.max_occurrences = Some(1);
                self.interval = 0;
            }
            _ => {}
        }
        if let Some(frequency) = self.frequency {
            if frequency != Recurrency::Once && self.interval == 0 {
                return Err(CalendarError::Validation(format!(
                    "a {} rule must repeat at least every 1 unit",
                    frequency.label()
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CalendarError::Validation(format!(
                    "end date {} precedes start date {}",
                    end, start
                )));
            }
        }
        Ok(())
    }

    pub fn is_once(&self) -> bool {
        self.frequency == Some(Recurrency::Once)
    }

    /// Whether `date` falls on one of the rule's weekdays (always true without a mask).
    pub fn is_date_allowed(&self, date: NaiveDate) -> bool {
        self.weekdays.allows(date)
    }

    /// First allowed date among `from` and the six days after it.
    pub fn first_available_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        (0..WEEK_SCAN_DAYS)
            .filter_map(|offset| from.checked_add_signed(Duration::days(offset)))
            .find(|date| self.is_date_allowed(*date))
    }

    /// Next date after `after` according to the rule, ignoring conflicts.
    pub fn next_suggested_date(&self, after: NaiveDate) -> Option<NaiveDate> {
        let frequency = self.frequency?;
        let every = self.interval.max(1);
        let next = match frequency {
            Recurrency::Once => {
                debug!("once rule has no successor for {}", after);
                return None;
            }
            Recurrency::Weekly if !self.weekdays.is_empty() => {
                self.next_masked_weekday(after, every)?
            }
            unit => unit.add_duration(after, every)?,
        };
        self.first_available_date(next)
    }

    /// Next date to try when `after` is taken: tomorrow, respecting the weekday mask.
    pub fn next_alternate_date(&self, after: NaiveDate) -> Option<NaiveDate> {
        self.first_available_date(after.checked_add_signed(Duration::days(1))?)
    }

    /// Moves `candidate` to `new_date`, keeping the occurrence span of the rule.
    pub fn relocate(&self, candidate: &mut EventCandidate, new_date: NaiveDate) {
        candidate.start_date = new_date;
        candidate.end_date = self
            .occurrence_span()
            .and_then(|span| new_date.checked_add_signed(span));
    }

    fn occurrence_span(&self) -> Option<Duration> {
        let end = self.end_date?;
        let span = end - self.start_date.unwrap_or(end);
        (span > Duration::zero()).then_some(span)
    }

    /// Remaining masked weekday in the week of `after`, else the Monday `every` weeks on.
    fn next_masked_weekday(&self, after: NaiveDate, every: u32) -> Option<NaiveDate> {
        let offset = after.weekday().num_days_from_monday() as i64;
        let same_week = (1..WEEK_SCAN_DAYS - offset)
            .filter_map(|delta| after.checked_add_signed(Duration::days(delta)))
            .find(|date| self.is_date_allowed(*date));
        if same_week.is_some() {
            return same_week;
        }
        let week_start = after.checked_sub_signed(Duration::days(offset))?;
        week_start.checked_add_signed(Duration::weeks(every as i64))
    }

    /// Human readable summary such as "Every Monday, Wednesday" or "Every 2nd month".
    pub fn describe(&self) -> String {
        let Some(frequency) = self.frequency else {
            return String::new();
        };
        let every_text = match frequency {
            Recurrency::Once => {
                return match (self.start_date, self.end_date) {
                    (Some(start), Some(end)) => format!("{}-{}", start, end),
                    (Some(start), None) => format!("On {}", start),
                    _ => String::new(),
                };
            }
            Recurrency::Weekly | Recurrency::PerWeekday => {
                if self.weekdays.is_empty() {
                    "week".to_string()
                } else {
                    self.weekdays
                        .days()
                        .map(weekday_name)
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            }
            unit => unit.unit_text().unwrap_or_default().to_string(),
        };
        if self.interval <= 1 {
            format!("Every {}", every_text)
        } else {
            format!("Every {}{} {}", self.interval, ordinal_suffix(self.interval), every_text)
        }
    }
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
