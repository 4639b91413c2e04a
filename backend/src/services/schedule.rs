use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use shared::{FrequencyType, Recurrence, TimeOfDay};

/// Time of day used when a recurring task has no scheduled time.
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Due time of tasks that are "due today" without a scheduled time.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

pub fn weekday_to_u8(weekday: Weekday) -> u8 {
    match weekday {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Calendar addition that stops at the last representable date.
fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn sorted_days(scheduled_days: &[u8]) -> Vec<u8> {
    let mut days: Vec<u8> = scheduled_days.iter().copied().filter(|d| *d <= 6).collect();
    days.sort_unstable();
    days.dedup();
    days
}

/// Compute the next due date/time of a recurring task from an anchor.
///
/// The anchor is a household-local wall-clock value. The result carries
/// `scheduled_time` when given, 09:00 otherwise.
///
/// * daily: anchor + N days
/// * weekly with days: the next scheduled weekday strictly after the anchor's
///   weekday, or the first scheduled weekday after wrapping plus N - 1 weeks
/// * weekly without days: anchor + N weeks
/// * monthly: anchor + N calendar months (clamped to the month's last day),
///   then shifted 0..6 days forward onto the first scheduled weekday
pub fn next_due_date(
    frequency_type: FrequencyType,
    frequency_value: u32,
    from: NaiveDateTime,
    scheduled_days: &[u8],
    scheduled_time: Option<TimeOfDay>,
) -> NaiveDateTime {
    let time = scheduled_time
        .map(|t| t.as_naive_time())
        .unwrap_or_else(default_due_time);
    let date = from.date();
    let days = sorted_days(scheduled_days);
    let current = weekday_to_u8(date.weekday());

    let next_date = match frequency_type {
        FrequencyType::Daily => add_days(date, u64::from(frequency_value)),
        FrequencyType::Weekly => match days.first() {
            None => add_days(date, 7 * u64::from(frequency_value)),
            Some(first) => {
                let offset = match days.iter().find(|d| **d > current) {
                    Some(next) => u64::from(next - current),
                    None => {
                        u64::from(7 - current)
                            + u64::from(*first)
                            + u64::from(frequency_value.saturating_sub(1)) * 7
                    }
                };
                add_days(date, offset)
            }
        },
        FrequencyType::Monthly => {
            let shifted = date
                .checked_add_months(Months::new(frequency_value))
                .unwrap_or(NaiveDate::MAX);
            match days.first() {
                Some(target) => {
                    let weekday = weekday_to_u8(shifted.weekday());
                    add_days(shifted, u64::from((target + 7 - weekday) % 7))
                }
                None => shifted,
            }
        }
    };

    next_date.and_time(time)
}

/// Due date/time of the first assignment of a task created (or reseeded) at
/// `now`, in household-local wall-clock time.
///
/// Today at the scheduled time, 23:59:59 without one. Weekly tasks with
/// scheduled days move to the first scheduled weekday on or after today.
/// One-off tasks are due at the end of today.
pub fn initial_due(recurrence: Option<&Recurrence>, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();

    let Some(recurrence) = recurrence else {
        return today.and_time(end_of_day());
    };

    let time = recurrence
        .scheduled_time
        .map(|t| t.as_naive_time())
        .unwrap_or_else(end_of_day);

    let days = sorted_days(&recurrence.scheduled_days);
    let date = match (recurrence.frequency_type, days.first()) {
        (FrequencyType::Weekly, Some(first)) => {
            let current = weekday_to_u8(today.weekday());
            let offset = match days.iter().find(|d| **d >= current) {
                Some(day) => day - current,
                None => 7 - current + first,
            };
            add_days(today, u64::from(offset))
        }
        _ => today,
    };

    date.and_time(time)
}

/// Parse a household timezone, falling back when the name is unknown
pub fn parse_timezone(tz_str: &str, fallback: Tz) -> Tz {
    tz_str.parse().unwrap_or(fallback)
}

/// Convert a household-local wall-clock value into a UTC instant.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
/// Local times inside a DST gap are shifted forward by the gap.
pub fn to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local)),
    }
}

/// UTC bounds `[start, end)` of a household-local calendar day.
pub fn local_day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = to_utc(tz, date.and_time(NaiveTime::MIN));
    let end = to_utc(tz, add_days(date, 1).and_time(NaiveTime::MIN));
    (start, end)
}

/// Local wall-clock anchor of an assignment: its precise due instant when
/// stored, otherwise the start of its due date.
pub fn assignment_anchor(due_date: NaiveDate, due_datetime: Option<DateTime<Utc>>, tz: Tz) -> NaiveDateTime {
    due_datetime
        .map(|dt| dt.with_timezone(&tz).naive_local())
        .unwrap_or_else(|| due_date.and_time(NaiveTime::MIN))
}

/// "Now" as seen by one household.
#[derive(Debug, Clone, Copy)]
pub struct HouseholdClock {
    pub now: DateTime<Utc>,
    pub tz: Tz,
}

impl HouseholdClock {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }

    pub fn local_now(&self) -> NaiveDateTime {
        self.now.with_timezone(&self.tz).naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    pub fn local_date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        to_utc(self.tz, local)
    }
}
