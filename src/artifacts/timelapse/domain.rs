use crate::errors::{ChiselError, Result};
use bitflags::bitflags;
use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};

bitflags! {
    /// Set of weekdays, bit 0 = Monday .. bit 6 = Sunday
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Weekdays: u8 {
        const MONDAY = 1 << 0;
        const TUESDAY = 1 << 1;
        const WEDNESDAY = 1 << 2;
        const THURSDAY = 1 << 3;
        const FRIDAY = 1 << 4;
        const SATURDAY = 1 << 5;
        const SUNDAY = 1 << 6;

        const WORKDAYS = Self::MONDAY.bits()
            | Self::TUESDAY.bits()
            | Self::WEDNESDAY.bits()
            | Self::THURSDAY.bits()
            | Self::FRIDAY.bits();
        const WEEKEND = Self::SATURDAY.bits() | Self::SUNDAY.bits();
    }
}

impl Weekdays {
    /// Weekday by number, 0 = Monday .. 6 = Sunday
    pub fn from_index(index: u8) -> Option<Self> {
        (index < 7).then(|| Self::from_bits_truncate(1 << index))
    }

    pub fn contains_weekday(&self, weekday: Weekday) -> bool {
        self.contains(Self::from_bits_truncate(
            1 << weekday.num_days_from_monday(),
        ))
    }

    /// Parse `mon,tue,...`, `workdays`, `weekend`, `all` or numbers `0..=6`
    pub fn try_parse(value: &str) -> anyhow::Result<Self> {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .try_fold(Weekdays::empty(), |acc, part| {
                let day = match part.to_ascii_lowercase().as_str() {
                    "all" => Weekdays::all(),
                    "workdays" => Weekdays::WORKDAYS,
                    "weekend" => Weekdays::WEEKEND,
                    other => match other.parse::<u8>() {
                        Ok(index) => Self::from_index(index)
                            .ok_or_else(|| anyhow::anyhow!("weekday out of range: {index}"))?,
                        Err(_) => {
                            let weekday = other
                                .parse::<Weekday>()
                                .map_err(|_| anyhow::anyhow!("unknown weekday: {other}"))?;
                            Self::from_bits_truncate(1 << weekday.num_days_from_monday())
                        }
                    },
                };
                Ok(acc | day)
            })
    }
}

/// Allowed span of a day, `[start, end)` in local wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl HourWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if end < start {
            return Err(ChiselError::InvalidWindow { start, end });
        }
        Ok(HourWindow { start, end })
    }

    /// From midnight to the last second of the day
    pub fn full_day() -> Self {
        HourWindow {
            start: NaiveTime::MIN,
            end: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Parse `HH:MM-HH:MM` (seconds optional)
    pub fn try_parse(value: &str) -> anyhow::Result<Self> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("expected HH:MM-HH:MM, got {value:?}"))?;

        let parse = |time: &str| {
            NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M"))
                .map_err(|_| anyhow::anyhow!("invalid time {time:?}"))
        };

        Ok(Self::new(parse(start)?, parse(end)?)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Calendar constraints for redistributing commit dates
///
/// Days are taken from `[start, end)`. Hour windows are interpreted in `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDomain {
    start: NaiveDate,
    end: NaiveDate,
    hours: Vec<HourWindow>,
    weekdays: Weekdays,
    offset: FixedOffset,
}

impl TimeDomain {
    /// Every day of the range, all day long, in UTC
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        TimeDomain {
            start,
            end,
            hours: vec![HourWindow::full_day()],
            weekdays: Weekdays::all(),
            offset: FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!()),
        }
    }

    pub fn with_hours(mut self, hours: Vec<HourWindow>) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_weekdays(mut self, weekdays: Weekdays) -> Self {
        self.weekdays = weekdays;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn hours(&self) -> &[HourWindow] {
        &self.hours
    }

    pub fn weekdays(&self) -> Weekdays {
        self.weekdays
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}
