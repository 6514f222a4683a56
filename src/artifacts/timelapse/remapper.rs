use crate::artifacts::timelapse::domain::TimeDomain;
use crate::errors::{ChiselError, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use tracing::debug;

/// Admitted window, placed at `offset` virtual seconds from the start of the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub offset: i64,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Contiguous "virtual seconds" coordinate over a non-contiguous calendar
///
/// Admitted windows are laid end to end; a virtual second maps back to the instant
/// at the same distance into the window that covers it.
#[derive(Debug, Clone)]
pub struct Timelapse {
    breakpoints: Vec<Breakpoint>,
    total_seconds: i64,
}

impl Timelapse {
    pub fn build(domain: &TimeDomain) -> Result<Self> {
        let mut breakpoints = Vec::new();
        let mut total_seconds = 0;

        for day in days(domain.start(), domain.end()) {
            if !domain.weekdays().contains_weekday(day.weekday()) {
                continue;
            }

            for window in domain.hours() {
                let seconds = window.seconds();
                if seconds == 0 {
                    continue;
                }

                breakpoints.push(Breakpoint {
                    offset: total_seconds,
                    start: local_instant(day, window.start(), domain.offset()),
                    end: local_instant(day, window.end(), domain.offset()),
                });
                total_seconds += seconds;
            }
        }

        if total_seconds == 0 {
            return Err(ChiselError::EmptyDomain);
        }

        debug!(
            windows = breakpoints.len(),
            total_seconds, "built timelapse"
        );

        Ok(Timelapse {
            breakpoints,
            total_seconds,
        })
    }

    pub fn total_seconds(&self) -> i64 {
        self.total_seconds
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Instant at virtual second `value`, which must lie in `[0, total_seconds)`
    pub fn instant_from_virtual_seconds(&self, value: i64) -> Result<DateTime<FixedOffset>> {
        if !(0..self.total_seconds).contains(&value) {
            return Err(ChiselError::OutOfRange {
                value,
                total: self.total_seconds,
            });
        }

        // offsets are strictly increasing and the first one is 0
        let index = self.breakpoints.partition_point(|b| b.offset <= value) - 1;
        let breakpoint = &self.breakpoints[index];

        Ok(breakpoint.start + TimeDelta::seconds(value - breakpoint.offset))
    }
}

fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day < end)
}

fn local_instant(day: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = day.and_time(time) - TimeDelta::seconds(offset.local_minus_utc() as i64);
    DateTime::from_naive_utc_and_offset(utc, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::timelapse::domain::{HourWindow, Weekdays};
    use chrono::Timelike;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 5, day).unwrap()
    }

    fn window(start: u32, end: u32) -> HourWindow {
        HourWindow::new(
            NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn two_days() -> TimeDomain {
        TimeDomain::new(date(16), date(18)).with_hours(vec![window(8, 10), window(12, 13)])
    }

    #[fixture]
    fn domain() -> TimeDomain {
        two_days()
    }

    #[rstest]
    fn test_total_seconds_cover_admitted_windows(domain: TimeDomain) {
        let timelapse = Timelapse::build(&domain).unwrap();

        assert_eq!(timelapse.total_seconds(), 21600);
        assert_eq!(timelapse.breakpoints().len(), 4);
    }

    #[rstest]
    #[case(0, 16, 8, 0)]
    #[case(7199, 16, 9, 59)]
    #[case(7200, 16, 12, 0)]
    #[case(10800, 17, 8, 0)]
    #[case(21599, 17, 12, 59)]
    fn test_virtual_seconds_map_into_windows(
        domain: TimeDomain,
        #[case] value: i64,
        #[case] day: u32,
        #[case] hour: u32,
        #[case] minute: u32,
    ) {
        let timelapse = Timelapse::build(&domain).unwrap();
        let instant = timelapse.instant_from_virtual_seconds(value).unwrap();

        assert_eq!(instant.date_naive(), date(day));
        assert_eq!((instant.hour(), instant.minute()), (hour, minute));
    }

    #[rstest]
    #[case(-1)]
    #[case(21600)]
    fn test_out_of_range(domain: TimeDomain, #[case] value: i64) {
        let timelapse = Timelapse::build(&domain).unwrap();

        assert!(matches!(
            timelapse.instant_from_virtual_seconds(value),
            Err(ChiselError::OutOfRange { total: 21600, .. })
        ));
    }

    #[rstest]
    fn test_disallowed_weekdays_are_skipped(domain: TimeDomain) {
        // 2010-05-16 is a Sunday
        let timelapse = Timelapse::build(&domain.with_weekdays(Weekdays::WORKDAYS)).unwrap();

        assert_eq!(timelapse.total_seconds(), 10800);
        assert_eq!(
            timelapse.instant_from_virtual_seconds(0).unwrap().date_naive(),
            date(17)
        );
    }

    #[rstest]
    fn test_windows_are_interpreted_in_domain_offset(domain: TimeDomain) {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let timelapse = Timelapse::build(&domain.with_offset(offset)).unwrap();
        let instant = timelapse.instant_from_virtual_seconds(0).unwrap();

        assert_eq!(instant.hour(), 8);
        assert_eq!(instant.naive_utc().hour(), 6);
    }

    #[rstest]
    #[case(TimeDomain::new(date(16), date(16)))]
    #[case(TimeDomain::new(date(16), date(18)).with_weekdays(Weekdays::WORKDAYS - Weekdays::MONDAY))]
    #[case(TimeDomain::new(date(16), date(18)).with_hours(vec![window(9, 9)]))]
    #[case(TimeDomain::new(date(16), date(18)).with_hours(Vec::new()))]
    fn test_empty_domain(#[case] domain: TimeDomain) {
        assert!(matches!(Timelapse::build(&domain), Err(ChiselError::EmptyDomain)));
    }

    proptest! {
        #[test]
        fn test_mapping_is_monotonic_and_stays_in_windows(a in 0i64..21600, b in 0i64..21600) {
            let timelapse = Timelapse::build(&two_days()).unwrap();
            let (low, high) = (a.min(b), a.max(b));
            let low_instant = timelapse.instant_from_virtual_seconds(low).unwrap();
            let high_instant = timelapse.instant_from_virtual_seconds(high).unwrap();

            prop_assert!(low_instant <= high_instant);
            for instant in [low_instant, high_instant] {
                let hour = instant.hour();
                prop_assert!((8..10).contains(&hour) || hour == 12);
            }
        }
    }
}
