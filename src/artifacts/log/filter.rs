use crate::artifacts::log::snapshot::HistorySnapshot;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::timelapse::domain::Weekdays;
use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Timelike};
use regex::Regex;

/// Which recorded date the date, weekday and hour criteria look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateColumn {
    #[default]
    Authored,
    Committed,
    /// Either date may satisfy the criteria
    Any,
}

impl DateColumn {
    pub fn try_parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "authored" | "author" => Ok(DateColumn::Authored),
            "committed" | "committer" => Ok(DateColumn::Committed),
            "any" => Ok(DateColumn::Any),
            _ => anyhow::bail!("expected authored, committed or any, got {value:?}"),
        }
    }

    fn dates(self, commit: &Commit) -> Vec<DateTime<FixedOffset>> {
        match self {
            DateColumn::Authored => vec![commit.author().when()],
            DateColumn::Committed => vec![commit.committer().when()],
            DateColumn::Any => vec![commit.author().when(), commit.committer().when()],
        }
    }
}

/// Criteria narrowing a snapshot to the commits a bulk edit applies to
///
/// Date, weekday and hour criteria look at the date picked by `DateColumn`, the
/// authored one by default, in the offset it was recorded in. Bounds are exclusive.
/// A commit is kept when every configured criterion matches.
#[derive(Debug, Clone, Default)]
pub struct CommitFilter {
    column: DateColumn,
    after: Option<DateTime<FixedOffset>>,
    before: Option<DateTime<FixedOffset>>,
    weekdays: Option<Weekdays>,
    after_hour: Option<NaiveTime>,
    before_hour: Option<NaiveTime>,
    actor: Option<Regex>,
    message: Option<Regex>,
    local_only: bool,
}

impl CommitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_column(mut self, column: DateColumn) -> Self {
        self.column = column;
        self
    }

    pub fn after(mut self, date: DateTime<FixedOffset>) -> Self {
        self.after = Some(date);
        self
    }

    pub fn before(mut self, date: DateTime<FixedOffset>) -> Self {
        self.before = Some(date);
        self
    }

    pub fn on_weekdays(mut self, weekdays: Weekdays) -> Self {
        self.weekdays = Some(weekdays);
        self
    }

    pub fn after_hour(mut self, time: NaiveTime) -> Self {
        self.after_hour = Some(time);
        self
    }

    pub fn before_hour(mut self, time: NaiveTime) -> Self {
        self.before_hour = Some(time);
        self
    }

    /// Match `Name <email>` of the author or the committer
    pub fn actor_matching(mut self, pattern: Regex) -> Self {
        self.actor = Some(pattern);
        self
    }

    pub fn message_matching(mut self, pattern: Regex) -> Self {
        self.message = Some(pattern);
        self
    }

    /// Keep only commits not yet on the upstream
    pub fn local_only(mut self, local_only: bool) -> Self {
        self.local_only = local_only;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_none()
            && self.before.is_none()
            && self.weekdays.is_none()
            && self.after_hour.is_none()
            && self.before_hour.is_none()
            && self.actor.is_none()
            && self.message.is_none()
            && !self.local_only
    }

    fn date_matches(&self, date: DateTime<FixedOffset>) -> bool {
        let time = date.time().with_nanosecond(0).unwrap_or(date.time());

        self.after.is_none_or(|after| date > after)
            && self.before.is_none_or(|before| date < before)
            && self
                .weekdays
                .is_none_or(|weekdays| weekdays.contains_weekday(date.weekday()))
            && self.after_hour.is_none_or(|after| time > after)
            && self.before_hour.is_none_or(|before| time < before)
    }

    pub fn matches(&self, snapshot: &HistorySnapshot, commit: &Commit) -> bool {
        self.column
            .dates(commit)
            .into_iter()
            .any(|date| self.date_matches(date))
            && self.actor.as_ref().is_none_or(|pattern| {
                pattern.is_match(&commit.author().actor().display_name())
                    || pattern.is_match(&commit.committer().actor().display_name())
            })
            && self
                .message
                .as_ref()
                .is_none_or(|pattern| pattern.is_match(commit.message()))
            && (!self.local_only || !snapshot.is_pushed(commit.oid()))
    }

    /// Matching commits, head first
    pub fn apply<'s>(&self, snapshot: &'s HistorySnapshot) -> Vec<&'s Commit> {
        snapshot
            .commits()
            .iter()
            .filter(|commit| self.matches(snapshot, commit))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::log::snapshot::fixtures::{create_oid, linear_history, timestamp};
    use rstest::rstest;

    fn oids(commits: Vec<&Commit>) -> Vec<String> {
        commits.iter().map(|c| c.oid().to_string()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let snapshot = linear_history(&["a", "b", "c"]);
        let filter = CommitFilter::new();

        assert!(filter.is_empty());
        assert_eq!(filter.apply(&snapshot).len(), 3);
    }

    #[test]
    fn test_date_bounds_are_exclusive() {
        // authored dates are 0h, 1h, 2h after the epoch used by the fixtures
        let snapshot = linear_history(&["a", "b", "c"]);
        let filter = CommitFilter::new()
            .after(timestamp(0, 0))
            .before(timestamp(2, 0));

        assert_eq!(oids(filter.apply(&snapshot)), vec![create_oid("b").to_string()]);
    }

    #[rstest]
    #[case("author b", 1)]
    #[case("committer .*", 3)]
    #[case("^nobody", 0)]
    fn test_actor_pattern(#[case] pattern: &str, #[case] expected: usize) {
        let snapshot = linear_history(&["a", "b", "c"]);
        let filter = CommitFilter::new().actor_matching(Regex::new(pattern).unwrap());

        assert_eq!(filter.apply(&snapshot).len(), expected);
    }

    #[test]
    fn test_message_and_weekday_criteria_combine() {
        // 2022-01-01 is a Saturday
        let snapshot = linear_history(&["a", "b", "c"]);
        let weekend = CommitFilter::new()
            .on_weekdays(Weekdays::SATURDAY | Weekdays::SUNDAY)
            .message_matching(Regex::new("commit [ab]").unwrap());
        let weekdays = CommitFilter::new().on_weekdays(Weekdays::WORKDAYS);

        assert_eq!(weekend.apply(&snapshot).len(), 2);
        assert!(weekdays.apply(&snapshot).is_empty());
    }

    #[rstest]
    #[case(DateColumn::Authored, vec!["b"])]
    #[case(DateColumn::Committed, vec![])]
    #[case(DateColumn::Any, vec!["b"])]
    fn test_date_column(#[case] column: DateColumn, #[case] expected: Vec<&str>) {
        // authored at 01:00-03:00 in +0100, committed at 19:00-21:00 the day before in -0500
        let snapshot = linear_history(&["a", "b", "c"]);
        let filter = CommitFilter::new()
            .date_column(column)
            .after_hour(NaiveTime::from_hms_opt(1, 30, 0).unwrap())
            .before_hour(NaiveTime::from_hms_opt(3, 0, 0).unwrap());

        let expected = expected
            .into_iter()
            .map(|name| create_oid(name).to_string())
            .collect::<Vec<_>>();
        assert_eq!(oids(filter.apply(&snapshot)), expected);
    }

    #[test]
    fn test_committed_date_in_its_own_offset() {
        // committed at 19:00, 20:00, 21:00 on 2021-12-31 in -0500
        let snapshot = linear_history(&["a", "b", "c"]);
        let filter = CommitFilter::new()
            .date_column(DateColumn::Committed)
            .after_hour(NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        let any = CommitFilter::new()
            .date_column(DateColumn::Any)
            .on_weekdays(Weekdays::FRIDAY);

        assert_eq!(
            oids(filter.apply(&snapshot)),
            vec![create_oid("c").to_string(), create_oid("b").to_string()]
        );
        assert_eq!(any.apply(&snapshot).len(), 3);
        assert!(DateColumn::try_parse("sometime").is_err());
    }

    #[test]
    fn test_hour_window() {
        // authored at 01:00, 02:00, 03:00 in +0100
        let snapshot = linear_history(&["a", "b", "c"]);
        let filter = CommitFilter::new()
            .after_hour(NaiveTime::from_hms_opt(1, 30, 0).unwrap())
            .before_hour(NaiveTime::from_hms_opt(3, 0, 0).unwrap());

        assert_eq!(oids(filter.apply(&snapshot)), vec![create_oid("b").to_string()]);
    }
}
