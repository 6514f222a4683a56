use crate::artifacts::edit::field::Field;
use crate::artifacts::edit::store::ModificationStore;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::timelapse::domain::TimeDomain;
use crate::artifacts::timelapse::remapper::Timelapse;
use crate::errors::Result;
use chrono::Utc;
use rand::Rng;
use tracing::info;

/// Spread every loaded commit over `domain`, keeping ancestry order
///
/// One uniform sample is drawn per commit; sorted samples are assigned earliest
/// commit first. Authored and committed dates are staged with the same instant,
/// each in the offset the commit originally recorded for it. A drawn date equal to
/// the recorded one is not staged.
pub fn reorder<R: Rng>(
    store: &mut ModificationStore,
    domain: &TimeDomain,
    rng: &mut R,
) -> Result<usize> {
    let timelapse = Timelapse::build(domain)?;

    let commits = store
        .snapshot()
        .oldest_first()
        .map(|commit| commit.oid().clone())
        .collect::<Vec<ObjectId>>();

    let mut samples = (0..commits.len())
        .map(|_| rng.gen_range(0..timelapse.total_seconds()))
        .collect::<Vec<_>>();
    samples.sort_unstable();

    for (oid, sample) in commits.iter().zip(samples) {
        let instant = timelapse
            .instant_from_virtual_seconds(sample)?
            .with_timezone(&Utc);
        store.stage_instant(oid, Field::AuthoredDate, instant)?;
        store.stage_instant(oid, Field::CommittedDate, instant)?;
    }

    info!(
        commits = commits.len(),
        total_seconds = timelapse.total_seconds(),
        "reordered commit dates"
    );

    Ok(commits.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::log::snapshot::fixtures::{create_oid, linear_history};
    use crate::artifacts::timelapse::domain::{HourWindow, Weekdays};
    use crate::errors::ChiselError;
    use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn domain() -> TimeDomain {
        TimeDomain::new(
            NaiveDate::from_ymd_opt(2010, 5, 16).unwrap(),
            NaiveDate::from_ymd_opt(2010, 5, 30).unwrap(),
        )
        .with_hours(vec![
            HourWindow::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            )
            .unwrap(),
        ])
        .with_weekdays(Weekdays::WORKDAYS)
    }

    fn dates(store: &ModificationStore, field: Field) -> Vec<chrono::DateTime<chrono::FixedOffset>> {
        store
            .snapshot()
            .oldest_first()
            .map(|commit| store.get(commit.oid(), field).unwrap().as_date().unwrap())
            .collect()
    }

    #[test]
    fn test_reorder_stages_every_commit() {
        let mut store = ModificationStore::new(linear_history(&["a", "b", "c", "d"]));
        let mut rng = StdRng::seed_from_u64(7);

        let count = reorder(&mut store, &domain(), &mut rng).unwrap();

        assert_eq!(count, 4);
        assert_eq!(store.modified_count(), 4);
        for date in dates(&store, Field::AuthoredDate) {
            let utc = date.naive_utc();
            assert!((9..17).contains(&utc.hour()));
            assert!(utc.weekday().num_days_from_monday() < 5);
        }
    }

    #[test]
    fn test_reorder_keeps_original_offsets() {
        let mut store = ModificationStore::new(linear_history(&["a", "b"]));
        let mut rng = StdRng::seed_from_u64(1);
        reorder(&mut store, &domain(), &mut rng).unwrap();

        let a = create_oid("a");
        let authored = store.get(&a, Field::AuthoredDate).unwrap().as_date().unwrap();
        let committed = store.get(&a, Field::CommittedDate).unwrap().as_date().unwrap();

        assert_eq!(authored, committed);
        assert_eq!(authored.offset().local_minus_utc(), 3600);
        assert_eq!(committed.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_empty_domain_stages_nothing() {
        let mut store = ModificationStore::new(linear_history(&["a"]));
        let mut rng = StdRng::seed_from_u64(1);
        let domain = domain().with_weekdays(Weekdays::empty());

        assert!(matches!(
            reorder(&mut store, &domain, &mut rng),
            Err(ChiselError::EmptyDomain)
        ));
        assert!(!store.has_modifications());
    }

    #[test]
    fn test_sample_on_the_recorded_date_is_not_staged() {
        // commit a was authored and committed at 2022-01-01 00:00:00 UTC
        let minute = TimeDomain::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 2).unwrap(),
        )
        .with_hours(vec![
            HourWindow::new(NaiveTime::MIN, NaiveTime::from_hms_opt(0, 1, 0).unwrap()).unwrap(),
        ]);

        let mut outcomes = (0..2_000u64).map(|seed| {
            let mut store = ModificationStore::new(linear_history(&["a"]));
            reorder(&mut store, &minute, &mut StdRng::seed_from_u64(seed)).unwrap();
            store.modified_count()
        });

        assert!(outcomes.any(|modified| modified == 0));
    }

    proptest! {
        #[test]
        fn test_reorder_preserves_ancestry_order(seed in any::<u64>()) {
            let mut store = ModificationStore::new(linear_history(&["a", "b", "c", "d", "e", "f"]));
            let mut rng = StdRng::seed_from_u64(seed);
            reorder(&mut store, &domain(), &mut rng).unwrap();

            for field in [Field::AuthoredDate, Field::CommittedDate] {
                let dates = dates(&store, field);
                prop_assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
            }
        }
    }
}
