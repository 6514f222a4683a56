use crate::areas::repository::Repository;
use crate::artifacts::edit::store::ModificationStore;
use crate::artifacts::log::snapshot::HistorySnapshot;
use crate::artifacts::timelapse::domain::TimeDomain;
use crate::artifacts::timelapse::reorder::reorder;
use crate::commands::porcelain::write::WriteOptions;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct ReorderOptions {
    /// Branches to reorder, the checked-out one when empty
    pub branches: Vec<String>,
    pub domain: TimeDomain,
    /// Fixed seed for reproducible dates
    pub seed: Option<u64>,
    pub write: WriteOptions,
}

impl Repository {
    pub async fn reorder(&self, opts: &ReorderOptions) -> anyhow::Result<()> {
        let mut rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let branches = if opts.branches.is_empty() {
            vec![self.branch_or_current(None)?]
        } else {
            opts.branches
                .iter()
                .map(|branch| self.branch_or_current(Some(branch.as_str())))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut stores = Vec::with_capacity(branches.len());
        for branch in &branches {
            let mut store = ModificationStore::new(HistorySnapshot::load(self, branch)?);
            let count = reorder(&mut store, &opts.domain, &mut rng)?;
            writeln!(self.writer(), "{branch}: {count} commit(s) redistributed")?;
            stores.push(store);
        }

        self.write_modifications(&stores, &opts.write).await
    }
}
