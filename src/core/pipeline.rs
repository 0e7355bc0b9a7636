use crate::core::fingerprint::{Fingerprint, FingerprintService};
use crate::core::grouping::{Partition, SeedGrouper};
use crate::core::materialize::{GroupError, materialize};
use crate::core::record::{GroupRecord, LogoItem};
use crate::services::fetcher::ImageFetcher;
use rayon::prelude::*;

/// A logo and its fingerprint, kept in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinted {
    pub item: LogoItem,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone)]
pub struct GroupingOutcome {
    pub partition: Partition,
    pub records: Vec<GroupRecord>,
}

/// Download and fingerprint every logo in parallel.
///
/// Logos that cannot be fetched or decoded are dropped (the fetcher logs
/// why); the survivors keep their relative input order. `on_done` is called
/// once per item, whether it survived or not.
pub fn fingerprint_items<F>(
    service: &FingerprintService,
    fetcher: &ImageFetcher,
    items: Vec<LogoItem>,
    on_done: F,
) -> Vec<Fingerprinted>
where
    F: Fn() + Sync,
{
    let table: Vec<Fingerprinted> = items
        .into_par_iter()
        .filter_map(|item| {
            let fingerprint = fetcher
                .fetch(&item.logo_url)
                .map(|image| service.fingerprint(&image));
            on_done();
            fingerprint.map(|fingerprint| Fingerprinted { item, fingerprint })
        })
        .collect();
    log::debug!("Fingerprinted {} logo(s)", table.len());
    table
}

/// Group an already fingerprinted table.
pub fn group_fingerprinted(
    table: &[Fingerprinted],
    threshold: u32,
) -> Result<GroupingOutcome, GroupError> {
    let fingerprints: Vec<Fingerprint> = table.iter().map(|f| f.fingerprint.clone()).collect();
    let items: Vec<LogoItem> = table.iter().map(|f| f.item.clone()).collect();

    let partition = SeedGrouper::new(threshold).group(&fingerprints);
    let records = materialize(&partition, &items)?;
    Ok(GroupingOutcome { partition, records })
}
