use crate::core::grouping::Partition;
use crate::core::record::{GroupRecord, LogoItem};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("Group {group_id} refers to item {index}, but only {len} items were given")]
    IndexOutOfRange {
        group_id: usize,
        index: usize,
        len: usize,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Turn an index partition into output rows, one per group in id order.
pub fn materialize(
    partition: &Partition,
    items: &[LogoItem],
) -> Result<Vec<GroupRecord>, GroupError> {
    partition
        .groups()
        .iter()
        .map(|group| {
            let mut domains = Vec::with_capacity(group.len());
            let mut logo_urls = Vec::with_capacity(group.len());
            for &index in &group.members {
                let item = items.get(index).ok_or(GroupError::IndexOutOfRange {
                    group_id: group.id,
                    index,
                    len: items.len(),
                })?;
                domains.push(item.domain.clone());
                logo_urls.push(item.logo_url.clone());
            }
            Ok(GroupRecord {
                group_id: group.id,
                domains,
                logo_urls,
            })
        })
        .collect()
}
