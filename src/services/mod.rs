pub mod dataset;
pub mod fetcher;
pub mod resolver;

pub use dataset::{DatasetError, DomainRecord, LogoRecord, RunRecord};
pub use fetcher::{FetchError, ImageFetcher};
pub use resolver::{LogoResolver, LogoSource, ResolveError};
