//! The seven stage workers (§4.8), one module each, plus the query
//! functions a couple of them register alongside their `WorkerGroup`.

pub mod completed_torrent_monitor;
pub mod completed_torrent_packager;
pub mod package_downloader;
pub mod package_extractor;
pub mod packaged_torrent_lister;
pub mod packaged_torrent_monitor;
pub mod torrent_deleter;

pub use completed_torrent_monitor::CompletedTorrentMonitor;
pub use completed_torrent_packager::CompletedTorrentPackager;
pub use package_downloader::{PackageDownloader, PackageDownloaderRecoveryQuery, TorrentAggregationQuery};
pub use package_extractor::PackageExtractor;
pub use packaged_torrent_lister::{ListerRecoveryQuery, PackagedTorrentLister};
pub use packaged_torrent_monitor::PackagedTorrentMonitor;
pub use torrent_deleter::TorrentDeleter;

use dasd_core::PipelineError;
use dasd_runtime::{EntityKind, FailedEntity, WorkError};
use uuid::Uuid;

/// Wrap a failure that isn't attributable to any single row (a request that
/// failed before an entity was identified, e.g. the initial listing call).
pub(crate) fn unattributed(error: PipelineError) -> WorkError {
    WorkError { entity: None, error }
}

/// Wrap a failure attributed to a torrent row.
pub(crate) fn torrent_failure(id: Uuid, stage_at_failure: &'static str, error: PipelineError) -> WorkError {
    WorkError {
        entity: Some(FailedEntity {
            kind: EntityKind::Torrent,
            id,
            stage_at_failure,
        }),
        error,
    }
}

/// Wrap a failure attributed to a package file row.
pub(crate) fn package_file_failure(id: Uuid, stage_at_failure: &'static str, error: PipelineError) -> WorkError {
    WorkError {
        entity: Some(FailedEntity {
            kind: EntityKind::PackageFile,
            id,
            stage_at_failure,
        }),
        error,
    }
}

/// Map a data-layer failure to the pipeline error taxonomy.
pub(crate) fn storage_error(source: &dasd_data::DataError) -> PipelineError {
    PipelineError::Storage {
        message: source.to_string(),
    }
}

/// Map an HTTP client failure to the pipeline error taxonomy.
pub(crate) fn request_error(source: &dasd_http::HttpError) -> PipelineError {
    PipelineError::Request {
        message: source.to_string(),
    }
}
