use std::path::PathBuf;

use tracing::debug;

use crate::backend::descriptor::BackendDescriptor;
use crate::backend::table::BackendTable;
use crate::errors::PlaybackError;
use crate::platform::Platform;

/// A descriptor whose executable was found.
#[derive(Clone, Debug)]
pub struct ResolvedBackend {
    pub descriptor: BackendDescriptor,
    pub executable: PathBuf,
}

impl ResolvedBackend {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Walks a [`BackendTable`] and probes for installed executables.
///
/// Probing has no side effects: nothing is spawned.
#[derive(Clone, Debug)]
pub struct BackendResolver {
    table: BackendTable,
}

impl BackendResolver {
    pub fn new(table: BackendTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BackendTable {
        &self.table
    }

    /// First candidate for `platform` whose executable is present.
    pub fn resolve(&self, platform: &Platform) -> Result<ResolvedBackend, PlaybackError> {
        self.available(platform)
            .into_iter()
            .next()
            .ok_or_else(|| PlaybackError::NoBackendAvailable(platform.clone()))
    }

    /// Every present candidate for `platform`, in priority order.
    pub fn available(&self, platform: &Platform) -> Vec<ResolvedBackend> {
        self.table
            .candidates(platform)
            .into_iter()
            .filter_map(|descriptor| match descriptor.locator.locate() {
                Some(executable) => {
                    debug!(backend = %descriptor.name, path = %executable.display(), "Media player found");
                    Some(ResolvedBackend {
                        descriptor: descriptor.clone(),
                        executable,
                    })
                }
                None => {
                    debug!(backend = %descriptor.name, "Media player not installed");
                    None
                }
            })
            .collect()
    }
}
