use once_cell::sync::OnceCell;

use super::Vlc;
use crate::error::Result;

/// A process-wide table built on first use.
///
/// Concurrent first users block until one of them has built the table; a
/// failed build leaves the slot empty so a later call may retry.
#[derive(Debug, Default)]
pub struct SharedVlc {
    cell: OnceCell<Vlc>,
}

impl SharedVlc {
    /// Initializer for `static` arrays of shared tables.
    #[allow(clippy::declare_interior_mutable_const)]
    pub const UNINIT: SharedVlc = SharedVlc::new();

    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_build<F>(&self, build: F) -> Result<&Vlc>
    where
        F: FnOnce() -> Result<Vlc>,
    {
        self.cell.get_or_try_init(build)
    }

    pub fn get(&self) -> Option<&Vlc> {
        self.cell.get()
    }

    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }
}
