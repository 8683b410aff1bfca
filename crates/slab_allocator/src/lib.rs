#![cfg_attr(not(test), no_std)]

mod slab_cache;

use core::ptr::NonNull;

pub use slab_cache::SlabCache;

/// The page tier backing a slab cache.
///
/// The kernel implements this over the locked buddy facade; a cache may call
/// `get_pages` while its own lock is held, never the other way around.
pub trait PageSource {
    /// One run of `count` pages, `count` a power of two. `None` when the
    /// tier is exhausted.
    fn get_pages(&self, count: usize) -> Option<NonNull<u8>>;

    /// Returns a run previously obtained from `get_pages`.
    fn put_pages(&self, ptr: NonNull<u8>);

    /// Masks a cell pointer down to the base of its containing page.
    fn page_base_of(&self, ptr: NonNull<u8>) -> NonNull<u8>;
}
