pub mod page_alloc;
pub mod slab;

#[cfg(test)]
mod tests;

/// Hardware page size of the target.
pub const PGSIZE: usize = 4096;

/// Block-size classes of the kernel arena; the largest block spans
/// `2^(BUDDY_LEVELS - 1)` pages.
pub const BUDDY_LEVELS: usize = 10;

pub use page_alloc::{buddy_alloc, buddy_free, buddy_info, buddy_init, BuddyInfo};
pub use slab::{slab_alloc, slab_free, slab_init, BuddyPageSource, SlabKind};
