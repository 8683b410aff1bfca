use core::ptr::NonNull;

use align_ext::AlignExt;
use aquila_log::println_info;
use aquila_sync::Spin;
use buddy_allocator::Arena;
use bytemuck::Zeroable;

use super::{BUDDY_LEVELS, PGSIZE};

static BUDDY: Spin<Option<Arena>> = Spin::new(None);

/// Snapshot of the buddy arena, as copied out to user space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BuddyInfo {
    pub total: u64,
    pub free: u64,
    pub free_by_size: [u64; BUDDY_LEVELS],
}

/// Binds the buddy singleton to the physical region `[base, base + size)`,
/// typically the gap between the end of the kernel image (rounded up to a
/// page) and `PHYSTOP`. Called once at boot, before any allocator use.
///
/// # Safety
/// The caller hands over exclusive ownership of the region; no other code
/// may touch it afterwards.
pub unsafe fn buddy_init(base: NonNull<u8>, size: usize) {
    let addr = base.as_ptr() as usize;
    assert!(
        addr.align_down(PGSIZE) == addr,
        "buddy init: arena base not page-aligned"
    );
    assert!(
        size.align_down(PGSIZE) == size,
        "buddy init: arena size not page-aligned"
    );

    let arena = unsafe { Arena::new(BUDDY_LEVELS, PGSIZE, size / PGSIZE, base) }
        .expect("buddy init: bad arena geometry");
    println_info!("buddy: {} pages of {} bytes", arena.total_pages(), PGSIZE);

    let mut buddy = BUDDY.lock();
    assert!(buddy.is_none(), "buddy init: already initialised");
    *buddy = Some(arena);
}

/// One block of `pages` pages from the kernel arena; `pages` must be a power
/// of two no larger than `2^(BUDDY_LEVELS - 1)`. `None` on a malformed
/// request or an exhausted arena.
pub fn buddy_alloc(pages: usize) -> Option<NonNull<u8>> {
    BUDDY
        .lock()
        .as_mut()
        .expect("buddy: used before init")
        .alloc(pages)
}

/// Returns a block previously obtained from [`buddy_alloc`].
pub fn buddy_free(block: NonNull<u8>) {
    BUDDY
        .lock()
        .as_mut()
        .expect("buddy: used before init")
        .free(block)
}

/// Linearizable snapshot of the arena statistics.
pub fn buddy_info() -> BuddyInfo {
    let mut info = BuddyInfo::zeroed();
    let guard = BUDDY.lock();
    let arena = guard.as_ref().expect("buddy: used before init");
    let (total, free) = arena.stat(&mut info.free_by_size);
    info.total = total;
    info.free = free;
    info
}
