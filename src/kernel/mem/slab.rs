use core::mem::size_of;
use core::ptr::NonNull;

use align_ext::AlignExt;
use aquila_log::println_info;
use aquila_sync::Spin;
use slab_allocator::{PageSource, SlabCache};

use super::page_alloc::{buddy_alloc, buddy_free};
use super::PGSIZE;
use crate::kernel::pipe::Pipe;
use crate::kernel::virtio::{VirtqAvail, VirtqDesc, VirtqUsed};

/// Object kinds served by the slab registry, one independently locked cache
/// per kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlabKind {
    VirtqDesc,
    VirtqAvail,
    VirtqUsed,
    Pipe,
}

impl SlabKind {
    pub const ALL: [SlabKind; 4] = [
        SlabKind::VirtqDesc,
        SlabKind::VirtqAvail,
        SlabKind::VirtqUsed,
        SlabKind::Pipe,
    ];

    const fn object_size(self) -> usize {
        match self {
            SlabKind::VirtqDesc => size_of::<VirtqDesc>(),
            SlabKind::VirtqAvail => size_of::<VirtqAvail>(),
            SlabKind::VirtqUsed => size_of::<VirtqUsed>(),
            SlabKind::Pipe => size_of::<Pipe>(),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Page tier of every registry cache: the locked buddy facade. A cache calls
/// in here while holding its own lock; the reverse order never happens.
#[derive(Clone)]
pub struct BuddyPageSource;

impl PageSource for BuddyPageSource {
    fn get_pages(&self, count: usize) -> Option<NonNull<u8>> {
        buddy_alloc(count)
    }

    fn put_pages(&self, ptr: NonNull<u8>) {
        buddy_free(ptr)
    }

    fn page_base_of(&self, ptr: NonNull<u8>) -> NonNull<u8> {
        let base = (ptr.as_ptr() as usize).align_down(PGSIZE);
        NonNull::new(base as *mut u8).expect("slab cell in the zero page")
    }
}

static SLABS: [Spin<Option<SlabCache<BuddyPageSource>>>; SlabKind::ALL.len()] =
    [const { Spin::new(None) }; SlabKind::ALL.len()];

/// Builds every registry cache. Called once at boot, after `buddy_init`.
pub fn slab_init() {
    for kind in SlabKind::ALL {
        let cache = SlabCache::new(PGSIZE, kind.object_size(), BuddyPageSource);
        println_info!("slab: {:?}, {} cells per page", kind, cache.cells_per_page());

        let mut slot = SLABS[kind.index()].lock();
        assert!(slot.is_none(), "slab init: already initialised");
        *slot = Some(cache);
    }
}

/// One object of `kind`'s size. Fatal when the backing arena is exhausted.
pub fn slab_alloc(kind: SlabKind) -> NonNull<u8> {
    SLABS[kind.index()]
        .lock()
        .as_mut()
        .expect("slab: used before init")
        .alloc()
}

/// Returns an object previously obtained from [`slab_alloc`] with the same
/// `kind`.
pub fn slab_free(kind: SlabKind, ptr: NonNull<u8>) {
    SLABS[kind.index()]
        .lock()
        .as_mut()
        .expect("slab: used before init")
        .free(ptr)
}
