use core::mem::size_of;
use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, Layout};

use slab_allocator::SlabCache;

use super::{
    buddy_alloc, buddy_free, buddy_info, buddy_init, slab_alloc, slab_free, slab_init, BuddyInfo,
    BuddyPageSource, SlabKind, BUDDY_LEVELS, PGSIZE,
};
use crate::kernel::syscall::{sys_buddy_info, CopyFault, CopyOut};

#[test]
fn buddy_info_layout_matches_the_abi() {
    assert_eq!(size_of::<BuddyInfo>(), (2 + BUDDY_LEVELS) * size_of::<u64>());
}

/// The buddy singleton and the slab registry are process-global, so the
/// whole boot-to-drain flow runs as one sequential test.
#[test]
fn kernel_allocators_end_to_end() {
    const ARENA_PAGES: usize = 100;

    let layout = Layout::from_size_align(ARENA_PAGES * PGSIZE, PGSIZE).unwrap();
    let base = NonNull::new(unsafe { alloc_zeroed(layout) }).unwrap();
    unsafe { buddy_init(base, ARENA_PAGES * PGSIZE) };

    let fresh = buddy_info();
    assert_eq!(fresh.total, 99);
    assert_eq!(fresh.free, 99);

    // Facade round trip restores the stats snapshot.
    let block = buddy_alloc(4).expect("arena has room");
    assert_eq!(buddy_info().free, 95);
    buddy_free(block);
    assert_eq!(buddy_info(), fresh);

    // Malformed requests are refused without touching the arena.
    assert_eq!(buddy_alloc(0), None);
    assert_eq!(buddy_alloc(3), None);
    assert_eq!(buddy_alloc(1 << BUDDY_LEVELS), None);
    assert_eq!(buddy_info(), fresh);

    // The observability syscall copies the same snapshot out as bytes.
    struct Sink(Vec<u8>);
    impl CopyOut for Sink {
        fn copy_out(&mut self, bytes: &[u8]) -> Result<(), CopyFault> {
            self.0.extend_from_slice(bytes);
            Ok(())
        }
    }
    let mut sink = Sink(Vec::new());
    sys_buddy_info(&mut sink).unwrap();
    let copied: BuddyInfo = bytemuck::pod_read_unaligned(&sink.0);
    assert_eq!(copied, fresh);

    struct FaultingSink;
    impl CopyOut for FaultingSink {
        fn copy_out(&mut self, _bytes: &[u8]) -> Result<(), CopyFault> {
            Err(CopyFault)
        }
    }
    assert_eq!(sys_buddy_info(&mut FaultingSink), Err(CopyFault));

    // Registry smoke: every kind serves distinct, writable objects.
    slab_init();
    for kind in SlabKind::ALL {
        let first = slab_alloc(kind);
        let second = slab_alloc(kind);
        assert_ne!(first, second);
        unsafe {
            first.write_bytes(0x5a, 1);
            second.write_bytes(0xa5, 1);
            assert_eq!(first.read(), 0x5a);
        }
        slab_free(kind, first);
        slab_free(kind, second);
    }

    // Slab stress over the live buddy: 10_000 ten-byte objects, every cell
    // written, then drained in allocation order.
    let mut cache = SlabCache::new(PGSIZE, 10, BuddyPageSource);
    let cells_per_page = cache.cells_per_page();
    let before_stress = buddy_info().free;

    let mut cells = Vec::with_capacity(10_000);
    for index in 0..10_000usize {
        let cell = cache.alloc();
        unsafe { cell.write_bytes((index % 251) as u8, 10) };
        cells.push(cell);
    }

    let data_pages = 10_000usize.div_ceil(cells_per_page) as u64;
    assert_eq!(buddy_info().free, before_stress - data_pages);

    for (index, &cell) in cells.iter().enumerate() {
        assert_eq!(unsafe { cell.read() }, (index % 251) as u8);
    }
    for &cell in &cells {
        cache.free(cell);
    }

    // Every stress page drained back to the empty class; the pages stay
    // with the cache, so only those acquired during the test are gone from
    // the buddy.
    assert_eq!(cache.occupancy(0), data_pages);
    for used in 1..=cells_per_page {
        assert_eq!(cache.occupancy(used), 0);
    }
    assert_eq!(buddy_info().free, before_stress - data_pages);
}
