use core::mem::size_of;
use core::ptr::NonNull;

use intrusive_list::{List, Node};

use super::PageSource;

/// A cache of fixed-size cells carved out of single pages.
///
/// Every managed page starts with a list node header whose key is the page's
/// used-cell count, followed by a one-byte-per-cell occupancy bitmap and the
/// cells themselves. Pages are filed on one of `cells + 1` lists indexed by
/// occupancy; allocation always serves the fullest page that still has room,
/// so lightly used pages drain towards empty.
pub struct SlabCache<S: PageSource> {
    pgsize: usize,
    object_size: usize,
    /// Cells per page: `(pgsize - header) / (1 + object_size)`.
    cells: usize,
    /// `cells + 1` occupancy list heads, living in pages taken from the
    /// source at construction.
    lists: NonNull<List>,
    source: S,
}

// SAFETY: The cache exclusively owns its bookkeeping region and every page
// it has taken from the source; all shared use goes through an external lock.
unsafe impl<S: PageSource + Send> Send for SlabCache<S> {}

impl<S: PageSource> SlabCache<S> {
    /// Builds a cache of `object_size`-byte cells over `pgsize`-byte pages.
    /// Geometry that leaves no room for even one cell is a fatal error, as
    /// is an exhausted page source.
    pub fn new(pgsize: usize, object_size: usize, source: S) -> Self {
        assert!(object_size > 0, "slab: zero-sized object");
        assert!(size_of::<Node>() < pgsize, "slab: page smaller than its header");
        let cells = (pgsize - size_of::<Node>()) / (1 + object_size);
        assert!(cells > 0, "slab: page too small for a single cell");

        let bytes = (cells + 1) * size_of::<List>();
        let mut serv = 1;
        while serv * pgsize < bytes {
            serv *= 2;
        }

        let lists = source
            .get_pages(serv)
            .expect("slab: no pages for the occupancy lists")
            .cast::<List>();
        for used in 0..=cells {
            unsafe { List::init(lists.add(used), used as u64) };
        }

        Self {
            pgsize,
            object_size,
            cells,
            lists,
            source,
        }
    }

    pub fn cells_per_page(&self) -> usize {
        self.cells
    }

    /// Number of pages currently holding exactly `used` live cells.
    pub fn occupancy(&self, used: usize) -> u64 {
        assert!(used <= self.cells);
        self.list(used).len()
    }

    /// Hands out one cell. Takes a fresh page from the source only when no
    /// managed page has room.
    pub fn alloc(&mut self) -> NonNull<u8> {
        // Fullest partial page first.
        for used in (0..self.cells).rev() {
            if let Some(node) = self.list(used).first() {
                return self.alloc_cell(node.cast());
            }
        }

        let page = self.new_page();
        self.alloc_cell(page.cast())
    }

    /// Returns a cell to its page. The pointer is trusted to come from this
    /// cache; only the per-cell occupancy byte is verified.
    pub fn free(&mut self, ptr: NonNull<u8>) {
        let page = self.source.page_base_of(ptr);
        assert!(
            ptr.as_ptr() as usize - (page.as_ptr() as usize) < self.pgsize,
            "slab: cell pointer outside its page"
        );
        let node: NonNull<Node> = page.cast();

        let used = unsafe { node.as_ref() }.key() as usize;
        assert!(used > 0, "slab: free on an empty page");
        unsafe {
            Node::remove(node);
            self.list_mut(used - 1).push(node);
        }

        let cell_base = self.cell_base(page).as_ptr() as usize;
        let index = (ptr.as_ptr() as usize - cell_base) / self.object_size;
        let slot = unsafe { self.bitmap(page).add(index) };
        unsafe {
            assert!(slot.read() == 1, "slab: double free of a cell");
            slot.write(0);
        }
    }

    /// Marks the first free cell of `node`'s page used and refiles the page
    /// one occupancy class up.
    fn alloc_cell(&mut self, node: NonNull<Node>) -> NonNull<u8> {
        let used = unsafe { node.as_ref() }.key() as usize;
        assert!(used < self.cells, "slab: allocation from a full page");

        let page = node.cast::<u8>();
        let bitmap = self.bitmap(page);
        let index = (0..self.cells)
            .find(|&cell| unsafe { bitmap.add(cell).read() } == 0)
            .expect("slab: page below capacity has no free cell");
        unsafe { bitmap.add(index).write(1) };

        unsafe {
            Node::remove(node);
            self.list_mut(used + 1).push(node);
        }

        unsafe { self.cell_base(page).add(index * self.object_size) }
    }

    /// One fresh page from the source, zeroed bitmap, filed as empty.
    fn new_page(&mut self) -> NonNull<u8> {
        let page = self.source.get_pages(1).expect("slab: page source exhausted");
        let node: NonNull<Node> = page.cast();

        unsafe {
            node.write(Node::new());
            let bitmap = self.bitmap(page);
            for cell in 0..self.cells {
                bitmap.add(cell).write(0);
            }
            self.list_mut(0).push(node);
        }
        page
    }

    fn bitmap(&self, page: NonNull<u8>) -> NonNull<u8> {
        unsafe { page.add(size_of::<Node>()) }
    }

    fn cell_base(&self, page: NonNull<u8>) -> NonNull<u8> {
        unsafe { page.add(size_of::<Node>() + self.cells) }
    }

    fn list(&self, used: usize) -> &List {
        unsafe { self.lists.add(used).as_ref() }
    }

    fn list_mut(&mut self, used: usize) -> &mut List {
        unsafe { self.lists.add(used).as_mut() }
    }
}
