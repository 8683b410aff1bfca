#![cfg_attr(not(test), no_std)]

use core::ptr::NonNull;

/// List header placed in the first bytes of a free block or managed page.
///
/// Nodes live at caller-chosen addresses inside the managed memory. The page
/// size is a runtime parameter, so block bases carry no alignment guarantee
/// beyond a byte; both structures are therefore packed.
#[repr(C, packed)]
pub struct Node {
    prev: Option<NonNull<Node>>,
    next: Option<NonNull<Node>>,
    list: Option<NonNull<List>>,
    key: u64,
}

/// A list of nodes sharing one classifying key (block level for the buddy
/// tier, used-cell count for the slab tier). The sentinel head is a full
/// node carrying the key; its `prev` stays null so it can never be removed.
#[repr(C, packed)]
pub struct List {
    head: Node,
    len: u64,
}

impl Node {
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
            list: None,
            key: 0,
        }
    }

    /// The classifying key stamped by the owning list on insertion.
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn next_node(&self) -> Option<NonNull<Node>> {
        self.next
    }

    /// Links `node` right after `base`, which must already be on a list.
    ///
    /// The new node inherits the owning list's key and back reference.
    ///
    /// # Safety
    /// `node` must point to writable memory large enough for a `Node` and
    /// must not currently be on any list.
    pub unsafe fn insert_after(base: NonNull<Node>, node: NonNull<Node>) {
        unsafe {
            let base = base.as_ptr();
            let list = (*base)
                .list
                .expect("list insert through an unlinked node")
                .as_ptr();

            let list_key = (*list).head.key;
            let base_key = (*base).key;
            assert!(list_key == base_key, "list key mismatch on insert");

            let next = (*base).next;
            (*node.as_ptr()).prev = NonNull::new(base);
            (*node.as_ptr()).next = next;
            (*node.as_ptr()).list = NonNull::new(list);
            (*node.as_ptr()).key = list_key;

            if let Some(next) = next {
                (*next.as_ptr()).prev = Some(node);
            }
            (*base).next = Some(node);

            (*list).len = (*list).len + 1;
        }
    }

    /// Unlinks `node` from its owning list.
    ///
    /// # Safety
    /// `node` must point to a node currently on a list.
    pub unsafe fn remove(node: NonNull<Node>) {
        unsafe {
            let node = node.as_ptr();
            let prev = (*node).prev.expect("list remove of an unlinked node");
            let list = (*node)
                .list
                .expect("list remove of an orphaned node")
                .as_ptr();
            let next = (*node).next;

            let len = (*list).len;
            assert!(len > 0, "list length underflow");

            (*prev.as_ptr()).next = next;
            if let Some(next) = next {
                (*next.as_ptr()).prev = Some(prev);
            }

            (*node).prev = None;
            (*node).next = None;
            (*node).list = None;

            (*list).len = len - 1;
        }
    }
}

impl List {
    /// Initialises a list head in place, stamping `key` into the sentinel.
    ///
    /// Lists are self-referential (the sentinel records its owner), so a
    /// list is built directly at its final address and must not move.
    ///
    /// # Safety
    /// `at` must point to writable memory large enough for a `List` that
    /// stays valid and pinned for as long as the list is in use.
    pub unsafe fn init(at: NonNull<List>, key: u64) {
        unsafe {
            at.write(List {
                head: Node {
                    prev: None,
                    next: None,
                    list: Some(at),
                    key,
                },
                len: 0,
            });
        }
    }

    pub fn key(&self) -> u64 {
        self.head.key
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first real node, if any.
    pub fn first(&self) -> Option<NonNull<Node>> {
        self.head.next
    }

    /// Inserts `node` right after the sentinel head.
    ///
    /// # Safety
    /// Same contract as [`Node::insert_after`].
    pub unsafe fn push(&mut self, node: NonNull<Node>) {
        unsafe {
            let head = NonNull::new_unchecked(&raw mut self.head);
            Node::insert_after(head, node);
        }
    }

    /// Removes and returns the first real node, if any.
    ///
    /// # Safety
    /// The list's nodes must all point to live node memory.
    pub unsafe fn pop(&mut self) -> Option<NonNull<Node>> {
        let first = self.head.next?;
        unsafe { Node::remove(first) };
        Some(first)
    }
}
