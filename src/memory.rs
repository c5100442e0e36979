use core::alloc::{GlobalAlloc, Layout};
use core::mem::size_of;
use core::ptr::{self, NonNull};

use alloc::string::String;
use core::fmt::Write;

/// `'lvgl'` read as a little-endian u32.
pub const POOL_SIGNATURE: u32 = u32::from_le_bytes(*b"lvgl");

/// Alignment every firmware pool allocation is guaranteed to have.
pub const POOL_ALIGN: usize = 8;

// Precedes every block; `offset` leads back to the raw pool allocation.
#[repr(C)]
struct BlockHeader {
    signature: u32,
    _reserved: u32,
    size: usize,
    offset: usize,
}

const HEADER_SIZE: usize = size_of::<BlockHeader>();

const _: () = assert!(HEADER_SIZE % POOL_ALIGN == 0);

/// Source of raw, 8-byte aligned memory blocks.
pub trait PoolBackend {
    fn allocate_pool(&self, size: usize) -> Option<NonNull<u8>>;

    /// # Safety
    /// `block` must come from `allocate_pool` on the same backend and must
    /// not be freed twice.
    unsafe fn free_pool(&self, block: NonNull<u8>);
}

pub struct PoolAllocator<B> {
    backend: B,
}

impl<B: PoolBackend> PoolAllocator<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns null when the pool is exhausted.
    pub fn allocate(&self, size: usize) -> *mut u8 {
        self.allocate_aligned(size, POOL_ALIGN)
    }

    pub fn allocate_aligned(&self, size: usize, align: usize) -> *mut u8 {
        let align = align.max(POOL_ALIGN);
        let Some(total) = HEADER_SIZE
            .checked_add(size)
            .and_then(|n| n.checked_add(align - POOL_ALIGN))
        else {
            return ptr::null_mut();
        };
        let Some(raw) = self.backend.allocate_pool(total) else {
            return ptr::null_mut();
        };

        let raw_addr = raw.as_ptr() as usize;
        let user_addr = (raw_addr + HEADER_SIZE + align - 1) & !(align - 1);
        let offset = user_addr - raw_addr;

        // SAFETY: offset + size <= total, and the header slot directly below
        // `user` is inside the block and 8-byte aligned.
        unsafe {
            let user = raw.as_ptr().add(offset);
            let header = user.sub(HEADER_SIZE) as *mut BlockHeader;
            header.write(BlockHeader {
                signature: POOL_SIGNATURE,
                _reserved: 0,
                size,
                offset,
            });
            user
        }
    }

    /// Size originally requested for `ptr`.
    ///
    /// # Safety
    /// `ptr` must be non-null and point at least `HEADER_SIZE` bytes into
    /// readable memory.
    pub unsafe fn block_size(&self, ptr: *mut u8) -> usize {
        unsafe { (*Self::header(ptr)).size }
    }

    /// # Safety
    /// `ptr` must be null or a live pointer returned by this allocator.
    pub unsafe fn reallocate(&self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        unsafe { self.reallocate_aligned(ptr, new_size, POOL_ALIGN) }
    }

    /// # Safety
    /// Same contract as [`PoolAllocator::reallocate`].
    pub unsafe fn reallocate_aligned(&self, ptr: *mut u8, new_size: usize, align: usize) -> *mut u8 {
        if ptr.is_null() {
            return self.allocate_aligned(new_size, align);
        }
        let old_size = unsafe { self.block_size(ptr) };
        let new = self.allocate_aligned(new_size, align);
        if new.is_null() {
            return new;
        }
        unsafe {
            ptr::copy_nonoverlapping(ptr, new, old_size.min(new_size));
            self.free(ptr);
        }
        new
    }

    /// # Safety
    /// `ptr` must be null or a live pointer returned by this allocator.
    pub unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        unsafe {
            let header = Self::header(ptr);
            let offset = (*header).offset;
            (*header).signature = 0;
            self.backend
                .free_pool(NonNull::new_unchecked(ptr.sub(offset)));
        }
    }

    unsafe fn header(ptr: *mut u8) -> *mut BlockHeader {
        let header = unsafe { ptr.sub(HEADER_SIZE) } as *mut BlockHeader;
        if unsafe { (*header).signature } != POOL_SIGNATURE {
            panic!("pool allocator: foreign or freed pointer {:p}", ptr);
        }
        header
    }
}

unsafe impl<B: PoolBackend + Sync> GlobalAlloc for PoolAllocator<B> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocate_aligned(layout.size(), layout.align())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        unsafe { self.free(ptr) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        unsafe { self.reallocate_aligned(ptr, new_size, layout.align()) }
    }
}

const PAGE_SIZE: u64 = 4096;

/// Coarse classes of firmware memory descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Free,
    BootServices,
    Runtime,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub boot_services_bytes: u64,
    pub runtime_bytes: u64,
    pub entry_count: usize,
}

impl MemoryInfo {
    pub fn tally<I>(regions: I) -> Self
    where
        I: IntoIterator<Item = (RegionKind, u64)>,
    {
        let mut info = MemoryInfo::default();
        for (kind, page_count) in regions {
            let bytes = page_count * PAGE_SIZE;
            info.total_bytes += bytes;
            info.entry_count += 1;
            match kind {
                RegionKind::Free => info.free_bytes += bytes,
                RegionKind::BootServices => info.boot_services_bytes += bytes,
                RegionKind::Runtime => info.runtime_bytes += bytes,
                RegionKind::Other => {}
            }
        }
        info
    }

    pub fn used_bytes(&self) -> u64 {
        self.total_bytes - self.free_bytes
    }
}

pub fn format_memory_info(info: &MemoryInfo) -> String {
    let mut s = String::new();
    let _ = write!(
        s,
        "{} MB total, {} MB free",
        info.total_bytes / (1024 * 1024),
        info.free_bytes / (1024 * 1024)
    );
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::HostPool;

    fn allocator() -> PoolAllocator<HostPool> {
        PoolAllocator::new(HostPool::default())
    }

    fn fill(ptr: *mut u8, len: usize) {
        for i in 0..len {
            unsafe { ptr.add(i).write(i as u8) };
        }
    }

    fn check(ptr: *mut u8, len: usize) {
        for i in 0..len {
            assert_eq!(unsafe { ptr.add(i).read() }, i as u8, "byte {}", i);
        }
    }

    #[test]
    fn header_records_requested_size() {
        let pool = allocator();
        let ptr = pool.allocate(100);
        assert!(!ptr.is_null());
        assert_eq!(unsafe { pool.block_size(ptr) }, 100);
        unsafe { pool.free(ptr) };
        assert_eq!(pool.backend().live_blocks(), 0);
    }

    #[test]
    fn growing_realloc_preserves_old_contents() {
        let pool = allocator();
        let ptr = pool.allocate(32);
        fill(ptr, 32);
        let grown = unsafe { pool.reallocate(ptr, 200) };
        check(grown, 32);
        assert_eq!(unsafe { pool.block_size(grown) }, 200);
        unsafe { pool.free(grown) };
        assert_eq!(pool.backend().live_blocks(), 0);
    }

    #[test]
    fn shrinking_realloc_preserves_prefix() {
        let pool = allocator();
        let ptr = pool.allocate(64);
        fill(ptr, 64);
        let shrunk = unsafe { pool.reallocate(ptr, 10) };
        check(shrunk, 10);
        unsafe { pool.free(shrunk) };
    }

    #[test]
    fn realloc_of_null_allocates() {
        let pool = allocator();
        let ptr = unsafe { pool.reallocate(ptr::null_mut(), 16) };
        assert!(!ptr.is_null());
        assert_eq!(unsafe { pool.block_size(ptr) }, 16);
        unsafe { pool.free(ptr) };
    }

    #[test]
    fn free_of_null_is_a_no_op() {
        let pool = allocator();
        unsafe { pool.free(ptr::null_mut()) };
        assert_eq!(pool.backend().live_blocks(), 0);
    }

    #[test]
    fn exhausted_pool_returns_null_and_keeps_old_block() {
        let pool = allocator();
        let ptr = pool.allocate(8);
        fill(ptr, 8);
        pool.backend().set_exhausted(true);
        assert!(pool.allocate(8).is_null());
        assert!(unsafe { pool.reallocate(ptr, 64) }.is_null());
        check(ptr, 8);
        pool.backend().set_exhausted(false);
        unsafe { pool.free(ptr) };
    }

    #[test]
    fn large_alignment_is_honoured() {
        let pool = allocator();
        let ptr = pool.allocate_aligned(48, 64);
        assert_eq!(ptr as usize % 64, 0);
        fill(ptr, 48);
        let moved = unsafe { pool.reallocate_aligned(ptr, 96, 64) };
        assert_eq!(moved as usize % 64, 0);
        check(moved, 48);
        unsafe { pool.free(moved) };
        assert_eq!(pool.backend().live_blocks(), 0);
    }

    #[test]
    #[should_panic(expected = "foreign or freed pointer")]
    fn foreign_pointer_is_rejected() {
        let pool = allocator();
        let mut foreign = [0u64; 8];
        let ptr = unsafe { (foreign.as_mut_ptr() as *mut u8).add(32) };
        unsafe { pool.free(ptr) };
    }

    #[test]
    #[should_panic(expected = "foreign or freed pointer")]
    fn double_free_is_rejected() {
        let pool = allocator();
        let ptr = pool.allocate(24);
        // Keep the raw block alive so the second free reads valid memory.
        pool.backend().set_leak_on_free(true);
        unsafe {
            pool.free(ptr);
            pool.free(ptr);
        }
    }

    #[test]
    fn memory_info_tallies_pages() {
        let info = MemoryInfo::tally([
            (RegionKind::Free, 256),
            (RegionKind::BootServices, 16),
            (RegionKind::Runtime, 4),
            (RegionKind::Other, 8),
        ]);
        assert_eq!(info.entry_count, 4);
        assert_eq!(info.total_bytes, 284 * PAGE_SIZE);
        assert_eq!(info.free_bytes, 256 * PAGE_SIZE);
        assert_eq!(info.used_bytes(), 28 * PAGE_SIZE);
        assert_eq!(format_memory_info(&info), "1 MB total, 1 MB free");
    }
}
