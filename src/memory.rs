use crate::types::{Limits, MemoryType};
use crate::validation::MAX_MEMORY_PAGES;
use crate::value::LittleEndianConvert;
use crate::Error;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Range;
use memory_units::wasm32::Pages;
use memory_units::{Bytes, RoundUpTo};

/// Size of a page of [linear memory][`MemoryInstance`] - 64KiB.
///
/// The size of a memory is always an integer multiple of a page size.
///
/// [`MemoryInstance`]: struct.MemoryInstance.html
pub const LINEAR_MEMORY_PAGE_SIZE: Bytes = Bytes(65536);

/// Reference to a memory (See [`MemoryInstance`] for details).
///
/// This reference has a reference-counting semantics.
#[derive(Clone, Debug)]
pub struct MemoryRef(Rc<MemoryInstance>);

impl ::core::ops::Deref for MemoryRef {
    type Target = MemoryInstance;
    fn deref(&self) -> &MemoryInstance {
        &self.0
    }
}

impl MemoryRef {
    pub(crate) fn ptr_eq(a: &MemoryRef, b: &MemoryRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Runtime representation of a linear memory (or `memory` for short).
///
/// A memory is a contiguous, mutable array of raw bytes. Wasm code can
/// load and store values from/to a linear memory at any byte address. A
/// trap occurs if an access is not within the bounds of the current
/// memory size.
///
/// A memory is created with an initial size but can be grown
/// dynamically up to an optional maximum; growth never relocates
/// observable contents, and the size is always an integer multiple of a
/// [page][`LINEAR_MEMORY_PAGE_SIZE`].
pub struct MemoryInstance {
    ty: MemoryType,
    /// Linear memory buffer with lazy allocation.
    buffer: RefCell<Vec<u8>>,
    initial: Pages,
    current_size: Cell<usize>,
    maximum: Option<Pages>,
    /// Serialises atomic read-modify-write sequences.
    #[cfg(feature = "threads")]
    atomic_lock: spin::Mutex<()>,
    #[cfg(feature = "threads")]
    waiters: waiters::WaiterTable,
}

impl fmt::Debug for MemoryInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MemoryInstance")
            .field("ty", &self.ty)
            .field("buffer.len", &self.buffer.borrow().len())
            .field("current_size", &self.current_size.get())
            .finish()
    }
}

struct CheckedRegion {
    offset: usize,
    size: usize,
}

impl CheckedRegion {
    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }
}

impl MemoryInstance {
    /// Allocate a memory instance.
    ///
    /// The memory is allocated with the initial number of pages of `ty`,
    /// zero-filled.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the limits are malformed (initial above maximum,
    /// or either above 65536 pages).
    pub fn alloc(ty: MemoryType) -> Result<MemoryRef, Error> {
        validate_memory(
            Pages(ty.limits().initial() as usize),
            ty.limits().maximum().map(|m| Pages(m as usize)),
        )
        .map_err(Error::Memory)?;
        Ok(MemoryRef(Rc::new(MemoryInstance::new(ty))))
    }

    fn new(ty: MemoryType) -> MemoryInstance {
        let initial = Pages(ty.limits().initial() as usize);
        let maximum = ty.limits().maximum().map(|m| Pages(m as usize));
        let initial_size: Bytes = initial.into();
        MemoryInstance {
            ty,
            buffer: RefCell::new(Vec::with_capacity(4096)),
            initial,
            current_size: Cell::new(initial_size.0),
            maximum,
            #[cfg(feature = "threads")]
            atomic_lock: spin::Mutex::new(()),
            #[cfg(feature = "threads")]
            waiters: waiters::WaiterTable::new(),
        }
    }

    /// The type this memory was created with.
    pub fn ty(&self) -> &MemoryType {
        &self.ty
    }

    /// Return linear memory limits, in pages.
    pub(crate) fn limits(&self) -> &Limits {
        self.ty.limits()
    }

    /// Whether this memory may be shared between threads of a module.
    pub fn is_shared(&self) -> bool {
        self.ty.is_shared()
    }

    /// Returns the number of pages this `MemoryInstance` was created
    /// with.
    pub fn initial(&self) -> Pages {
        self.initial
    }

    /// Returns the maximum number of pages this `MemoryInstance` can
    /// grow to, or `None` if there is no limit set.
    pub fn maximum(&self) -> Option<Pages> {
        self.maximum
    }

    /// Returns the current linear memory size in pages.
    pub fn current_size(&self) -> Pages {
        Bytes(self.current_size.get()).round_up_to()
    }

    /// Returns the current linear memory size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.current_size.get()
    }

    /// Get a typed value from memory at the given offset.
    pub fn get_value<T: LittleEndianConvert>(&self, offset: u32) -> Result<T, Error> {
        let mut buffer = self.buffer.borrow_mut();
        let mut bytes = T::Bytes::default();
        let region =
            self.checked_region(&mut buffer, offset as usize, bytes.as_ref().len())?;
        bytes.as_mut().copy_from_slice(&buffer[region.range()]);
        Ok(T::from_le_bytes(bytes))
    }

    /// Copy data from memory at the given offset.
    ///
    /// This will allocate a vector for you; if you can provide a mutable
    /// slice use [`get_into`].
    ///
    /// [`get_into`]: #method.get_into
    pub fn get(&self, offset: u32, size: usize) -> Result<Vec<u8>, Error> {
        let mut buffer = self.buffer.borrow_mut();
        let region = self.checked_region(&mut buffer, offset as usize, size)?;
        Ok(buffer[region.range()].to_vec())
    }

    /// Copy data from the given offset in the memory into the `target`
    /// slice.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the specified region is out of bounds.
    pub fn get_into(&self, offset: u32, target: &mut [u8]) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();
        let region = self.checked_region(&mut buffer, offset as usize, target.len())?;
        target.copy_from_slice(&buffer[region.range()]);
        Ok(())
    }

    /// Copy data into the memory at the given offset.
    pub fn set(&self, offset: u32, value: &[u8]) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();
        let range = self
            .checked_region(&mut buffer, offset as usize, value.len())?
            .range();
        buffer[range].copy_from_slice(value);
        Ok(())
    }

    /// Copy a typed value into the memory at the given offset.
    pub fn set_value<T: LittleEndianConvert>(&self, offset: u32, value: T) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();
        let bytes = value.into_le_bytes();
        let range = self
            .checked_region(&mut buffer, offset as usize, bytes.as_ref().len())?
            .range();
        buffer[range].copy_from_slice(bytes.as_ref());
        Ok(())
    }

    /// Reads an up-to-8-byte little-endian scalar, zero-extended. The
    /// effective address is 64-bit so an `offset + addr` sum can never
    /// wrap around.
    pub(crate) fn read_scalar(&self, addr: u64, width: u32) -> Result<u64, Error> {
        let mut buffer = self.buffer.borrow_mut();
        let region = self.checked_region_u64(&mut buffer, addr, width as usize)?;
        let mut bytes = [0u8; 8];
        bytes[..width as usize].copy_from_slice(&buffer[region.range()]);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Writes the low `width` bytes of `value` little-endian.
    pub(crate) fn write_scalar(&self, addr: u64, width: u32, value: u64) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();
        let region = self.checked_region_u64(&mut buffer, addr, width as usize)?;
        let bytes = value.to_le_bytes();
        let range = region.range();
        buffer[range].copy_from_slice(&bytes[..width as usize]);
        Ok(())
    }

    /// Reads 16 bytes at once.
    pub(crate) fn read_wide(&self, addr: u64) -> Result<[u8; 16], Error> {
        let mut buffer = self.buffer.borrow_mut();
        let region = self.checked_region_u64(&mut buffer, addr, 16)?;
        let mut out = [0u8; 16];
        out.copy_from_slice(&buffer[region.range()]);
        Ok(out)
    }

    /// Writes 16 bytes at once.
    pub(crate) fn write_wide(&self, addr: u64, bytes: [u8; 16]) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();
        let region = self.checked_region_u64(&mut buffer, addr, 16)?;
        let range = region.range();
        buffer[range].copy_from_slice(&bytes);
        Ok(())
    }

    /// Increases the size of the linear memory by the given number of
    /// pages. Returns the previous memory size in pages if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Err` if more memory was requested than permitted by the
    /// limit.
    pub fn grow(&self, additional: Pages) -> Result<Pages, Error> {
        let size_before_grow: Pages = self.current_size();

        if additional == Pages(0) {
            return Ok(size_before_grow);
        }
        if additional > Pages(MAX_MEMORY_PAGES as usize) {
            return Err(Error::Memory(format!(
                "trying to grow memory by more than {} pages",
                MAX_MEMORY_PAGES
            )));
        }

        let new_size: Pages = size_before_grow + additional;
        let maximum = self
            .maximum
            .unwrap_or(Pages(MAX_MEMORY_PAGES as usize));
        if new_size > maximum {
            return Err(Error::Memory(format!(
                "trying to grow memory by {} pages when already have {}",
                additional.0, size_before_grow.0,
            )));
        }

        let new_buffer_length: Bytes = new_size.into();
        self.current_size.set(new_buffer_length.0);
        Ok(size_before_grow)
    }

    fn checked_region<B>(
        &self,
        buffer: &mut B,
        offset: usize,
        size: usize,
    ) -> Result<CheckedRegion, Error>
    where
        B: ::core::ops::DerefMut<Target = Vec<u8>>,
    {
        let end = offset.checked_add(size).ok_or_else(|| {
            Error::Memory(format!(
                "trying to access memory block of size {} from offset {}",
                size, offset
            ))
        })?;

        if end <= self.current_size.get() && buffer.len() < end {
            buffer.resize(end, 0);
        }

        if end > buffer.len() {
            return Err(Error::Memory(format!(
                "trying to access region [{}..{}] in memory [0..{}]",
                offset,
                end,
                self.current_size.get(),
            )));
        }

        Ok(CheckedRegion { offset, size })
    }

    fn checked_region_u64<B>(
        &self,
        buffer: &mut B,
        addr: u64,
        size: usize,
    ) -> Result<CheckedRegion, Error>
    where
        B: ::core::ops::DerefMut<Target = Vec<u8>>,
    {
        let offset = usize::try_from(addr).map_err(|_| {
            Error::Memory(format!("address {} exceeds the address space", addr))
        })?;
        self.checked_region(buffer, offset, size)
    }

    /// Copy contents of one memory region to another, with `memmove`
    /// overlap semantics.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either of the specified regions is out of
    /// bounds; nothing is written in that case.
    pub fn copy(&self, src_offset: usize, dst_offset: usize, len: usize) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();

        let read_region = self.checked_region(&mut buffer, src_offset, len)?;
        let write_region = self.checked_region(&mut buffer, dst_offset, len)?;
        let read_range = read_region.range();

        buffer.copy_within(read_range, write_region.offset);
        Ok(())
    }

    /// Copy memory between two (possibly distinct) memory instances.
    ///
    /// If the same memory instance is passed as both `src` and `dst`
    /// the overlap-tolerant [`copy`] is used.
    ///
    /// [`copy`]: #method.copy
    pub fn transfer(
        src: &MemoryRef,
        src_offset: usize,
        dst: &MemoryRef,
        dst_offset: usize,
        len: usize,
    ) -> Result<(), Error> {
        if MemoryRef::ptr_eq(src, dst) {
            return src.copy(src_offset, dst_offset, len);
        }

        // Different instances, so borrowing both buffers at once is
        // fine.
        let mut src_buffer = src.buffer.borrow_mut();
        let mut dst_buffer = dst.buffer.borrow_mut();

        let src_range = src
            .checked_region(&mut src_buffer, src_offset, len)?
            .range();
        let dst_range = dst
            .checked_region(&mut dst_buffer, dst_offset, len)?
            .range();

        dst_buffer[dst_range].copy_from_slice(&src_buffer[src_range]);
        Ok(())
    }

    /// Fill the memory region with the specified value, `memset` style.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the specified region is out of bounds.
    pub fn clear(&self, offset: usize, new_val: u8, len: usize) -> Result<(), Error> {
        let mut buffer = self.buffer.borrow_mut();
        let range = self.checked_region(&mut buffer, offset, len)?.range();
        for val in &mut buffer[range] {
            *val = new_val
        }
        Ok(())
    }

    /// Fill the specified memory region with zeroes.
    pub fn zero(&self, offset: usize, len: usize) -> Result<(), Error> {
        self.clear(offset, 0, len)
    }

    /// Provides direct access to the underlying memory buffer.
    ///
    /// # Panics
    ///
    /// Any call that requires write access to the memory made within the
    /// closure will panic.
    pub fn with_direct_access<R, F: FnOnce(&[u8]) -> R>(&self, f: F) -> R {
        let buf = self.buffer.borrow();
        f(&buf)
    }

    /// Provides direct mutable access to the underlying memory buffer.
    ///
    /// # Panics
    ///
    /// Any call that requires read or write access to the memory made
    /// within the closure will panic.
    pub fn with_direct_access_mut<R, F: FnOnce(&mut Vec<u8>) -> R>(&self, f: F) -> R {
        let mut buf = self.buffer.borrow_mut();
        f(&mut buf)
    }
}

#[cfg(feature = "threads")]
mod waiters {
    use std::collections::BTreeMap;
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct WaitQueue {
        waiting: u32,
        tokens: u32,
    }

    /// Outcome of a `memory.atomic.wait*`.
    pub(crate) enum WaitOutcome {
        /// Woken by a notify: result 0.
        Woken,
        /// The comparison failed: result 1.
        NotEqual,
        /// The deadline elapsed: result 2.
        TimedOut,
        /// The interrupt flag was observed.
        Interrupted,
    }

    /// The per-memory futex table: a queue of waiters per address plus
    /// one condition variable shared by all of them.
    pub(crate) struct WaiterTable {
        queues: Mutex<BTreeMap<u64, WaitQueue>>,
        cond: Condvar,
    }

    impl WaiterTable {
        pub(crate) fn new() -> WaiterTable {
            WaiterTable {
                queues: Mutex::new(BTreeMap::new()),
                cond: Condvar::new(),
            }
        }

        /// Parks the caller until a token arrives for `addr`, the
        /// deadline elapses, or the interrupt flag is raised. The caller
        /// has already verified the expected value under the atomic
        /// lock.
        pub(crate) fn wait(
            &self,
            addr: u64,
            deadline: Option<Instant>,
            poll_interval: Duration,
            interrupted: impl Fn() -> bool,
        ) -> WaitOutcome {
            let mut queues = self
                .queues
                .lock()
                .expect("waiter table lock is never poisoned");
            queues.entry(addr).or_default().waiting += 1;
            loop {
                {
                    let queue = queues
                        .get_mut(&addr)
                        .expect("registered on entry above");
                    if queue.tokens > 0 {
                        queue.tokens -= 1;
                        queue.waiting -= 1;
                        if queue.waiting == 0 && queue.tokens == 0 {
                            queues.remove(&addr);
                        }
                        return WaitOutcome::Woken;
                    }
                }
                if interrupted() {
                    self.unregister(&mut queues, addr);
                    return WaitOutcome::Interrupted;
                }
                let now = Instant::now();
                let slice = match deadline {
                    Some(deadline) if deadline <= now => {
                        self.unregister(&mut queues, addr);
                        return WaitOutcome::TimedOut;
                    }
                    Some(deadline) => (deadline - now).min(poll_interval),
                    None => poll_interval,
                };
                let (guard, _timeout) = self
                    .cond
                    .wait_timeout(queues, slice)
                    .expect("waiter table lock is never poisoned");
                queues = guard;
            }
        }

        fn unregister(&self, queues: &mut BTreeMap<u64, WaitQueue>, addr: u64) {
            if let Some(queue) = queues.get_mut(&addr) {
                queue.waiting -= 1;
                if queue.waiting == 0 && queue.tokens == 0 {
                    queues.remove(&addr);
                }
            }
        }

        /// Hands out up to `count` wake tokens; returns the number of
        /// waiters that will consume one.
        pub(crate) fn notify(&self, addr: u64, count: u32) -> u32 {
            let mut queues = self
                .queues
                .lock()
                .expect("waiter table lock is never poisoned");
            let woken = match queues.get_mut(&addr) {
                Some(queue) => {
                    let pending = queue.waiting.saturating_sub(queue.tokens);
                    let woken = pending.min(count);
                    queue.tokens += woken;
                    woken
                }
                None => 0,
            };
            drop(queues);
            self.cond.notify_all();
            woken
        }
    }
}

#[cfg(feature = "threads")]
pub(crate) use waiters::WaitOutcome;

#[cfg(feature = "threads")]
impl MemoryInstance {
    /// Atomically reads an up-to-8-byte scalar.
    pub(crate) fn atomic_load(&self, addr: u64, width: u32) -> Result<u64, Error> {
        let _guard = self.atomic_lock.lock();
        self.read_scalar(addr, width)
    }

    /// Atomically writes an up-to-8-byte scalar.
    pub(crate) fn atomic_store(&self, addr: u64, width: u32, value: u64) -> Result<(), Error> {
        let _guard = self.atomic_lock.lock();
        self.write_scalar(addr, width, value)
    }

    /// Atomically applies `f` to the current value; returns the old
    /// value.
    pub(crate) fn atomic_rmw(
        &self,
        addr: u64,
        width: u32,
        operand: u64,
        f: fn(u64, u64) -> u64,
    ) -> Result<u64, Error> {
        let _guard = self.atomic_lock.lock();
        let old = self.read_scalar(addr, width)?;
        self.write_scalar(addr, width, f(old, operand))?;
        Ok(old)
    }

    /// Atomic compare-and-exchange; returns the old value.
    pub(crate) fn atomic_cmpxchg(
        &self,
        addr: u64,
        width: u32,
        expected: u64,
        replacement: u64,
    ) -> Result<u64, Error> {
        let _guard = self.atomic_lock.lock();
        let old = self.read_scalar(addr, width)?;
        if old == expected {
            self.write_scalar(addr, width, replacement)?;
        }
        Ok(old)
    }

    /// `memory.atomic.wait{32,64}`: parks until notified, timed out, or
    /// interrupted. The comparison against `expected` happens under the
    /// atomic lock.
    pub(crate) fn atomic_wait(
        &self,
        addr: u64,
        width: u32,
        expected: u64,
        timeout_ns: i64,
        poll_interval: core::time::Duration,
        interrupted: impl Fn() -> bool,
    ) -> Result<WaitOutcome, Error> {
        {
            let _guard = self.atomic_lock.lock();
            let current = self.read_scalar(addr, width)?;
            if current != expected {
                return Ok(WaitOutcome::NotEqual);
            }
        }
        let deadline = if timeout_ns < 0 {
            None
        } else {
            Some(std::time::Instant::now() + core::time::Duration::from_nanos(timeout_ns as u64))
        };
        Ok(self.waiters.wait(addr, deadline, poll_interval, interrupted))
    }

    /// `memory.atomic.notify`: wakes up to `count` waiters parked on
    /// `addr`.
    pub(crate) fn atomic_notify(&self, addr: u64, count: u32) -> u32 {
        self.waiters.notify(addr, count)
    }
}

pub(crate) fn validate_memory(initial: Pages, maximum: Option<Pages>) -> Result<(), alloc::string::String> {
    let cap = Pages(MAX_MEMORY_PAGES as usize);
    if initial > cap {
        return Err(format!(
            "initial memory size must be at most {} pages",
            MAX_MEMORY_PAGES
        ));
    }
    if let Some(maximum) = maximum {
        if initial > maximum {
            return Err(format!(
                "maximum limit {} is less than minimum {}",
                maximum.0, initial.0,
            ));
        }

        if maximum > cap {
            return Err(format!(
                "maximum memory size must be at most {} pages",
                MAX_MEMORY_PAGES
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MemoryInstance, MemoryRef, LINEAR_MEMORY_PAGE_SIZE};
    use crate::types::MemoryType;
    use crate::Error;
    use memory_units::wasm32::Pages;

    fn alloc(initial: u32, maximum: Option<u32>) -> Result<MemoryRef, Error> {
        MemoryInstance::alloc(MemoryType::new(initial, maximum))
    }

    #[test]
    fn alloc_respects_limits() {
        let fixtures = &[
            (0, None, true),
            (0, Some(0), true),
            (1, None, true),
            (1, Some(1), true),
            (0, Some(1), true),
            (1, Some(0), false),
            (0, Some(65536), true),
            (65536, Some(65536), true),
            (65536, Some(0), false),
            (65536, None, true),
        ];

        for (index, &(initial, maybe_max, expected_ok)) in fixtures.iter().enumerate() {
            let result = alloc(initial, maybe_max);
            if result.is_ok() != expected_ok {
                panic!(
                    "unexpected error at {}, initial={:?}, max={:?}, expected={}, result={:?}",
                    index, initial, maybe_max, expected_ok, result,
                );
            }
        }
    }

    #[test]
    fn ensure_page_size() {
        use memory_units::ByteSize;
        assert_eq!(LINEAR_MEMORY_PAGE_SIZE, Pages::BYTE_SIZE);
    }

    fn create_memory(initial_content: &[u8]) -> MemoryRef {
        let mem = alloc(1, Some(1)).unwrap();
        mem.set(0, initial_content)
            .expect("failed to initialize the memory");
        mem
    }

    #[test]
    fn copy_overlaps_forward() {
        let mem = create_memory(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        mem.copy(0, 4, 6).expect("copy failed");
        let result = mem.get(0, 10).expect("read failed");
        assert_eq!(result, &[0, 1, 2, 3, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn copy_overlaps_backward() {
        let mem = create_memory(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        mem.copy(4, 0, 6).expect("copy failed");
        let result = mem.get(0, 10).expect("read failed");
        assert_eq!(result, &[4, 5, 6, 7, 8, 9, 6, 7, 8, 9]);
    }

    #[test]
    fn transfer_works() {
        let src = create_memory(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let dst = create_memory(&[10, 11, 12, 13, 14, 15, 16, 17, 18, 19]);

        MemoryInstance::transfer(&src, 4, &dst, 0, 3).unwrap();

        assert_eq!(src.get(0, 10).unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(
            dst.get(0, 10).unwrap(),
            &[4, 5, 6, 13, 14, 15, 16, 17, 18, 19]
        );
    }

    #[test]
    fn transfer_oob_does_not_modify() {
        let src = create_memory(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let dst = create_memory(&[10, 11, 12, 13, 14, 15, 16, 17, 18, 19]);

        assert!(MemoryInstance::transfer(&src, 65535, &dst, 0, 3).is_err());

        assert_eq!(src.get(0, 10).unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(
            dst.get(0, 10).unwrap(),
            &[10, 11, 12, 13, 14, 15, 16, 17, 18, 19]
        );
    }

    #[test]
    fn clear_fills() {
        let mem = create_memory(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        mem.clear(0, 0x4A, 10).expect("clear failed");
        let result = mem.get(0, 10).expect("read failed");
        assert_eq!(result, &[0x4A; 10]);
    }

    #[test]
    fn get_into() {
        let mem = alloc(1, None).unwrap();
        mem.set(6, &[13, 17, 129]).expect("set failed");

        let mut data = [0u8; 2];
        mem.get_into(7, &mut data[..]).expect("get_into failed");

        assert_eq!(data, [17, 129]);
    }

    #[test]
    fn grow_returns_previous_size() {
        let mem = alloc(1, Some(3)).unwrap();
        assert_eq!(mem.grow(Pages(1)).unwrap(), Pages(1));
        assert_eq!(mem.current_size(), Pages(2));
        assert_eq!(mem.grow(Pages(1)).unwrap(), Pages(2));
        assert!(mem.grow(Pages(1)).is_err());
        assert_eq!(mem.current_size(), Pages(3));
    }

    #[test]
    fn grow_makes_new_pages_addressable() {
        let mem = alloc(1, None).unwrap();
        assert!(mem.get_value::<u32>(65536).is_err());
        mem.grow(Pages(1)).unwrap();
        assert_eq!(mem.get_value::<u32>(65536).unwrap(), 0);
        mem.set_value::<u32>(65536, 0xDEAD_BEEF).unwrap();
        assert_eq!(mem.get_value::<u32>(65536).unwrap(), 0xDEAD_BEEF);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn atomic_rmw_and_cmpxchg() {
        let mem = alloc(1, None).unwrap();
        mem.set_value::<u32>(16, 5).unwrap();
        let old = mem
            .atomic_rmw(16, 4, 7, |a, b| a.wrapping_add(b))
            .unwrap();
        assert_eq!(old, 5);
        assert_eq!(mem.get_value::<u32>(16).unwrap(), 12);

        let old = mem.atomic_cmpxchg(16, 4, 12, 100).unwrap();
        assert_eq!(old, 12);
        assert_eq!(mem.get_value::<u32>(16).unwrap(), 100);

        let old = mem.atomic_cmpxchg(16, 4, 12, 200).unwrap();
        assert_eq!(old, 100);
        assert_eq!(mem.get_value::<u32>(16).unwrap(), 100);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn wait_observes_mismatch_and_timeout() {
        use super::WaitOutcome;
        use core::time::Duration;

        let mem = alloc(1, None).unwrap();
        mem.set_value::<u32>(0, 42).unwrap();
        let outcome = mem
            .atomic_wait(0, 4, 7, 1_000_000, Duration::from_millis(1), || false)
            .unwrap();
        assert!(matches!(outcome, WaitOutcome::NotEqual));

        let outcome = mem
            .atomic_wait(0, 4, 42, 1_000_000, Duration::from_millis(1), || false)
            .unwrap();
        assert!(matches!(outcome, WaitOutcome::TimedOut));
    }

    #[cfg(feature = "threads")]
    #[test]
    fn notify_with_no_waiters_returns_zero() {
        let mem = alloc(1, None).unwrap();
        assert_eq!(mem.atomic_notify(0, 5), 0);
    }
}
