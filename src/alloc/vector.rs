//! Block-structured extensible array.
//!
//! Elements live in fixed-size blocks carved out of chunk allocations. A chunk is
//! allocated once per [`ExtVector::new`] or [`ExtVector::extend`] call and is never
//! moved or freed until the vector itself is dropped, so a reference obtained for an
//! element stays at the same address across later extensions. Only the block table
//! is ever reallocated.

use crate::error::{Result, WlzError};

/// Elements per block used when a block size of zero is requested.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct BlockRef {
    chunk: usize,
    offset: usize,
}

/// Growable array with per-block address stability.
///
/// All elements up to [`count`](Self::count) are valid and start out as
/// `T::default()`; there is no notion of "written" elements.
#[derive(Debug)]
pub struct ExtVector<T> {
    block_size: usize,
    block_capacity: usize,
    blocks: Vec<BlockRef>,
    chunks: Vec<Box<[T]>>,
}

impl<T: Clone + Default> ExtVector<T> {
    /// Create a vector able to hold at least `initial_count` elements.
    ///
    /// `block_size == 0` selects [`DEFAULT_BLOCK_SIZE`]. The element count is rounded
    /// up to a whole number of blocks.
    ///
    /// # Errors
    /// `InvalidParam` for a zero-sized element type, `AllocationError` if memory
    /// cannot be reserved.
    pub fn new(initial_count: usize, block_size: usize) -> Result<Self> {
        if size_of::<T>() == 0 {
            return Err(WlzError::InvalidParam("element size must be non-zero"));
        }
        let block_size = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size
        };
        let mut vec = Self {
            block_size,
            block_capacity: 0,
            blocks: Vec::new(),
            chunks: Vec::new(),
        };
        vec.extend(initial_count)?;
        Ok(vec)
    }

    /// Grow the vector so that it holds at least `required` elements.
    ///
    /// Does nothing if the vector is already large enough. Existing blocks are
    /// never moved.
    ///
    /// # Errors
    /// `AllocationError` if the block table or the new chunk cannot be allocated.
    /// The vector is left unchanged in that case.
    pub fn extend(&mut self, required: usize) -> Result<()> {
        let needed = required.div_ceil(self.block_size);
        let used = self.blocks.len();
        if needed <= used {
            return Ok(());
        }

        let mut capacity = self.block_capacity;
        if needed > capacity {
            capacity = needed
                .div_ceil(self.block_size)
                .checked_mul(self.block_size)
                .ok_or(WlzError::AllocationError)?;
            self.blocks.try_reserve_exact(capacity - used)?;
        }

        let extra = needed - used;
        let len = extra
            .checked_mul(self.block_size)
            .ok_or(WlzError::AllocationError)?;
        let chunk = default_chunk::<T>(len)?;
        self.chunks.try_reserve(1)?;

        self.block_capacity = capacity;
        let chunk_index = self.chunks.len();
        self.chunks.push(chunk);
        self.blocks.extend((0..extra).map(|b| BlockRef {
            chunk: chunk_index,
            offset: b * self.block_size,
        }));
        Ok(())
    }

    /// Resolve `index` to its element, or `None` beyond the current capacity.
    #[must_use]
    pub fn item_get(&self, index: usize) -> Option<&T> {
        let block = self.blocks.get(index / self.block_size)?;
        self.chunks[block.chunk].get(block.offset + index % self.block_size)
    }

    /// Mutable variant of [`item_get`](Self::item_get).
    pub fn item_get_mut(&mut self, index: usize) -> Option<&mut T> {
        let block = *self.blocks.get(index / self.block_size)?;
        self.chunks[block.chunk].get_mut(block.offset + index % self.block_size)
    }

    /// Extend to cover `index`, then resolve it.
    ///
    /// # Errors
    /// Only fails if the extension fails.
    pub fn extend_and_get(&mut self, index: usize) -> Result<&T> {
        self.reserve_index(index)?;
        self.item_get(index).ok_or(WlzError::AllocationError)
    }

    /// Mutable variant of [`extend_and_get`](Self::extend_and_get).
    ///
    /// # Errors
    /// Only fails if the extension fails.
    pub fn extend_and_get_mut(&mut self, index: usize) -> Result<&mut T> {
        self.reserve_index(index)?;
        self.item_get_mut(index).ok_or(WlzError::AllocationError)
    }

    /// Copy the closed range `first..=last` into one contiguous array.
    ///
    /// # Errors
    /// `InvalidRange` if `last < first` or `last` is beyond [`count`](Self::count),
    /// `AllocationError` if the array cannot be allocated.
    pub fn to_array(&self, first: usize, last: usize) -> Result<Vec<T>> {
        if last < first || last >= self.count() {
            return Err(WlzError::InvalidRange { first, last });
        }
        let mut out = Vec::new();
        out.try_reserve_exact(last - first + 1)?;

        let last_block = last / self.block_size;
        let mut index = first;
        while index <= last {
            let block_index = index / self.block_size;
            let block = self.blocks[block_index];
            let start = index % self.block_size;
            let end = if block_index == last_block {
                last % self.block_size
            } else {
                self.block_size - 1
            };
            let chunk = &self.chunks[block.chunk];
            out.extend_from_slice(&chunk[block.offset + start..=block.offset + end]);
            index += end - start + 1;
        }
        Ok(out)
    }

    /// Iterate over every element up to [`count`](Self::count), in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.blocks.iter().flat_map(move |block| {
            self.chunks[block.chunk][block.offset..block.offset + self.block_size].iter()
        })
    }

    fn reserve_index(&mut self, index: usize) -> Result<()> {
        let required = index.checked_add(1).ok_or(WlzError::AllocationError)?;
        self.extend(required)
    }
}

impl<T> ExtVector<T> {
    /// Number of elements the vector holds before it must be extended.
    #[must_use]
    pub fn count(&self) -> usize {
        self.blocks.len() * self.block_size
    }

    #[must_use]
    pub const fn element_size(&self) -> usize {
        size_of::<T>()
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn blocks_used(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub const fn block_capacity(&self) -> usize {
        self.block_capacity
    }
}

fn default_chunk<T: Clone + Default>(len: usize) -> Result<Box<[T]>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, T::default());
    Ok(data.into_boxed_slice())
}
