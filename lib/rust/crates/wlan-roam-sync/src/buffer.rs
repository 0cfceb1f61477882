// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::error::Error,
    std::{
        fmt,
        ops::Deref,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    },
};

struct Budget {
    capacity: usize,
    in_use: AtomicUsize,
}

impl Budget {
    fn reserve(&self, len: usize) -> bool {
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |in_use| {
                in_use.checked_add(len).filter(|total| *total <= self.capacity)
            })
            .is_ok()
    }

    fn release(&self, len: usize) {
        self.in_use.fetch_sub(len, Ordering::AcqRel);
    }
}

/// Hands out IE buffers against a fixed byte budget. Cloning the provider shares the budget.
#[derive(Clone)]
pub struct BufferProvider {
    budget: Arc<Budget>,
}

impl BufferProvider {
    pub fn new(capacity: usize) -> Self {
        Self { budget: Arc::new(Budget { capacity, in_use: AtomicUsize::new(0) }) }
    }

    /// Copies `bytes` into a newly reserved buffer. Empty input never touches the budget.
    pub fn copy_from(&self, bytes: &[u8]) -> Result<IeBuf, Error> {
        if bytes.is_empty() {
            return Ok(IeBuf::empty());
        }
        if !self.budget.reserve(bytes.len()) {
            return Err(Error::NoResources(bytes.len()));
        }
        Ok(IeBuf { bytes: bytes.to_vec(), budget: Some(Arc::clone(&self.budget)) })
    }

    pub fn in_use(&self) -> usize {
        self.budget.in_use.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.budget.capacity
    }
}

impl fmt::Debug for BufferProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferProvider")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use())
            .finish()
    }
}

/// An IE blob owned by a connect response. Returns its bytes to the provider when dropped.
pub struct IeBuf {
    bytes: Vec<u8>,
    budget: Option<Arc<Budget>>,
}

impl IeBuf {
    pub fn empty() -> Self {
        Self { bytes: Vec::new(), budget: None }
    }

    /// True if this buffer holds a reservation against a provider.
    pub fn is_allocated(&self) -> bool {
        self.budget.is_some()
    }
}

impl Deref for IeBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl PartialEq for IeBuf {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl fmt::Debug for IeBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IeBuf({} bytes)", self.bytes.len())
    }
}

impl Drop for IeBuf {
    fn drop(&mut self) {
        if let Some(budget) = self.budget.take() {
            budget.release(self.bytes.len());
        }
    }
}
