// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::mem::size_of,
    zerocopy::{ByteSlice, FromBytes, Ref, Unaligned},
};

/// Reads unaligned, fixed-layout structures from the front of a byte slice. Every read checks
/// the remaining length first and leaves the reader untouched when there are not enough bytes.
pub struct BufferReader<B> {
    buffer: Option<B>,
    bytes_read: usize,
}

impl<B: ByteSlice> BufferReader<B> {
    pub fn new(bytes: B) -> Self {
        BufferReader { buffer: Some(bytes), bytes_read: 0 }
    }

    pub fn peek<T: FromBytes + Unaligned>(&self) -> Option<&T> {
        let bytes = &self.buffer.as_ref()?[..];
        Ref::<&[u8], T>::new_unaligned_from_prefix(bytes).map(|(r, _)| r.into_ref())
    }

    pub fn read<T: FromBytes + Unaligned>(&mut self) -> Option<Ref<B, T>> {
        let bytes = self.read_bytes(size_of::<T>())?;
        Ref::new_unaligned(bytes)
    }

    pub fn read_array<T: FromBytes + Unaligned>(
        &mut self,
        num_elems: usize,
    ) -> Option<Ref<B, [T]>> {
        let len = size_of::<T>().checked_mul(num_elems)?;
        let bytes = self.read_bytes(len)?;
        Ref::new_slice_unaligned(bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<B> {
        let buffer = self.buffer.take()?;
        if buffer.len() < len {
            self.buffer = Some(buffer);
            return None;
        }
        let (head, tail) = buffer.split_at(len);
        self.buffer = Some(tail);
        self.bytes_read += len;
        Some(head)
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.len())
    }
}
