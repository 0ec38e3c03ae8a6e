//! Conversion between `f32` and packed IEEE binary16 storage.
//!
//! Two half-precision values share one [`PackedWord`]; element `2k` sits in
//! the low 16 bits of word `k` and element `2k + 1` in the high 16 bits. An
//! odd element count leaves the high half of the final word zeroed.
//!
//! Packing is lossy. For normal values the relative error of a round trip is
//! at most [`F16_RELATIVE_ERROR`]; magnitudes above [`F16_MAX`] saturate to
//! infinity and zero (of either sign) survives exactly.

use crate::dtype::{DataType, PackedWord};
use crate::error::{Error, Result};
use half::f16;
use std::iter::zip;
use std::ops::{Deref, DerefMut};

/// Round-trip relative error bound for normal binary16 values (2^-11).
pub const F16_RELATIVE_ERROR: f32 = 1.0 / 2048.0;
/// Largest finite binary16 value.
pub const F16_MAX: f32 = 65504.0;

enum Holder<'a, T: 'a> {
    Borrowed(&'a mut [T]),
    Owned(Vec<T>),
}

impl<'a, T> Holder<'a, T> {
    fn is_owned(&self) -> bool {
        use Holder::*;
        match self {
            Borrowed(_) => false,
            Owned(_) => true,
        }
    }
}

impl<'a, T> Deref for Holder<'a, T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &Self::Target {
        use Holder::*;
        match self {
            Borrowed(data) => data,
            Owned(data) => data.as_slice(),
        }
    }
}

impl<'a, T> DerefMut for Holder<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        use Holder::*;
        match self {
            Borrowed(data) => data,
            Owned(data) => data.as_mut_slice(),
        }
    }
}

/// Full precision result of [`unpack`] or [`unpack_into`].
///
/// Either owns a freshly allocated buffer or borrows caller storage; dropping
/// a borrowed array leaves the caller's buffer untouched.
pub struct FloatArray<'a> {
    data: Holder<'a, f32>,
}

impl<'a> FloatArray<'a> {
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.data.is_owned()
    }

    pub fn into_vec(self) -> Vec<f32> {
        match self.data {
            Holder::Borrowed(data) => data.to_vec(),
            Holder::Owned(data) => data,
        }
    }
}

impl<'a> Deref for FloatArray<'a> {
    type Target = [f32];
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<'a> DerefMut for FloatArray<'a> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

/// Non-owning description of packed input: a word buffer and element count.
#[derive(Copy, Clone, Debug)]
pub struct PackedView<'a> {
    words: &'a [PackedWord],
    len: usize,
}

impl<'a> PackedView<'a> {
    pub fn new(words: &'a [PackedWord], len: usize) -> Result<Self> {
        check_words(words.len(), len)?;
        Ok(PackedView { words, len })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn words(&self) -> &'a [PackedWord] {
        self.words
    }

    /// Decodes a single element.
    pub fn get(&self, index: usize) -> Option<f32> {
        if index >= self.len {
            return None;
        }
        let (lo, hi) = unpack_pair(self.words[index / 2]);
        Some(if index % 2 == 0 { lo } else { hi })
    }
}

/// Packed destination written by [`pack`]. Borrows the caller's words.
#[derive(Debug)]
pub struct PackedViewMut<'a> {
    words: &'a mut [PackedWord],
    len: usize,
}

impl<'a> PackedViewMut<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_view(&self) -> PackedView<'_> {
        PackedView {
            words: self.words,
            len: self.len,
        }
    }
}

/// Packed values in an owned word buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedArray {
    words: Vec<PackedWord>,
    len: usize,
}

impl PackedArray {
    #[inline]
    pub fn view(&self) -> PackedView<'_> {
        PackedView {
            words: &self.words,
            len: self.len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn into_words(self) -> Vec<PackedWord> {
        self.words
    }
}

fn check_words(words: usize, len: usize) -> Result<()> {
    let expected = DataType::PackedFloat16.storage_len(len);
    if words != expected {
        return Err(Error::BufferSizeMismatch {
            expected,
            actual: words,
        });
    }
    Ok(())
}

#[inline]
pub fn pack_pair(lo: f32, hi: f32) -> PackedWord {
    let lo = f16::from_f32(lo).to_bits() as PackedWord;
    let hi = f16::from_f32(hi).to_bits() as PackedWord;
    lo | (hi << 16)
}

#[inline]
pub fn unpack_pair(word: PackedWord) -> (f32, f32) {
    let lo = f16::from_bits((word & 0xFFFF) as u16);
    let hi = f16::from_bits((word >> 16) as u16);
    (lo.to_f32(), hi.to_f32())
}

/// Unpacks into a newly allocated buffer of exactly `src.len()` elements.
pub fn unpack(src: PackedView) -> FloatArray<'static> {
    let mut data = vec![0.0; src.len()];
    decode(src, &mut data);
    FloatArray {
        data: Holder::Owned(data),
    }
}

/// Unpacks into caller storage, which must hold exactly `src.len()` elements.
pub fn unpack_into<'a>(src: PackedView, dst: &'a mut [f32]) -> Result<FloatArray<'a>> {
    if dst.len() != src.len() {
        return Err(Error::BufferSizeMismatch {
            expected: src.len(),
            actual: dst.len(),
        });
    }
    decode(src, dst);
    Ok(FloatArray {
        data: Holder::Borrowed(dst),
    })
}

fn decode(src: PackedView, dst: &mut [f32]) {
    debug_assert_eq!(src.len(), dst.len());
    for (pair, &word) in zip(dst.chunks_mut(2), src.words) {
        let (lo, hi) = unpack_pair(word);
        pair[0] = lo;
        if let Some(second) = pair.get_mut(1) {
            *second = hi;
        }
    }
}

/// Packs `src` into `dst`, which must hold exactly `ceil(src.len() / 2)` words.
pub fn pack<'a>(src: &[f32], dst: &'a mut [PackedWord]) -> Result<PackedViewMut<'a>> {
    check_words(dst.len(), src.len())?;
    for (word, pair) in zip(dst.iter_mut(), src.chunks(2)) {
        *word = pack_pair(pair[0], pair.get(1).copied().unwrap_or(0.0));
    }
    Ok(PackedViewMut {
        words: dst,
        len: src.len(),
    })
}

pub fn pack_owned(src: &[f32]) -> PackedArray {
    let words = src
        .chunks(2)
        .map(|pair| pack_pair(pair[0], pair.get(1).copied().unwrap_or(0.0)))
        .collect();
    PackedArray {
        words,
        len: src.len(),
    }
}
