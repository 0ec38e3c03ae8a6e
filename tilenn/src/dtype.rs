use crate::tensor::TensorData;
use std::fmt::{Debug, Display, Formatter};

/// Storage word of a packed half-precision buffer. Each word carries two
/// binary16 values, the lower-indexed element in the low 16 bits.
pub type PackedWord = u32;

/// Element encoding of a tensor's backing store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    #[default]
    Float32,
    PackedFloat16,
}

impl DataType {
    #[inline]
    pub const fn elements_per_word(self) -> usize {
        match self {
            DataType::Float32 => 1,
            DataType::PackedFloat16 => 2,
        }
    }

    /// Number of storage words needed to hold `elements` values.
    #[inline]
    pub const fn storage_len(self, elements: usize) -> usize {
        elements.div_ceil(self.elements_per_word())
    }

    #[inline]
    pub const fn size_bytes(self, elements: usize) -> usize {
        self.storage_len(elements) * 4
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Float32 => "f32",
            DataType::PackedFloat16 => "f16x2",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rust element types that can back a [`TensorData`] store.
pub trait DType: 'static + Sized + Copy + Debug {
    const DATA_TYPE: DataType;
    fn slice(data: &TensorData) -> Option<&[Self]>;
    fn slice_mut(data: &mut TensorData) -> Option<&mut [Self]>;
}

macro_rules! impl_dtype {
    ($ty:ty, $variant:ident) => {
        impl DType for $ty {
            const DATA_TYPE: DataType = DataType::$variant;
            #[inline]
            fn slice(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(vec) => Some(vec.as_slice()),
                    _ => None,
                }
            }
            #[inline]
            fn slice_mut(data: &mut TensorData) -> Option<&mut [Self]> {
                match data {
                    TensorData::$variant(vec) => Some(vec.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_dtype!(f32, Float32);
impl_dtype!(PackedWord, PackedFloat16);
