use crate::codec::{self, PackedView};
use crate::dtype::{DType, DataType, PackedWord};
use crate::error::{Error, Result};
use crate::tensor::{DataLayout, TensorShape};
use rand::Rng;
use rand::distributions::Distribution;

/// Owning backing store of a [`Tensor`].
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    Float32(Vec<f32>),
    PackedFloat16(Vec<PackedWord>),
}

impl TensorData {
    /// Zeroed store for `elements` values.
    pub fn zeroed(data_type: DataType, elements: usize) -> Self {
        let len = data_type.storage_len(elements);
        match data_type {
            DataType::Float32 => TensorData::Float32(vec![0.0; len]),
            DataType::PackedFloat16 => TensorData::PackedFloat16(vec![0; len]),
        }
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        match self {
            TensorData::Float32(_) => DataType::Float32,
            TensorData::PackedFloat16(_) => DataType::PackedFloat16,
        }
    }

    /// Length of the store in words.
    #[inline]
    pub fn storage_len(&self) -> usize {
        match self {
            TensorData::Float32(data) => data.len(),
            TensorData::PackedFloat16(data) => data.len(),
        }
    }
}

/// A named, shaped buffer registered in a [`crate::workspace::Workspace`].
///
/// The store always holds `shape.storage_size()` elements, so padding lanes
/// and alignment columns are addressable but carry no logical data.
#[derive(Clone)]
pub struct Tensor {
    name: String,
    shape: TensorShape,
    data: TensorData,
}

impl Tensor {
    pub fn zeroed<S: Into<String>>(name: S, shape: TensorShape, data_type: DataType) -> Self {
        let data = TensorData::zeroed(data_type, shape.storage_size());
        Tensor {
            name: name.into(),
            shape,
            data,
        }
    }

    /// Wraps `data`, which must cover the full storage size of `shape`.
    pub fn from_vec<S: Into<String>>(name: S, shape: TensorShape, data: Vec<f32>) -> Result<Self> {
        let expected = shape.storage_size();
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Tensor {
            name: name.into(),
            shape,
            data: TensorData::Float32(data),
        })
    }

    pub fn from_packed<S: Into<String>>(name: S, shape: TensorShape, words: Vec<PackedWord>) -> Result<Self> {
        let expected = DataType::PackedFloat16.storage_len(shape.storage_size());
        if words.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: words.len(),
            });
        }
        Ok(Tensor {
            name: name.into(),
            shape,
            data: TensorData::PackedFloat16(words),
        })
    }

    pub fn from_distribution<S, R, D>(name: S, shape: TensorShape, rng: &mut R, dist: D) -> Self
    where
        S: Into<String>,
        R: Rng,
        D: Distribution<f32>,
    {
        let data: Vec<f32> = dist.sample_iter(rng).take(shape.storage_size()).collect();
        Tensor {
            name: name.into(),
            shape,
            data: TensorData::Float32(data),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    #[inline]
    pub fn layout(&self) -> DataLayout {
        self.shape.layout()
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    #[inline]
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Typed access to the store, `None` when `T` does not match it.
    #[inline]
    pub fn as_slice<T: DType>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    #[inline]
    pub fn as_slice_mut<T: DType>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.data)
    }

    pub fn as_f32(&self) -> Result<&[f32]> {
        let actual = self.data_type();
        f32::slice(&self.data).ok_or_else(|| self.mismatch(DataType::Float32, actual))
    }

    pub fn as_f32_mut(&mut self) -> Result<&mut [f32]> {
        let actual = self.data_type();
        match f32::slice_mut(&mut self.data) {
            Some(data) => Ok(data),
            None => Err(Error::DTypeMismatch {
                tensor: self.name.clone(),
                expected: DataType::Float32,
                actual,
            }),
        }
    }

    pub fn as_packed(&self) -> Result<PackedView<'_>> {
        let actual = self.data_type();
        let words = PackedWord::slice(&self.data)
            .ok_or_else(|| self.mismatch(DataType::PackedFloat16, actual))?;
        PackedView::new(words, self.shape.storage_size())
    }

    pub fn as_packed_mut(&mut self) -> Result<&mut [PackedWord]> {
        let actual = self.data_type();
        match PackedWord::slice_mut(&mut self.data) {
            Some(data) => Ok(data),
            None => Err(Error::DTypeMismatch {
                tensor: self.name.clone(),
                expected: DataType::PackedFloat16,
                actual,
            }),
        }
    }

    /// Full precision copy of the whole store, unpacking if needed.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match &self.data {
            TensorData::Float32(data) => data.clone(),
            TensorData::PackedFloat16(words) => {
                let view = PackedView::new(words, self.shape.storage_size())
                    .unwrap_or_else(|err| panic!("Corrupt packed store in '{}': {err}", self.name));
                codec::unpack(view).into_vec()
            }
        }
    }

    /// Same tensor re-encoded as `data_type`.
    pub fn converted(&self, data_type: DataType) -> Tensor {
        let data = match (data_type, &self.data) {
            (DataType::Float32, TensorData::Float32(_)) | (DataType::PackedFloat16, TensorData::PackedFloat16(_)) => {
                self.data.clone()
            }
            (DataType::Float32, TensorData::PackedFloat16(_)) => TensorData::Float32(self.to_f32_vec()),
            (DataType::PackedFloat16, TensorData::Float32(data)) => {
                TensorData::PackedFloat16(codec::pack_owned(data).into_words())
            }
        };
        Tensor {
            name: self.name.clone(),
            shape: self.shape.clone(),
            data,
        }
    }

    fn mismatch(&self, expected: DataType, actual: DataType) -> Error {
        Error::DTypeMismatch {
            tensor: self.name.clone(),
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::StandardNormal;

    #[test]
    fn test_zeroed_sizes() {
        let shape = TensorShape::new([1, 4, 4, 3], DataLayout::BlockedNHWC);
        let t = Tensor::zeroed("a", shape.clone(), DataType::Float32);
        assert_eq!(t.as_f32().unwrap().len(), 128);
        let p = Tensor::zeroed("p", shape, DataType::PackedFloat16);
        assert_eq!(p.as_packed().unwrap().words().len(), 64);
        assert_eq!(p.as_packed().unwrap().len(), 128);
    }

    #[test]
    fn test_from_vec_checks_size() {
        let shape = TensorShape::new([2, 3], DataLayout::NC).with_alignment(4);
        assert!(Tensor::from_vec("x", shape.clone(), vec![0.0; 6]).is_err());
        assert!(Tensor::from_vec("x", shape, vec![0.0; 8]).is_ok());
    }

    #[test]
    fn test_dtype_mismatch() {
        let mut t = Tensor::zeroed("t", TensorShape::new([4], DataLayout::X), DataType::PackedFloat16);
        assert!(matches!(t.as_f32(), Err(Error::DTypeMismatch { .. })));
        assert!(t.as_f32_mut().is_err());
        assert!(t.as_packed_mut().is_ok());
        assert!(t.as_slice::<f32>().is_none());
    }

    #[test]
    fn test_conversion() {
        let shape = TensorShape::new([5], DataLayout::X);
        let t = Tensor::from_vec("t", shape, vec![0.5, -1.0, 2.0, 0.0, 8.0]).unwrap();
        let packed = t.converted(DataType::PackedFloat16);
        assert_eq!(packed.data_type(), DataType::PackedFloat16);
        assert_eq!(packed.to_f32_vec(), vec![0.5, -1.0, 2.0, 0.0, 8.0]);
        let back = packed.converted(DataType::Float32);
        assert_eq!(back.as_f32().unwrap(), t.as_f32().unwrap());
    }

    #[test]
    fn test_from_distribution() {
        let mut rng = StdRng::seed_from_u64(0x1234);
        let shape = TensorShape::new([1, 2, 3, 3], DataLayout::NCHW);
        let t = Tensor::from_distribution("r", shape, &mut rng, StandardNormal);
        assert_eq!(t.as_f32().unwrap().len(), 18);
        assert!(t.as_f32().unwrap().iter().all(|v| v.is_finite()));
    }
}
