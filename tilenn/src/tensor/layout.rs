use std::fmt::{Display, Formatter, Write};
use std::ops::BitOr;

/// Channel lane width of the blocked layout.
pub const BLOCK_WIDTH: usize = 8;

/// Memory order of a tensor's elements.
///
/// `BlockedNHWC` keeps the logical dims of `NHWC` but stores channels in
/// groups of [`BLOCK_WIDTH`]: the physical order is `(N, G, H, W, lane)` with
/// `G = ceil(C / BLOCK_WIDTH)`. Lanes past `C` in the last group are padding.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataLayout {
    NCHW,
    NHWC,
    BlockedNHWC,
    NC,
    X,
}

impl DataLayout {
    const ALL: [DataLayout; 5] = [
        DataLayout::NCHW,
        DataLayout::NHWC,
        DataLayout::BlockedNHWC,
        DataLayout::NC,
        DataLayout::X,
    ];

    /// Required rank, or `None` for the rank-agnostic `X` layout.
    pub const fn rank(self) -> Option<usize> {
        match self {
            DataLayout::NCHW | DataLayout::NHWC | DataLayout::BlockedNHWC => Some(4),
            DataLayout::NC => Some(2),
            DataLayout::X => None,
        }
    }

    pub const fn channel_axis(self) -> Option<usize> {
        match self {
            DataLayout::NCHW | DataLayout::NC => Some(1),
            DataLayout::NHWC | DataLayout::BlockedNHWC => Some(3),
            DataLayout::X => None,
        }
    }

    /// Axes of (rows, cols) in the logical dims.
    pub const fn spatial_axes(self) -> Option<(usize, usize)> {
        match self {
            DataLayout::NCHW => Some((2, 3)),
            DataLayout::NHWC | DataLayout::BlockedNHWC => Some((1, 2)),
            DataLayout::NC | DataLayout::X => None,
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DataLayout::NCHW => "NCHW",
            DataLayout::NHWC => "NHWC",
            DataLayout::BlockedNHWC => "NHWC8c",
            DataLayout::NC => "NC",
            DataLayout::X => "X",
        }
    }
}

impl Display for DataLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of layouts an operator accepts or produces.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct DataLayoutSet(u8);

impl DataLayoutSet {
    pub const EMPTY: Self = DataLayoutSet(0);
    pub const ALL: Self = DataLayoutSet(0b1_1111);

    #[inline]
    pub const fn single(layout: DataLayout) -> Self {
        DataLayoutSet(layout.bit())
    }

    #[inline]
    pub const fn with(self, layout: DataLayout) -> Self {
        DataLayoutSet(self.0 | layout.bit())
    }

    #[inline]
    pub const fn without(self, layout: DataLayout) -> Self {
        DataLayoutSet(self.0 & !layout.bit())
    }

    #[inline]
    pub const fn contains(self, layout: DataLayout) -> bool {
        self.0 & layout.bit() != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = DataLayout> {
        DataLayout::ALL.into_iter().filter(move |&l| self.contains(l))
    }
}

impl From<DataLayout> for DataLayoutSet {
    #[inline]
    fn from(value: DataLayout) -> Self {
        DataLayoutSet::single(value)
    }
}

impl BitOr for DataLayoutSet {
    type Output = DataLayoutSet;
    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        DataLayoutSet(self.0 | rhs.0)
    }
}

impl BitOr<DataLayout> for DataLayoutSet {
    type Output = DataLayoutSet;
    #[inline]
    fn bitor(self, rhs: DataLayout) -> Self::Output {
        self.with(rhs)
    }
}

impl Display for DataLayoutSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_char('{')?;
        for (i, layout) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            Display::fmt(&layout, f)?;
        }
        f.write_char('}')
    }
}
