//! Filter banks sharing one spatial shape.

use crate::image::{Image, MultiImage};
use crate::util::{SlideDetError, SlideDetResult};

/// Ordered single-channel filters of identical size.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Image>", into = "Vec<Image>"))]
pub struct Bank {
    filters: Vec<Image>,
}

impl Bank {
    /// Validates that the bank is non-empty and all filters share a size.
    pub fn new(filters: Vec<Image>) -> SlideDetResult<Self> {
        let first = filters
            .first()
            .ok_or(SlideDetError::InvalidInput("filter bank must not be empty"))?;
        if first.is_empty() {
            return Err(SlideDetError::InvalidDimensions {
                width: first.width(),
                height: first.height(),
            });
        }
        let expected = (first.width(), first.height(), 1);
        for (index, filter) in filters.iter().enumerate().skip(1) {
            let got = (filter.width(), filter.height(), 1);
            if got != expected {
                return Err(SlideDetError::BankShapeMismatch {
                    index,
                    expected,
                    got,
                });
            }
        }
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[Image] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Shared `(width, height)` of the filters.
    pub fn size(&self) -> (usize, usize) {
        self.filters[0].size()
    }

    /// Same filters as single-channel entries of a [`MultiBank`].
    pub fn to_multi(&self) -> MultiBank {
        MultiBank {
            filters: self
                .filters
                .iter()
                .cloned()
                .map(MultiImage::from)
                .collect(),
        }
    }
}

/// Ordered multi-channel filters of identical size and channel count.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<MultiImage>", into = "Vec<MultiImage>"))]
pub struct MultiBank {
    filters: Vec<MultiImage>,
}

impl MultiBank {
    /// Validates that the bank is non-empty and all filters share a shape.
    pub fn new(filters: Vec<MultiImage>) -> SlideDetResult<Self> {
        let first = filters
            .first()
            .ok_or(SlideDetError::InvalidInput("filter bank must not be empty"))?;
        if first.is_empty() {
            return Err(SlideDetError::InvalidDimensions {
                width: first.width(),
                height: first.height(),
            });
        }
        let expected = (first.width(), first.height(), first.channels());
        for (index, filter) in filters.iter().enumerate().skip(1) {
            let got = (filter.width(), filter.height(), filter.channels());
            if got != expected {
                return Err(SlideDetError::BankShapeMismatch {
                    index,
                    expected,
                    got,
                });
            }
        }
        Ok(Self { filters })
    }

    /// A bank holding one filter.
    pub fn single(filter: MultiImage) -> SlideDetResult<Self> {
        Self::new(vec![filter])
    }

    pub fn filters(&self) -> &[MultiImage] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn size(&self) -> (usize, usize) {
        self.filters[0].size()
    }

    pub fn channels(&self) -> usize {
        self.filters[0].channels()
    }
}

impl TryFrom<Vec<Image>> for Bank {
    type Error = SlideDetError;

    fn try_from(filters: Vec<Image>) -> SlideDetResult<Self> {
        Self::new(filters)
    }
}

impl From<Bank> for Vec<Image> {
    fn from(bank: Bank) -> Self {
        bank.filters
    }
}

impl TryFrom<Vec<MultiImage>> for MultiBank {
    type Error = SlideDetError;

    fn try_from(filters: Vec<MultiImage>) -> SlideDetResult<Self> {
        Self::new(filters)
    }
}

impl From<MultiBank> for Vec<MultiImage> {
    fn from(bank: MultiBank) -> Self {
        bank.filters
    }
}

#[cfg(test)]
mod tests {
    use super::{Bank, MultiBank};
    use crate::image::{Image, MultiImage};
    use crate::util::SlideDetError;

    #[test]
    fn bank_rejects_mixed_sizes() {
        let err = Bank::new(vec![Image::new(3, 3), Image::new(3, 2)]).unwrap_err();
        assert_eq!(
            err,
            SlideDetError::BankShapeMismatch {
                index: 1,
                expected: (3, 3, 1),
                got: (3, 2, 1),
            }
        );
    }

    #[test]
    fn multi_bank_rejects_mixed_channels() {
        let err = MultiBank::new(vec![MultiImage::new(2, 2, 3), MultiImage::new(2, 2, 2)])
            .unwrap_err();
        assert!(matches!(err, SlideDetError::BankShapeMismatch { index: 1, .. }));
    }

    #[test]
    fn empty_banks_are_rejected() {
        assert!(Bank::new(Vec::new()).is_err());
        assert!(MultiBank::new(Vec::new()).is_err());
        assert!(MultiBank::single(MultiImage::new(0, 2, 1)).is_err());
    }
}
