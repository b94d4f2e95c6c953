//! Dense real-valued image buffers.
//!
//! [`Image`] stores one `f64` per pixel and [`MultiImage`] stores `channels`
//! values per pixel, interleaved. Both are row-major and addressed by
//! `(x, y)`. Zero-sized buffers are valid and represent the empty result of
//! a correlation whose filter does not fit inside the image.
//!
//! Channel extraction always returns a detached copy; there are no borrowed
//! channel views that could alias the parent buffer.

use crate::util::{SlideDetError, SlideDetResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;
pub mod resize;
pub mod table;

fn checked_len(width: usize, height: usize, channels: usize) -> SlideDetResult<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or(SlideDetError::InvalidDimensions { width, height })
}

/// Owned single-channel image.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawImage", into = "RawImage"))]
pub struct Image {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl Image {
    /// Creates a zero-filled image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Returns the 0x0 image.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a row-major buffer of exactly `width * height` values.
    pub fn from_vec(data: Vec<f64>, width: usize, height: usize) -> SlideDetResult<Self> {
        let needed = checked_len(width, height, 1)?;
        if data.len() != needed {
            return Err(SlideDetError::BufferLength {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Value at `(x, y)`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f64 {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.width + x]
    }

    /// Value at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.width + x] = value;
    }

    /// Row `y` as a contiguous slice.
    pub fn row(&self, y: usize) -> &[f64] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Adds `value` to every pixel.
    pub fn add_scalar(&mut self, value: f64) {
        for v in &mut self.data {
            *v += value;
        }
    }
}

/// Owned multi-channel image with interleaved channels.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawImage", into = "RawImage"))]
pub struct MultiImage {
    data: Vec<f64>,
    width: usize,
    height: usize,
    channels: usize,
}

impl MultiImage {
    /// Creates a zero-filled image.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            data: vec![0.0; width * height * channels],
            width,
            height,
            channels,
        }
    }

    /// Wraps an interleaved buffer of exactly `width * height * channels` values.
    pub fn from_vec(
        data: Vec<f64>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> SlideDetResult<Self> {
        let needed = checked_len(width, height, channels)?;
        if data.len() != needed {
            return Err(SlideDetError::BufferLength {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub(crate) fn from_raw(data: Vec<f64>, width: usize, height: usize, channels: usize) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Reinterprets a single-channel image as an [`Image`].
    pub(crate) fn into_image(self) -> Image {
        debug_assert_eq!(self.channels, 1);
        Image {
            data: self.data,
            width: self.width,
            height: self.height,
        }
    }

    /// Stacks equally sized single-channel images.
    pub fn from_channels(planes: &[Image]) -> SlideDetResult<Self> {
        let first = planes
            .first()
            .ok_or(SlideDetError::InvalidInput("at least one channel is required"))?;
        let (width, height) = first.size();
        let mut out = Self::new(width, height, planes.len());
        for (k, plane) in planes.iter().enumerate() {
            out.set_channel(k, plane)?;
        }
        Ok(out)
    }

    /// Builds an image by evaluating `f(x, y, k)` for every element.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> f64,
    ) -> Self {
        let mut data = Vec::with_capacity(width * height * channels);
        for y in 0..height {
            for x in 0..width {
                for k in 0..channels {
                    data.push(f(x, y, k));
                }
            }
        }
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.channels == 0
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.channels
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize, k: usize) -> f64 {
        debug_assert!(x < self.width && y < self.height && k < self.channels);
        self.data[self.offset(x, y) + k]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, k: usize, value: f64) {
        debug_assert!(x < self.width && y < self.height && k < self.channels);
        let idx = self.offset(x, y) + k;
        self.data[idx] = value;
    }

    /// All channel values of one pixel.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f64] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [f64] {
        let start = self.offset(x, y);
        let channels = self.channels;
        &mut self.data[start..start + channels]
    }

    /// Copies channel `k` out into a new image.
    pub fn channel(&self, k: usize) -> SlideDetResult<Image> {
        if k >= self.channels {
            return Err(SlideDetError::IndexOutOfBounds {
                index: k,
                len: self.channels,
                context: "channel",
            });
        }
        Ok(self.channel_unchecked(k))
    }

    pub(crate) fn channel_unchecked(&self, k: usize) -> Image {
        Image::from_fn(self.width, self.height, |x, y| self.at(x, y, k))
    }

    /// Overwrites channel `k` with the contents of `plane`.
    pub fn set_channel(&mut self, k: usize, plane: &Image) -> SlideDetResult<()> {
        if k >= self.channels {
            return Err(SlideDetError::IndexOutOfBounds {
                index: k,
                len: self.channels,
                context: "channel",
            });
        }
        if plane.size() != self.size() {
            return Err(SlideDetError::InvalidDimensions {
                width: plane.width(),
                height: plane.height(),
            });
        }
        for y in 0..self.height {
            for x in 0..self.width {
                self.set(x, y, k, plane.at(x, y));
            }
        }
        Ok(())
    }

    /// Sum over channels of the squared values, per pixel.
    pub fn sum_squares(&self) -> Image {
        Image::from_fn(self.width, self.height, |x, y| {
            self.pixel(x, y).iter().map(|v| v * v).sum()
        })
    }
}

impl From<Image> for MultiImage {
    fn from(image: Image) -> Self {
        let Image {
            data,
            width,
            height,
        } = image;
        Self {
            data,
            width,
            height,
            channels: 1,
        }
    }
}

/// Serialized form of both buffer types. The buffer length is checked on
/// the way in; `channels` defaults to one.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawImage {
    width: usize,
    height: usize,
    #[serde(default = "one")]
    channels: usize,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
fn one() -> usize {
    1
}

#[cfg(feature = "serde")]
impl TryFrom<RawImage> for Image {
    type Error = SlideDetError;

    fn try_from(raw: RawImage) -> SlideDetResult<Self> {
        if raw.channels != 1 {
            return Err(SlideDetError::ChannelMismatch {
                image: raw.channels,
                filter: 1,
            });
        }
        Image::from_vec(raw.data, raw.width, raw.height)
    }
}

#[cfg(feature = "serde")]
impl From<Image> for RawImage {
    fn from(image: Image) -> Self {
        Self {
            width: image.width,
            height: image.height,
            channels: 1,
            data: image.data,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawImage> for MultiImage {
    type Error = SlideDetError;

    fn try_from(raw: RawImage) -> SlideDetResult<Self> {
        MultiImage::from_vec(raw.data, raw.width, raw.height, raw.channels)
    }
}

#[cfg(feature = "serde")]
impl From<MultiImage> for RawImage {
    fn from(image: MultiImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            channels: image.channels,
            data: image.data,
        }
    }
}
