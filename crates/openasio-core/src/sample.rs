//! Sample conversion and format-tagged buffers.
//!
//! Integer conversion is full-scale linear and asymmetric: positive floats
//! scale by `i16::MAX`, negative floats by `-(i16::MIN)`, so `1.0` maps to
//! 32767 and `-1.0` to -32768 exactly. Out-of-range floats clamp; they never
//! wrap. NaN converts to silence.
//!
//! [`Samples`] and [`SamplesMut`] are borrowed, format-tagged views handed to
//! the host callback. [`SampleBuffer`] owns the storage behind them and is only
//! ever allocated on the control thread.

use crate::format::SampleFormat;

/// A sample encoding that can be converted to and from normalized `f32`.
pub trait Sample: Copy + PartialEq + Send + Sync + core::fmt::Debug + 'static {
    /// The ABI format tag.
    const FORMAT: SampleFormat;

    /// Value representing zero amplitude.
    const SILENCE: Self;

    /// Converts a normalized float, clamping to the representable range.
    fn from_f32(value: f32) -> Self;

    /// Converts to a normalized float.
    fn to_f32(self) -> f32;

    /// Borrows `samples` as `&[Self]` when the format matches.
    fn slice(samples: Samples<'_>) -> Option<&[Self]>;

    /// Borrows `samples` as `&mut [Self]` when the format matches.
    fn slice_mut(samples: SamplesMut<'_>) -> Option<&mut [Self]>;
}

const I16_POS_SCALE: f32 = 32767.0;
const I16_NEG_SCALE: f32 = 32768.0;

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32;
    const SILENCE: Self = 0.0;

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    fn slice(samples: Samples<'_>) -> Option<&[Self]> {
        match samples {
            Samples::F32(s) => Some(s),
            _ => None,
        }
    }

    fn slice_mut(samples: SamplesMut<'_>) -> Option<&mut [Self]> {
        match samples {
            SamplesMut::F32(s) => Some(s),
            _ => None,
        }
    }
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::I16;
    const SILENCE: Self = 0;

    #[inline]
    fn from_f32(value: f32) -> Self {
        if value.is_nan() {
            return 0;
        }
        let v = value.clamp(-1.0, 1.0);
        if v >= 0.0 {
            (v * I16_POS_SCALE).round() as i16
        } else {
            (v * I16_NEG_SCALE).round() as i16
        }
    }

    #[inline]
    fn to_f32(self) -> f32 {
        if self >= 0 {
            f32::from(self) / I16_POS_SCALE
        } else {
            f32::from(self) / I16_NEG_SCALE
        }
    }

    fn slice(samples: Samples<'_>) -> Option<&[Self]> {
        match samples {
            Samples::I16(s) => Some(s),
            _ => None,
        }
    }

    fn slice_mut(samples: SamplesMut<'_>) -> Option<&mut [Self]> {
        match samples {
            SamplesMut::I16(s) => Some(s),
            _ => None,
        }
    }
}

impl Sample for u16 {
    const FORMAT: SampleFormat = SampleFormat::U16;
    const SILENCE: Self = 0x8000;

    #[inline]
    fn from_f32(value: f32) -> Self {
        (i32::from(i16::from_f32(value)) + 0x8000) as u16
    }

    #[inline]
    fn to_f32(self) -> f32 {
        ((i32::from(self) - 0x8000) as i16).to_f32()
    }

    fn slice(samples: Samples<'_>) -> Option<&[Self]> {
        match samples {
            Samples::U16(s) => Some(s),
            _ => None,
        }
    }

    fn slice_mut(samples: SamplesMut<'_>) -> Option<&mut [Self]> {
        match samples {
            SamplesMut::U16(s) => Some(s),
            _ => None,
        }
    }
}

/// Borrowed, format-tagged samples.
#[derive(Debug, Clone, Copy)]
pub enum Samples<'a> {
    /// Float samples.
    F32(&'a [f32]),
    /// Signed 16-bit samples.
    I16(&'a [i16]),
    /// Unsigned 16-bit samples.
    U16(&'a [u16]),
}

impl<'a> Samples<'a> {
    /// Format tag.
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::F32(_) => SampleFormat::F32,
            Self::I16(_) => SampleFormat::I16,
            Self::U16(_) => SampleFormat::U16,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(s) => s.len(),
            Self::I16(s) => s.len(),
            Self::U16(s) => s.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample `index` as a normalized float.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get_f32(&self, index: usize) -> f32 {
        match self {
            Self::F32(s) => s[index],
            Self::I16(s) => s[index].to_f32(),
            Self::U16(s) => s[index].to_f32(),
        }
    }

    /// Typed access; `None` when `T` is not this view's format.
    pub fn typed<T: Sample>(self) -> Option<&'a [T]> {
        T::slice(self)
    }

    /// Sub-range of the view.
    pub fn range(self, start: usize, end: usize) -> Samples<'a> {
        match self {
            Self::F32(s) => Samples::F32(&s[start..end]),
            Self::I16(s) => Samples::I16(&s[start..end]),
            Self::U16(s) => Samples::U16(&s[start..end]),
        }
    }
}

/// Mutable, format-tagged samples.
#[derive(Debug)]
pub enum SamplesMut<'a> {
    /// Float samples.
    F32(&'a mut [f32]),
    /// Signed 16-bit samples.
    I16(&'a mut [i16]),
    /// Unsigned 16-bit samples.
    U16(&'a mut [u16]),
}

impl<'a> SamplesMut<'a> {
    /// Format tag.
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::F32(_) => SampleFormat::F32,
            Self::I16(_) => SampleFormat::I16,
            Self::U16(_) => SampleFormat::U16,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(s) => s.len(),
            Self::I16(s) => s.len(),
            Self::U16(s) => s.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shorter-lived reborrow of the same samples.
    pub fn reborrow(&mut self) -> SamplesMut<'_> {
        match self {
            Self::F32(s) => SamplesMut::F32(s),
            Self::I16(s) => SamplesMut::I16(s),
            Self::U16(s) => SamplesMut::U16(s),
        }
    }

    /// Read-only view of the same samples.
    pub fn as_samples(&self) -> Samples<'_> {
        match self {
            Self::F32(s) => Samples::F32(s),
            Self::I16(s) => Samples::I16(s),
            Self::U16(s) => Samples::U16(s),
        }
    }

    /// Writes a normalized float into sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set_f32(&mut self, index: usize, value: f32) {
        match self {
            Self::F32(s) => s[index] = value,
            Self::I16(s) => s[index] = i16::from_f32(value),
            Self::U16(s) => s[index] = u16::from_f32(value),
        }
    }

    /// Overwrites every sample with the format's silence value.
    pub fn fill_silence(&mut self) {
        match self {
            Self::F32(s) => s.fill(f32::SILENCE),
            Self::I16(s) => s.fill(i16::SILENCE),
            Self::U16(s) => s.fill(u16::SILENCE),
        }
    }

    /// Typed access; `None` when `T` is not this view's format.
    pub fn typed<T: Sample>(self) -> Option<&'a mut [T]> {
        T::slice_mut(self)
    }

    /// Sub-range of the view.
    pub fn range(self, start: usize, end: usize) -> SamplesMut<'a> {
        match self {
            Self::F32(s) => SamplesMut::F32(&mut s[start..end]),
            Self::I16(s) => SamplesMut::I16(&mut s[start..end]),
            Self::U16(s) => SamplesMut::U16(&mut s[start..end]),
        }
    }
}

/// Owned, format-tagged sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    /// Float samples.
    F32(Vec<f32>),
    /// Signed 16-bit samples.
    I16(Vec<i16>),
    /// Unsigned 16-bit samples.
    U16(Vec<u16>),
}

impl SampleBuffer {
    /// Allocates `len` samples of silence in `format`.
    pub fn silent(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::F32 => Self::F32(vec![f32::SILENCE; len]),
            SampleFormat::I16 => Self::I16(vec![i16::SILENCE; len]),
            SampleFormat::U16 => Self::U16(vec![u16::SILENCE; len]),
        }
    }

    /// Format tag.
    pub fn format(&self) -> SampleFormat {
        self.as_samples().format()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.as_samples().len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites every sample with silence.
    pub fn fill_silence(&mut self) {
        self.as_samples_mut().fill_silence();
    }

    /// Read-only view.
    pub fn as_samples(&self) -> Samples<'_> {
        match self {
            Self::F32(v) => Samples::F32(v),
            Self::I16(v) => Samples::I16(v),
            Self::U16(v) => Samples::U16(v),
        }
    }

    /// Mutable view.
    pub fn as_samples_mut(&mut self) -> SamplesMut<'_> {
        match self {
            Self::F32(v) => SamplesMut::F32(v),
            Self::I16(v) => SamplesMut::I16(v),
            Self::U16(v) => SamplesMut::U16(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i16_full_scale_endpoints() {
        assert_eq!(i16::from_f32(1.0), i16::MAX);
        assert_eq!(i16::from_f32(-1.0), i16::MIN);
        assert_eq!(i16::from_f32(0.0), 0);
        assert_eq!(i16::MAX.to_f32(), 1.0);
        assert_eq!(i16::MIN.to_f32(), -1.0);
    }

    #[test]
    fn i16_clamps_instead_of_wrapping() {
        assert_eq!(i16::from_f32(1.5), i16::MAX);
        assert_eq!(i16::from_f32(-7.0), i16::MIN);
        assert_eq!(i16::from_f32(f32::INFINITY), i16::MAX);
        assert_eq!(i16::from_f32(f32::NAN), 0);
    }

    #[test]
    fn u16_is_offset_binary() {
        assert_eq!(u16::from_f32(-1.0), 0);
        assert_eq!(u16::from_f32(0.0), 0x8000);
        assert_eq!(u16::from_f32(1.0), u16::MAX);
        assert_eq!(u16::SILENCE.to_f32(), 0.0);
        assert_eq!(u16::from_f32(2.0), u16::MAX);
    }

    #[test]
    fn f32_passes_through_bit_exact() {
        let v = 0.123_456_79_f32;
        assert_eq!(f32::from_f32(v).to_bits(), v.to_bits());
    }

    #[test]
    fn typed_views_check_format() {
        let mut buf = SampleBuffer::silent(SampleFormat::I16, 4);
        assert!(buf.as_samples().typed::<i16>().is_some());
        assert!(buf.as_samples().typed::<f32>().is_none());
        let slice = buf.as_samples_mut().typed::<i16>().unwrap();
        slice[0] = 5;
        assert_eq!(buf.as_samples().get_f32(0), 5.0 / 32767.0);
    }

    #[test]
    fn silence_depends_on_format() {
        let mut buf = SampleBuffer::U16(vec![1, 2, 3]);
        buf.fill_silence();
        assert_eq!(buf, SampleBuffer::U16(vec![0x8000; 3]));
        assert_eq!(SampleBuffer::silent(SampleFormat::F32, 2).len(), 2);
    }

    #[test]
    fn set_f32_converts() {
        let mut buf = SampleBuffer::silent(SampleFormat::I16, 2);
        let mut view = buf.as_samples_mut();
        view.set_f32(1, -1.0);
        assert_eq!(buf, SampleBuffer::I16(vec![0, i16::MIN]));
    }
}
