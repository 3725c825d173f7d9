//! Grey types, tagged grey values and typed sample buffers.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WlzError};

/// Numeric encodings a sample can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GreyType {
    UByte,
    Short,
    Int,
    Float,
    Double,
    Rgba,
    /// Bit-plane data. Recognised as a tag but never stored in a value table.
    Bit,
}

impl GreyType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UByte => "ubyte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Rgba => "rgba",
            Self::Bit => "bit",
        }
    }

    /// Whether samples of this type can be held by a value table.
    #[must_use]
    pub const fn is_storable(self) -> bool {
        !matches!(self, Self::Bit)
    }

    fn require_storable(self) -> Result<Self> {
        if self.is_storable() {
            Ok(self)
        } else {
            Err(WlzError::InvalidGreyType(self.name()))
        }
    }
}

/// A single sample value tagged with its grey type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GreyValue {
    UByte(u8),
    Short(i16),
    Int(i32),
    Float(f32),
    Double(f64),
    /// Packed as `r | g << 8 | b << 16 | a << 24`.
    Rgba(u32),
    Bit(u8),
}

impl Default for GreyValue {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl GreyValue {
    #[must_use]
    pub const fn grey_type(self) -> GreyType {
        match self {
            Self::UByte(_) => GreyType::UByte,
            Self::Short(_) => GreyType::Short,
            Self::Int(_) => GreyType::Int,
            Self::Float(_) => GreyType::Float,
            Self::Double(_) => GreyType::Double,
            Self::Rgba(_) => GreyType::Rgba,
            Self::Bit(_) => GreyType::Bit,
        }
    }

    /// The zero value of a grey type (opaque black for RGBA).
    #[must_use]
    pub const fn zero(grey_type: GreyType) -> Self {
        match grey_type {
            GreyType::UByte => Self::UByte(0),
            GreyType::Short => Self::Short(0),
            GreyType::Int => Self::Int(0),
            GreyType::Float => Self::Float(0.0),
            GreyType::Double => Self::Double(0.0),
            GreyType::Rgba => Self::Rgba(rgba_pack(0, 0, 0, 255)),
            GreyType::Bit => Self::Bit(0),
        }
    }

    /// Scalar reading of the value; RGBA reads as the mean of its colour channels.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::UByte(v) | Self::Bit(v) => f64::from(v),
            Self::Short(v) => f64::from(v),
            Self::Int(v) => f64::from(v),
            Self::Float(v) => f64::from(v),
            Self::Double(v) => v,
            Self::Rgba(v) => {
                let [r, g, b, _] = rgba_channels(v);
                (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0
            }
        }
    }

    /// Convert to `target`, rounding and clamping into integer ranges.
    ///
    /// # Errors
    /// `InvalidGreyType` if either side is [`GreyType::Bit`].
    pub fn convert(self, target: GreyType) -> Result<Self> {
        self.grey_type().require_storable()?;
        target.require_storable()?;
        if self.grey_type() == target {
            return Ok(self);
        }
        if let Self::Rgba(_) = self {
            return Self::Double(self.to_f64()).convert(target);
        }

        let v = self.to_f64();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let converted = match target {
            GreyType::UByte => Self::UByte(v.round() as u8),
            GreyType::Short => Self::Short(v.round() as i16),
            GreyType::Int => Self::Int(v.round() as i32),
            GreyType::Float => Self::Float(v as f32),
            GreyType::Double => Self::Double(v),
            GreyType::Rgba => {
                let c = v.round().clamp(0.0, 255.0) as u8;
                Self::Rgba(rgba_pack(c, c, c, 255))
            }
            GreyType::Bit => unreachable!("rejected by require_storable"),
        };
        Ok(converted)
    }
}

/// Pixel conversion used wherever a value must match a table's encoding.
///
/// # Errors
/// `InvalidGreyType` if either side is [`GreyType::Bit`].
pub fn convert_pixel(value: GreyValue, target: GreyType) -> Result<GreyValue> {
    value.convert(target)
}

#[must_use]
pub const fn rgba_pack(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

#[must_use]
pub const fn rgba_channels(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

/// Contiguous run of samples of one grey type.
#[derive(Debug, Clone, PartialEq)]
pub enum GreyBuffer {
    UByte(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Rgba(Vec<u32>),
}

impl GreyBuffer {
    /// Allocate `len` samples of `fill`'s grey type, each set to `fill`.
    ///
    /// # Errors
    /// `InvalidGreyType` for bit values, `AllocationError` on allocation failure.
    pub fn filled(fill: GreyValue, len: usize) -> Result<Self> {
        Ok(match fill {
            GreyValue::UByte(v) => Self::UByte(filled_vec(v, len)?),
            GreyValue::Short(v) => Self::Short(filled_vec(v, len)?),
            GreyValue::Int(v) => Self::Int(filled_vec(v, len)?),
            GreyValue::Float(v) => Self::Float(filled_vec(v, len)?),
            GreyValue::Double(v) => Self::Double(filled_vec(v, len)?),
            GreyValue::Rgba(v) => Self::Rgba(filled_vec(v, len)?),
            GreyValue::Bit(_) => return Err(WlzError::InvalidGreyType(GreyType::Bit.name())),
        })
    }

    #[must_use]
    pub fn grey_type(&self) -> GreyType {
        match self {
            Self::UByte(_) => GreyType::UByte,
            Self::Short(_) => GreyType::Short,
            Self::Int(_) => GreyType::Int,
            Self::Float(_) => GreyType::Float,
            Self::Double(_) => GreyType::Double,
            Self::Rgba(_) => GreyType::Rgba,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::UByte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Rgba(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<GreyValue> {
        match self {
            Self::UByte(v) => v.get(index).copied().map(GreyValue::UByte),
            Self::Short(v) => v.get(index).copied().map(GreyValue::Short),
            Self::Int(v) => v.get(index).copied().map(GreyValue::Int),
            Self::Float(v) => v.get(index).copied().map(GreyValue::Float),
            Self::Double(v) => v.get(index).copied().map(GreyValue::Double),
            Self::Rgba(v) => v.get(index).copied().map(GreyValue::Rgba),
        }
    }

    /// Store `value` (converted to the buffer's type) at `index`.
    /// Returns `false` if `index` is out of range.
    ///
    /// # Errors
    /// `InvalidGreyType` if `value` cannot be converted.
    pub fn set(&mut self, index: usize, value: GreyValue) -> Result<bool> {
        if index >= self.len() {
            return Ok(false);
        }
        let value = value.convert(self.grey_type())?;
        match (self, value) {
            (Self::UByte(b), GreyValue::UByte(v)) => b[index] = v,
            (Self::Short(b), GreyValue::Short(v)) => b[index] = v,
            (Self::Int(b), GreyValue::Int(v)) => b[index] = v,
            (Self::Float(b), GreyValue::Float(v)) => b[index] = v,
            (Self::Double(b), GreyValue::Double(v)) => b[index] = v,
            (Self::Rgba(b), GreyValue::Rgba(v)) => b[index] = v,
            _ => unreachable!("value converted to buffer type"),
        }
        Ok(true)
    }

    /// Set every sample to `value`, converted to the buffer's type.
    ///
    /// # Errors
    /// `InvalidGreyType` if `value` cannot be converted.
    pub fn fill(&mut self, value: GreyValue) -> Result<()> {
        let value = value.convert(self.grey_type())?;
        match (self, value) {
            (Self::UByte(b), GreyValue::UByte(v)) => b.fill(v),
            (Self::Short(b), GreyValue::Short(v)) => b.fill(v),
            (Self::Int(b), GreyValue::Int(v)) => b.fill(v),
            (Self::Float(b), GreyValue::Float(v)) => b.fill(v),
            (Self::Double(b), GreyValue::Double(v)) => b.fill(v),
            (Self::Rgba(b), GreyValue::Rgba(v)) => b.fill(v),
            _ => unreachable!("value converted to buffer type"),
        }
        Ok(())
    }
}

fn filled_vec<V: Clone>(value: V, len: usize) -> Result<Vec<V>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, value);
    Ok(data)
}
