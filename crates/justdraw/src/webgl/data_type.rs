//! Numeric element types of buffers and attributes.
//!
//! Host values are `f64`. They are narrowed with the typed-array cast rules
//! a WebGL host applies when building the upload: integers truncate toward
//! zero and wrap modulo 2^bits, clamped bytes round half to even and
//! saturate, floats round to the nearest `f32`.

use bytemuck::Pod;
use justdraw_gl::constants;

/// Element type tag of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    #[default]
    Float32,
}

impl DataType {
    /// Bytes per element.
    pub fn byte_width(self) -> usize {
        match self {
            DataType::Int8 | DataType::Uint8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
        }
    }

    /// Whether `drawElements` accepts this type for indices.
    pub fn is_index_type(self) -> bool {
        matches!(self, DataType::Uint8 | DataType::Uint16 | DataType::Uint32)
    }

    pub fn gl_enum(self) -> u32 {
        match self {
            DataType::Int8 => constants::BYTE,
            DataType::Int16 => constants::SHORT,
            DataType::Int32 => constants::INT,
            DataType::Uint8 => constants::UNSIGNED_BYTE,
            DataType::Uint16 => constants::UNSIGNED_SHORT,
            DataType::Uint32 => constants::UNSIGNED_INT,
            DataType::Float32 => constants::FLOAT,
        }
    }

    pub fn from_gl(value: u32) -> Option<Self> {
        match value {
            constants::BYTE => Some(DataType::Int8),
            constants::SHORT => Some(DataType::Int16),
            constants::INT => Some(DataType::Int32),
            constants::UNSIGNED_BYTE => Some(DataType::Uint8),
            constants::UNSIGNED_SHORT => Some(DataType::Uint16),
            constants::UNSIGNED_INT => Some(DataType::Uint32),
            constants::FLOAT => Some(DataType::Float32),
            _ => None,
        }
    }

    /// Narrow `values` to this type and lay them out in native byte order.
    /// `clamped` only affects `Uint8`.
    pub fn encode(self, values: &[f64], clamped: bool) -> Vec<u8> {
        match self {
            DataType::Uint8 if clamped => values.iter().map(|&v| clamp_u8(v)).collect(),
            DataType::Int8 => narrow(values, |v| wrap(v, 8) as u8 as i8),
            DataType::Uint8 => narrow(values, |v| wrap(v, 8) as u8),
            DataType::Int16 => narrow(values, |v| wrap(v, 16) as u16 as i16),
            DataType::Uint16 => narrow(values, |v| wrap(v, 16) as u16),
            DataType::Int32 => narrow(values, |v| wrap(v, 32) as u32 as i32),
            DataType::Uint32 => narrow(values, |v| wrap(v, 32) as u32),
            DataType::Float32 => narrow(values, |v| v as f32),
        }
    }

    /// Read elements back out of a native byte store. Trailing bytes that
    /// do not fill a whole element are ignored.
    pub fn decode(self, bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(self.byte_width())
            .map(|c| match self {
                DataType::Int8 => c[0] as i8 as f64,
                DataType::Uint8 => c[0] as f64,
                DataType::Int16 => i16::from_ne_bytes([c[0], c[1]]) as f64,
                DataType::Uint16 => u16::from_ne_bytes([c[0], c[1]]) as f64,
                DataType::Int32 => i32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f64,
                DataType::Uint32 => u32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f64,
                DataType::Float32 => f32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f64,
            })
            .collect()
    }
}

/// `Int32Array` conversion of a single value.
pub(crate) fn to_int32(value: f64) -> i32 {
    wrap(value, 32) as u32 as i32
}

fn narrow<T: Pod>(values: &[f64], cast: impl Fn(f64) -> T) -> Vec<u8> {
    let typed: Vec<T> = values.iter().map(|&v| cast(v)).collect();
    bytemuck::cast_slice(&typed).to_vec()
}

/// Integer conversion modulo 2^bits; the result is the unsigned bit pattern.
fn wrap(value: f64, bits: i32) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(2f64.powi(bits)) as u64
}

fn clamp_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}
