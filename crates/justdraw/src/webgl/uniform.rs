//! Shader uniforms.

use std::fmt;
use std::str::FromStr;

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use justdraw_common::{DrawError, OptionExt, Result};
use justdraw_gl::{GlContext, GlObject};
use tracing::{debug, trace, warn};

use super::data_type::to_int32;
use super::{ProgramId, UniformId};
use crate::Renderer3D;

/// Upload shape of a uniform, fixed when the uniform is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Int,
    /// Float vectors of the given arity, possibly an array of them.
    FloatVec(u8),
    IntVec(u8),
    /// Square float matrix of the given order.
    Matrix(u8),
}

impl UniformType {
    /// Components per element: the vector arity, or the cells of a matrix.
    pub fn components(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 1,
            UniformType::FloatVec(n) | UniformType::IntVec(n) => n as usize,
            UniformType::Matrix(n) => n as usize * n as usize,
        }
    }
}

impl FromStr for UniformType {
    type Err = DrawError;

    /// Parse the suffix of a `uniform*` call: `1f`, `3iv`, `Matrix4fv`, ...
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DrawError::InvalidUniformType(s.to_string());

        if let Some(order) = s.strip_prefix("Matrix").and_then(|rest| rest.strip_suffix("fv")) {
            return match order {
                "2" => Ok(UniformType::Matrix(2)),
                "3" => Ok(UniformType::Matrix(3)),
                "4" => Ok(UniformType::Matrix(4)),
                _ => Err(invalid()),
            };
        }

        let (Some(arity), Some(kind)) = (s.get(..1), s.get(1..)) else {
            return Err(invalid());
        };
        let arity: u8 = match arity {
            "1" => 1,
            "2" => 2,
            "3" => 3,
            "4" => 4,
            _ => return Err(invalid()),
        };
        match (arity, kind) {
            (1, "f") => Ok(UniformType::Float),
            (1, "i") => Ok(UniformType::Int),
            (n, "f" | "fv") => Ok(UniformType::FloatVec(n)),
            (n, "i" | "iv") => Ok(UniformType::IntVec(n)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformType::Float => f.write_str("1f"),
            UniformType::Int => f.write_str("1i"),
            UniformType::FloatVec(n) => write!(f, "{n}fv"),
            UniformType::IntVec(n) => write!(f, "{n}iv"),
            UniformType::Matrix(n) => write!(f, "Matrix{n}fv"),
        }
    }
}

// ==================== ToArray ====================

/// Values that can be pushed into a uniform.
pub trait ToArray {
    /// Every component, matrices in column-major order.
    fn to_array(&self) -> Vec<f64>;

    /// Components for a vector uniform of arity `size`. Fixed-size vectors
    /// drop the components past `size`; sequences pass through unchanged.
    fn to_vector(&self, size: usize) -> Vec<f64> {
        let _ = size;
        self.to_array()
    }
}

impl<T: ToArray + ?Sized> ToArray for &T {
    fn to_array(&self) -> Vec<f64> {
        (**self).to_array()
    }

    fn to_vector(&self, size: usize) -> Vec<f64> {
        (**self).to_vector(size)
    }
}

macro_rules! number_to_array {
    ($($ty:ty),*) => {$(
        impl ToArray for $ty {
            fn to_array(&self) -> Vec<f64> {
                vec![f64::from(*self)]
            }
        }

        impl ToArray for [$ty] {
            fn to_array(&self) -> Vec<f64> {
                self.iter().map(|&v| f64::from(v)).collect()
            }
        }

        impl<const N: usize> ToArray for [$ty; N] {
            fn to_array(&self) -> Vec<f64> {
                self.as_slice().to_array()
            }
        }

        impl ToArray for Vec<$ty> {
            fn to_array(&self) -> Vec<f64> {
                self.as_slice().to_array()
            }
        }
    )*};
}

number_to_array!(f64, f32, i32, u32);

macro_rules! vector_to_array {
    ($($ty:ty),*) => {$(
        impl ToArray for $ty {
            fn to_array(&self) -> Vec<f64> {
                self.to_array().iter().map(|&v| f64::from(v)).collect()
            }

            fn to_vector(&self, size: usize) -> Vec<f64> {
                let mut values = ToArray::to_array(self);
                values.truncate(size);
                values
            }
        }
    )*};
}

vector_to_array!(Vec2, Vec3, Vec4);

macro_rules! matrix_to_array {
    ($($ty:ty),*) => {$(
        impl ToArray for $ty {
            fn to_array(&self) -> Vec<f64> {
                self.to_cols_array().iter().map(|&v| f64::from(v)).collect()
            }
        }
    )*};
}

matrix_to_array!(Mat2, Mat3, Mat4);

// ==================== Uniform ====================

/// A named uniform of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    id: UniformId,
    program: ProgramId,
    name: String,
    type_: UniformType,
    location: Option<GlObject>,
}

impl Uniform {
    pub fn id(&self) -> UniformId {
        self.id
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniform_type(&self) -> UniformType {
        self.type_
    }

    /// `None` when the program has no active uniform of this name; updates
    /// are then dropped, as the native context does for a null location.
    pub fn location(&self) -> Option<GlObject> {
        self.location
    }
}

impl<G: GlContext> Renderer3D<G> {
    pub fn uniform(&self, id: UniformId) -> Result<&Uniform> {
        self.uniforms.get(id.0).ok_or_unknown(UniformId::KIND, id.0)
    }

    /// Register a uniform by name and type string (`"3fv"`, `"Matrix4fv"`,
    /// ...). Unknown types are rejected here, never at update time.
    pub fn add_uniform(
        &mut self,
        program: ProgramId,
        name: impl Into<String>,
        type_: &str,
    ) -> Result<UniformId> {
        let type_ = type_.parse()?;
        self.add_typed_uniform(program, name, type_)
    }

    pub fn add_typed_uniform(
        &mut self,
        program: ProgramId,
        name: impl Into<String>,
        type_: UniformType,
    ) -> Result<UniformId> {
        let name = name.into();
        let handle = self.program(program)?.handle();

        self.bind_program(program, false)?;
        let location = self.gl.get_uniform_location(handle, &name);
        if location.is_none() {
            warn!(program = %program, uniform = %name, "uniform is not active in the program");
        }

        let id = UniformId(self.uniforms.len());
        debug!(uniform = %name, type_ = %type_, "uniform created");
        self.uniforms.push(Uniform {
            id,
            program,
            name,
            type_,
            location,
        });
        self.program_mut(program)?.uniforms.push(id);
        Ok(id)
    }

    /// Bind the uniform's program and upload `value`.
    pub fn update_uniform<T: ToArray + ?Sized>(&mut self, id: UniformId, value: &T) -> Result<()> {
        let uniform = self.uniform(id)?;
        let (program, type_, location) = (uniform.program, uniform.type_, uniform.location);

        let values = match type_ {
            UniformType::FloatVec(n) | UniformType::IntVec(n) => value.to_vector(n as usize),
            _ => value.to_array(),
        };
        check_len(uniform, &values)?;

        self.bind_program(program, false)?;
        let Some(location) = location else {
            return Ok(());
        };

        trace!(uniform = %id, type_ = %type_, len = values.len(), "uniform update");
        match type_ {
            UniformType::Float => self.gl.uniform1f(location, values[0] as f32),
            UniformType::Int => self.gl.uniform1i(location, to_int32(values[0])),
            UniformType::FloatVec(n) => self.gl.uniform_fv(location, n as usize, &to_f32(&values)),
            UniformType::IntVec(n) => {
                let ints: Vec<i32> = values.iter().map(|&v| to_int32(v)).collect();
                self.gl.uniform_iv(location, n as usize, &ints)
            }
            UniformType::Matrix(n) => {
                self.gl
                    .uniform_matrix_fv(location, n as usize, false, &to_f32(&values))
            }
        }
        Ok(())
    }
}

fn check_len(uniform: &Uniform, values: &[f64]) -> Result<()> {
    let components = uniform.type_.components();
    if values.is_empty() {
        return Err(DrawError::uniform_value(&uniform.name, "no values"));
    }
    match uniform.type_ {
        UniformType::Float | UniformType::Int if values.len() != 1 => Err(DrawError::uniform_value(
            &uniform.name,
            format!("expected a single value, got {}", values.len()),
        )),
        _ if values.len() % components != 0 => Err(DrawError::uniform_value(
            &uniform.name,
            format!(
                "{} values do not fill whole {} elements",
                values.len(),
                uniform.type_
            ),
        )),
        _ => Ok(()),
    }
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webgl::program::tests::{program, renderer};
    use justdraw_gl::UniformValue;

    #[test]
    fn test_parse_types() {
        let cases = [
            ("1f", UniformType::Float),
            ("1i", UniformType::Int),
            ("1fv", UniformType::FloatVec(1)),
            ("1iv", UniformType::IntVec(1)),
            ("2f", UniformType::FloatVec(2)),
            ("3fv", UniformType::FloatVec(3)),
            ("4i", UniformType::IntVec(4)),
            ("2iv", UniformType::IntVec(2)),
            ("Matrix2fv", UniformType::Matrix(2)),
            ("Matrix3fv", UniformType::Matrix(3)),
            ("Matrix4fv", UniformType::Matrix(4)),
        ];
        for (s, expected) in cases {
            assert_eq!(s.parse::<UniformType>().unwrap(), expected, "{s}");
        }
    }

    #[test]
    fn test_parse_rejects() {
        for s in ["5f", "", "f", "1d", "Matrix5fv", "Matrix4f", "2fvv", "ui"] {
            assert!(
                matches!(s.parse::<UniformType>(), Err(DrawError::InvalidUniformType(t)) if t == s),
                "{s}"
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        for t in [
            UniformType::Float,
            UniformType::IntVec(3),
            UniformType::Matrix(4),
        ] {
            assert_eq!(t.to_string().parse::<UniformType>().unwrap(), t);
        }
    }

    #[test]
    fn test_invalid_type_at_construction() {
        let mut r = renderer();
        let p = program(&mut r);
        let err = r.add_uniform(p, "tint", "5f").unwrap_err();
        assert_eq!(err.to_string(), "5f is not valid uniform data type");
        assert!(r.program(p).unwrap().uniforms().is_empty());
    }

    #[test]
    fn test_update_vector() {
        let mut r = renderer();
        let p = program(&mut r);
        let tint = r.add_uniform(p, "tint", "4fv").unwrap();
        r.update_uniform(tint, &[1.0f32, 0.5, 0.25, 1.0]).unwrap();

        let handle = r.program(p).unwrap().handle();
        assert_eq!(
            r.gl().uniform_by_name(handle, "tint"),
            Some(&UniformValue::FloatVec {
                arity: 4,
                data: vec![1.0, 0.5, 0.25, 1.0],
            })
        );
    }

    #[test]
    fn test_vector_truncates_glam() {
        let mut r = renderer();
        let p = program(&mut r);
        let tint = r.add_uniform(p, "tint", "3f").unwrap();
        r.update_uniform(tint, &Vec4::new(1.0, 2.0, 3.0, 4.0)).unwrap();

        let location = r.uniform(tint).unwrap().location().unwrap();
        assert_eq!(
            r.gl().uniform_value(location),
            Some(&UniformValue::FloatVec {
                arity: 3,
                data: vec![1.0, 2.0, 3.0],
            })
        );
    }

    #[test]
    fn test_update_matrix() {
        let mut r = renderer();
        let p = program(&mut r);
        let model = r.add_uniform(p, "model", "Matrix4fv").unwrap();
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        r.update_uniform(model, &m).unwrap();

        let location = r.uniform(model).unwrap().location().unwrap();
        assert_eq!(
            r.gl().uniform_value(location),
            Some(&UniformValue::Matrix {
                order: 4,
                data: m.to_cols_array().to_vec(),
            })
        );
        assert_eq!(r.gl_mut().get_error(), justdraw_gl::constants::NO_ERROR);
    }

    #[test]
    fn test_scalars() {
        let mut r = renderer();
        let p = program(&mut r);
        let tint = r.add_uniform(p, "tint", "1i").unwrap();
        r.update_uniform(tint, &-3.7).unwrap();

        let location = r.uniform(tint).unwrap().location().unwrap();
        assert_eq!(r.gl().uniform_value(location), Some(&UniformValue::Int(-3)));

        let model = r.add_typed_uniform(p, "model", UniformType::Float).unwrap();
        r.update_uniform(model, &0.5f32).unwrap();
        let location = r.uniform(model).unwrap().location().unwrap();
        assert_eq!(r.gl().uniform_value(location), Some(&UniformValue::Float(0.5)));
    }

    #[test]
    fn test_rejects_partial_elements() {
        let mut r = renderer();
        let p = program(&mut r);
        let tint = r.add_uniform(p, "tint", "2iv").unwrap();
        r.gl_mut().reset_stats();

        let err = r.update_uniform(tint, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, DrawError::InvalidUniformValue { ref name, .. } if name == "tint"));
        assert!(r.update_uniform(tint, &Vec::<i32>::new()).is_err());
        assert_eq!(r.gl().stats().uniform, 0);

        r.update_uniform(tint, &[1, 2, 3, 4]).unwrap();
        assert_eq!(r.gl().stats().uniform, 1);
    }

    #[test]
    fn test_update_binds_program() {
        let mut r = renderer();
        let a = program(&mut r);
        let b = program(&mut r);
        let tint = r.add_uniform(a, "tint", "1f").unwrap();
        r.bind_program(b, false).unwrap();

        r.update_uniform(tint, &1.0).unwrap();
        assert_eq!(r.cache().program.current(), Some(a));
    }

    #[test]
    fn test_inactive_uniform_is_dropped() {
        let mut r = renderer();
        let p = program(&mut r);
        let missing = r.add_uniform(p, "missing", "1f").unwrap();
        assert_eq!(r.uniform(missing).unwrap().location(), None);

        r.gl_mut().reset_stats();
        r.update_uniform(missing, &1.0).unwrap();
        assert_eq!(r.gl().stats().uniform, 0);
    }
}
