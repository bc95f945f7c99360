use anyhow::{bail, Result};
use crate::class_constants::element_value;
use crate::ClassWrite;
use crate::pool::ConstantPool;

/// An annotation, as found in a `RuntimeVisibleAnnotations` attribute.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Annotation {
	/// The field descriptor of the annotation interface, like `Ljava/lang/annotation/Retention;`.
	pub type_name: String,
	#[cfg_attr(feature = "serde", serde(default))]
	pub pairs: Vec<ElementValuePair>,
}

impl Annotation {
	pub fn new(type_name: impl Into<String>) -> Annotation {
		Annotation {
			type_name: type_name.into(),
			pairs: Vec::new(),
		}
	}

	pub fn with(mut self, name: impl Into<String>, value: ElementValue) -> Annotation {
		self.pairs.push(ElementValuePair { name: name.into(), value });
		self
	}
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct ElementValuePair {
	pub name: String,
	pub value: ElementValue,
}

/// The value of an annotation element, or the default of an annotation interface method.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ElementValue {
	Boolean(bool),
	Byte(i8),
	Char(u16),
	Short(i16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	String(String),
	Enum {
		/// The field descriptor of the enum class.
		type_name: String,
		const_name: String,
	},
	/// The return descriptor of the class, like `Ljava/lang/Object;` or `V`.
	Class(String),
	Array(Vec<ElementValue>),
	/// Nested annotations can be described, but not written.
	Annotation(Annotation),
}

/// An [`ElementValue`] with everything interned into a constant pool.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResolvedElementValue {
	Const { tag: u8, const_value_index: u16 },
	Enum { type_name_index: u16, const_name_index: u16 },
	Class { class_info_index: u16 },
	Array(Vec<ResolvedElementValue>),
}

impl ResolvedElementValue {
	pub(crate) fn resolve(pool: &mut ConstantPool, value: &ElementValue) -> Result<ResolvedElementValue> {
		fn constant(tag: u8, const_value_index: u16) -> Result<ResolvedElementValue> {
			Ok(ResolvedElementValue::Const { tag, const_value_index })
		}

		match value {
			&ElementValue::Boolean(value) => constant(element_value::BOOLEAN, pool.put_integer(i32::from(value))?),
			&ElementValue::Byte(value) => constant(element_value::BYTE, pool.put_integer(i32::from(value))?),
			&ElementValue::Char(value) => constant(element_value::CHAR, pool.put_integer(i32::from(value))?),
			&ElementValue::Short(value) => constant(element_value::SHORT, pool.put_integer(i32::from(value))?),
			&ElementValue::Int(value) => constant(element_value::INT, pool.put_integer(value)?),
			&ElementValue::Long(value) => constant(element_value::LONG, pool.put_long(value)?),
			&ElementValue::Float(value) => constant(element_value::FLOAT, pool.put_float(value)?),
			&ElementValue::Double(value) => constant(element_value::DOUBLE, pool.put_double(value)?),
			// element values of type String point at a Utf8 entry, not at a String entry
			ElementValue::String(value) => constant(element_value::STRING, pool.put_utf8(value)?),
			ElementValue::Enum { type_name, const_name } => Ok(ResolvedElementValue::Enum {
				type_name_index: pool.put_utf8(type_name)?,
				const_name_index: pool.put_utf8(const_name)?,
			}),
			ElementValue::Class(class) => Ok(ResolvedElementValue::Class { class_info_index: pool.put_utf8(class)? }),
			ElementValue::Array(values) => {
				let values = values.iter()
					.map(|value| ResolvedElementValue::resolve(pool, value))
					.collect::<Result<_>>()?;
				Ok(ResolvedElementValue::Array(values))
			},
			ElementValue::Annotation(annotation) => {
				bail!("annotation {:?} as element value is not supported", annotation.type_name)
			},
		}
	}

	pub(crate) fn write(&self, writer: &mut impl ClassWrite) -> Result<()> {
		match self {
			&ResolvedElementValue::Const { tag, const_value_index } => {
				writer.write_u8(tag)?;
				writer.write_u16(const_value_index)?;
			},
			&ResolvedElementValue::Enum { type_name_index, const_name_index } => {
				writer.write_u8(element_value::ENUM)?;
				writer.write_u16(type_name_index)?;
				writer.write_u16(const_name_index)?;
			},
			&ResolvedElementValue::Class { class_info_index } => {
				writer.write_u8(element_value::CLASS)?;
				writer.write_u16(class_info_index)?;
			},
			ResolvedElementValue::Array(values) => {
				writer.write_u8(element_value::ARRAY)?;
				writer.write_slice(values,
					|w, len| w.write_usize_as_u16(len),
					|w, value| value.write(w),
				)?;
			},
		}
		Ok(())
	}
}

/// An [`Annotation`] with everything interned into a constant pool.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedAnnotation {
	pub(crate) type_index: u16,
	pub(crate) pairs: Vec<(u16, ResolvedElementValue)>,
}

impl ResolvedAnnotation {
	pub(crate) fn resolve(pool: &mut ConstantPool, annotation: &Annotation) -> Result<ResolvedAnnotation> {
		let type_index = pool.put_utf8(&annotation.type_name)?;
		let pairs = annotation.pairs.iter()
			.map(|pair| Ok((pool.put_utf8(&pair.name)?, ResolvedElementValue::resolve(pool, &pair.value)?)))
			.collect::<Result<_>>()?;
		Ok(ResolvedAnnotation { type_index, pairs })
	}

	pub(crate) fn write(&self, writer: &mut impl ClassWrite) -> Result<()> {
		writer.write_u16(self.type_index)?;
		writer.write_slice(&self.pairs,
			|w, len| w.write_usize_as_u16(len),
			|w, (name_index, value)| {
				w.write_u16(*name_index)?;
				value.write(w)
			}
		)
	}
}
