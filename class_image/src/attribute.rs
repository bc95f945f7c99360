//! The attributes a [`ClassFileImage`](crate::ClassFileImage) can hold.
//!
//! Each attribute interns its name and everything it refers to when it's constructed, so constructing one needs the
//! [`ConstantPool`] of the image it's going to be added to. Attributes must only be added to that image.

use anyhow::{anyhow, Context, Result};
use crate::annotation::{ResolvedAnnotation, ResolvedElementValue};
use crate::class_constants::attribute;
use crate::ClassWrite;
use crate::pool::{ConstantPool, ConstantValue};

pub use crate::annotation::{Annotation, ElementValue, ElementValuePair};

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
	Deprecated(DeprecatedAttribute),
	ConstantValue(ConstantValueAttribute),
	String(StringAttribute),
	Exceptions(ExceptionsAttribute),
	InnerClasses(InnerClassesAttribute),
	Code(CodeAttribute),
	RuntimeVisibleAnnotations(AnnotationsAttribute),
	AnnotationDefault(AnnotationDefaultAttribute),
}

macro_rules! attribute_from {
	($($variant:ident($t:ty),)*) => {
		$(
			impl From<$t> for Attribute {
				fn from(value: $t) -> Attribute {
					Attribute::$variant(value)
				}
			}
		)*
	}
}

attribute_from!(
	Deprecated(DeprecatedAttribute),
	ConstantValue(ConstantValueAttribute),
	String(StringAttribute),
	Exceptions(ExceptionsAttribute),
	InnerClasses(InnerClassesAttribute),
	Code(CodeAttribute),
	RuntimeVisibleAnnotations(AnnotationsAttribute),
	AnnotationDefault(AnnotationDefaultAttribute),
);

impl Attribute {
	/// The pool index of the `Utf8` entry naming this attribute.
	pub fn name_index(&self) -> u16 {
		match self {
			Attribute::Deprecated(a) => a.name_index,
			Attribute::ConstantValue(a) => a.name_index,
			Attribute::String(a) => a.name_index,
			Attribute::Exceptions(a) => a.name_index,
			Attribute::InnerClasses(a) => a.name_index,
			Attribute::Code(a) => a.name_index,
			Attribute::RuntimeVisibleAnnotations(a) => a.name_index,
			Attribute::AnnotationDefault(a) => a.name_index,
		}
	}

	/// Writes the `info` part of the attribute, the part the `attribute_length` item counts.
	fn write_info(&self, writer: &mut impl ClassWrite) -> Result<()> {
		match self {
			Attribute::Deprecated(_) => Ok(()),
			Attribute::ConstantValue(a) => writer.write_u16(a.constant_value_index),
			Attribute::String(a) => writer.write_u16(a.value_index),
			Attribute::Exceptions(a) => {
				writer.write_slice(&a.exceptions,
					|w, len| w.write_usize_as_u16(len).context("too many exceptions"),
					|w, &exception| w.write_u16(exception),
				)
			},
			Attribute::InnerClasses(a) => {
				writer.write_slice(&a.classes,
					|w, len| w.write_usize_as_u16(len).context("too many inner classes"),
					|w, inner_class| {
						w.write_u16(inner_class.inner_class_info_index)?;
						w.write_u16(inner_class.outer_class_info_index)?;
						w.write_u16(inner_class.inner_name_index)?;
						w.write_u16(inner_class.inner_class_access_flags)
					}
				)
			},
			Attribute::Code(a) => {
				writer.write_u16(a.max_stack)?;
				writer.write_u16(a.max_locals)?;
				writer.write_usize_as_u32(a.code.len()).context("code too long")?;
				writer.write_u8_slice(&a.code)?;
				writer.write_u16(0)?; // exception_table_length
				writer.write_u16(0) // attributes_count
			},
			Attribute::RuntimeVisibleAnnotations(a) => {
				writer.write_slice(&a.annotations,
					|w, len| w.write_usize_as_u16(len).context("too many annotations"),
					|w, annotation| annotation.write(w),
				)
			},
			Attribute::AnnotationDefault(a) => a.default_value.write(writer),
		}
	}

	/// Writes the whole `attribute_info` structure.
	///
	/// The `info` gets written into a buffer first, so that `attribute_length` is always the number of bytes following it.
	pub(crate) fn write(&self, writer: &mut impl ClassWrite) -> Result<()> {
		let mut buffer = Vec::new();
		self.write_info(&mut buffer)
			.with_context(|| anyhow!("failed to write attribute with name index {}", self.name_index()))?;

		writer.write_u16(self.name_index())?;
		writer.write_usize_as_u32(buffer.len()).with_context(|| anyhow!("attribute with name index {} is too large", self.name_index()))?;
		writer.write_u8_slice(&buffer)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeprecatedAttribute {
	name_index: u16,
}

impl DeprecatedAttribute {
	pub fn new(pool: &mut ConstantPool) -> Result<DeprecatedAttribute> {
		Ok(DeprecatedAttribute { name_index: pool.put_utf8(attribute::DEPRECATED)? })
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantValueAttribute {
	name_index: u16,
	constant_value_index: u16,
}

impl ConstantValueAttribute {
	pub fn new(pool: &mut ConstantPool, value: &ConstantValue) -> Result<ConstantValueAttribute> {
		let constant_value_index = pool.put_constant_value(value)?;
		Ok(ConstantValueAttribute {
			name_index: pool.put_utf8(attribute::CONSTANT_VALUE)?,
			constant_value_index,
		})
	}

	pub fn constant_value_index(&self) -> u16 {
		self.constant_value_index
	}
}

/// An attribute whose `info` is the index of a single `Utf8` entry, like the `Signature` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct StringAttribute {
	name_index: u16,
	value_index: u16,
}

impl StringAttribute {
	pub fn new(pool: &mut ConstantPool, name: &str, value: &str) -> Result<StringAttribute> {
		Ok(StringAttribute {
			name_index: pool.put_utf8(name)?,
			value_index: pool.put_utf8(value)?,
		})
	}

	pub fn signature(pool: &mut ConstantPool, signature: &str) -> Result<StringAttribute> {
		StringAttribute::new(pool, attribute::SIGNATURE, signature)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionsAttribute {
	name_index: u16,
	exceptions: Vec<u16>,
}

impl ExceptionsAttribute {
	pub fn new(pool: &mut ConstantPool) -> Result<ExceptionsAttribute> {
		Ok(ExceptionsAttribute {
			name_index: pool.put_utf8(attribute::EXCEPTIONS)?,
			exceptions: Vec::new(),
		})
	}

	pub fn add(&mut self, pool: &mut ConstantPool, exception: &str) -> Result<()> {
		self.exceptions.push(pool.put_class(exception)?);
		Ok(())
	}

	pub fn is_empty(&self) -> bool {
		self.exceptions.is_empty()
	}
}

/// One entry of the `classes` table of an `InnerClasses` attribute. A zero index means "not present".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerClassEntry {
	pub inner_class_info_index: u16,
	pub outer_class_info_index: u16,
	pub inner_name_index: u16,
	pub inner_class_access_flags: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassesAttribute {
	name_index: u16,
	classes: Vec<InnerClassEntry>,
}

impl InnerClassesAttribute {
	pub fn new(pool: &mut ConstantPool) -> Result<InnerClassesAttribute> {
		Ok(InnerClassesAttribute {
			name_index: pool.put_utf8(attribute::INNER_CLASSES)?,
			classes: Vec::new(),
		})
	}

	pub fn add(&mut self, pool: &mut ConstantPool, inner: &str, outer: Option<&str>, name: Option<&str>, access: u16) -> Result<()> {
		let inner_class_info_index = pool.put_class(inner)?;
		let outer_class_info_index = outer.map(|outer| pool.put_class(outer)).transpose()?.unwrap_or(0);
		let inner_name_index = name.map(|name| pool.put_utf8(name)).transpose()?.unwrap_or(0);

		self.classes.push(InnerClassEntry {
			inner_class_info_index,
			outer_class_info_index,
			inner_name_index,
			inner_class_access_flags: access,
		});
		Ok(())
	}

	pub fn classes(&self) -> &[InnerClassEntry] {
		&self.classes
	}
}

/// A `Code` attribute without exception table and without attributes of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
	name_index: u16,
	max_stack: u16,
	max_locals: u16,
	code: Vec<u8>,
}

impl CodeAttribute {
	pub fn new(pool: &mut ConstantPool, max_stack: u16, max_locals: u16, code: Vec<u8>) -> Result<CodeAttribute> {
		Ok(CodeAttribute {
			name_index: pool.put_utf8(attribute::CODE)?,
			max_stack,
			max_locals,
			code,
		})
	}

	pub fn code(&self) -> &[u8] {
		&self.code
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationsAttribute {
	name_index: u16,
	annotations: Vec<ResolvedAnnotation>,
}

impl AnnotationsAttribute {
	pub fn runtime_visible(pool: &mut ConstantPool) -> Result<AnnotationsAttribute> {
		Ok(AnnotationsAttribute {
			name_index: pool.put_utf8(attribute::RUNTIME_VISIBLE_ANNOTATIONS)?,
			annotations: Vec::new(),
		})
	}

	pub fn add(&mut self, pool: &mut ConstantPool, annotation: &Annotation) -> Result<()> {
		let annotation = ResolvedAnnotation::resolve(pool, annotation)
			.with_context(|| anyhow!("failed to add annotation {:?}", annotation.type_name))?;
		self.annotations.push(annotation);
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.annotations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.annotations.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDefaultAttribute {
	name_index: u16,
	default_value: ResolvedElementValue,
}

impl AnnotationDefaultAttribute {
	pub fn new(pool: &mut ConstantPool, default_value: &ElementValue) -> Result<AnnotationDefaultAttribute> {
		let default_value = ResolvedElementValue::resolve(pool, default_value)
			.context("failed to resolve annotation default value")?;
		Ok(AnnotationDefaultAttribute {
			name_index: pool.put_utf8(attribute::ANNOTATION_DEFAULT)?,
			default_value,
		})
	}
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::attribute::{Annotation, AnnotationDefaultAttribute, AnnotationsAttribute, Attribute, CodeAttribute, ConstantValueAttribute, DeprecatedAttribute, ElementValue, ExceptionsAttribute, InnerClassesAttribute, StringAttribute};
	use crate::pool::{ConstantPool, ConstantValue};

	fn to_bytes(attribute: impl Into<Attribute>) -> Result<Vec<u8>> {
		let mut vec = Vec::new();
		attribute.into().write(&mut vec)?;
		Ok(vec)
	}

	/// Checks that the `attribute_length` matches the number of bytes after it and gives back those bytes.
	fn info(bytes: &[u8]) -> &[u8] {
		let length = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as usize;
		assert_eq!(length, bytes.len() - 6, "attribute_length doesn't match: {bytes:?}");
		&bytes[6..]
	}

	#[test]
	fn deprecated() -> Result<()> {
		let mut pool = ConstantPool::new();
		let bytes = to_bytes(DeprecatedAttribute::new(&mut pool)?)?;
		assert_eq!(bytes, [0, 1, 0, 0, 0, 0]);
		Ok(())
	}

	#[test]
	fn constant_value() -> Result<()> {
		let mut pool = ConstantPool::new();
		let attribute = ConstantValueAttribute::new(&mut pool, &ConstantValue::Long(-1))?;
		// the long comes first, taking up index 1 and 2
		assert_eq!(attribute.constant_value_index(), 1);
		let bytes = to_bytes(attribute)?;
		assert_eq!(&bytes[..2], &[0, 3]);
		assert_eq!(info(&bytes), &[0, 1]);
		Ok(())
	}

	#[test]
	fn string() -> Result<()> {
		let mut pool = ConstantPool::new();
		let bytes = to_bytes(StringAttribute::new(&mut pool, "SourceFile", "Foo.java")?)?;
		assert_eq!(bytes, [0, 1, 0, 0, 0, 2, 0, 2]);

		let bytes = to_bytes(StringAttribute::signature(&mut pool, "<T:Ljava/lang/Object;>Ljava/lang/Object;")?)?;
		assert_eq!(bytes, [0, 3, 0, 0, 0, 2, 0, 4]);
		Ok(())
	}

	#[test]
	fn exceptions() -> Result<()> {
		let mut pool = ConstantPool::new();
		let mut attribute = ExceptionsAttribute::new(&mut pool)?;
		assert!(attribute.is_empty());
		attribute.add(&mut pool, "java/io/IOException")?;
		attribute.add(&mut pool, "java/lang/InterruptedException")?;
		let bytes = to_bytes(attribute)?;
		assert_eq!(info(&bytes), &[0, 2, 0, 3, 0, 5]);
		Ok(())
	}

	#[test]
	fn inner_classes() -> Result<()> {
		let mut pool = ConstantPool::new();
		let mut attribute = InnerClassesAttribute::new(&mut pool)?;
		attribute.add(&mut pool, "a/Outer$Inner", Some("a/Outer"), Some("Inner"), 0x0009)?;
		attribute.add(&mut pool, "a/Outer$1", None, None, 0)?;
		assert_eq!(attribute.classes().len(), 2);
		let bytes = to_bytes(attribute)?;
		assert_eq!(info(&bytes), &[
			0, 2,
			0, 3, 0, 5, 0, 6, 0, 9,
			0, 8, 0, 0, 0, 0, 0, 0,
		]);
		Ok(())
	}

	#[test]
	fn code() -> Result<()> {
		let mut pool = ConstantPool::new();
		let bytes = to_bytes(CodeAttribute::new(&mut pool, 3, 1, vec![0xb1])?)?;
		assert_eq!(info(&bytes), &[
			0, 3, // max_stack
			0, 1, // max_locals
			0, 0, 0, 1, 0xb1, // code
			0, 0, // exception_table_length
			0, 0, // attributes_count
		]);
		Ok(())
	}

	#[test]
	fn runtime_visible_annotations() -> Result<()> {
		let mut pool = ConstantPool::new();
		let mut attribute = AnnotationsAttribute::runtime_visible(&mut pool)?;
		attribute.add(&mut pool, &Annotation::new("Ljava/lang/annotation/Retention;")
			.with("value", ElementValue::Enum {
				type_name: "Ljava/lang/annotation/RetentionPolicy;".to_owned(),
				const_name: "RUNTIME".to_owned(),
			})
		)?;
		assert_eq!(attribute.len(), 1);
		let bytes = to_bytes(attribute)?;
		assert_eq!(info(&bytes), &[
			0, 1, // num_annotations
			0, 2, // type_index
			0, 1, // num_element_value_pairs
			0, 3, // element_name_index
			b'e', 0, 4, 0, 5,
		]);
		Ok(())
	}

	#[test]
	fn nested_annotations_are_not_supported() -> Result<()> {
		let mut pool = ConstantPool::new();
		let mut attribute = AnnotationsAttribute::runtime_visible(&mut pool)?;
		let nested = Annotation::new("La/Outer;")
			.with("value", ElementValue::Annotation(Annotation::new("La/Inner;")));
		assert!(attribute.add(&mut pool, &nested).is_err());
		assert!(attribute.is_empty());

		assert!(AnnotationDefaultAttribute::new(&mut pool, &ElementValue::Array(vec![
			ElementValue::Annotation(Annotation::new("La/Inner;")),
		])).is_err());
		Ok(())
	}

	#[test]
	fn annotation_default() -> Result<()> {
		let mut pool = ConstantPool::new();
		let bytes = to_bytes(AnnotationDefaultAttribute::new(&mut pool, &ElementValue::Boolean(true))?)?;
		// the integer 1 at index 1, the name at 2
		assert_eq!(bytes, [0, 2, 0, 0, 0, 3, b'Z', 0, 1]);

		let bytes = to_bytes(AnnotationDefaultAttribute::new(&mut pool, &ElementValue::Array(vec![
			ElementValue::String("a".to_owned()),
			ElementValue::Class("Ljava/lang/Object;".to_owned()),
			ElementValue::Long(5),
		]))?)?;
		assert_eq!(info(&bytes), &[
			b'[', 0, 3,
			b's', 0, 3,
			b'c', 0, 4,
			b'J', 0, 5,
		]);
		Ok(())
	}
}
