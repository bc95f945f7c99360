//! Reading class files back in.
//!
//! Only the structure is read. Attributes are kept as their raw bytes, there are decoders for the attributes this crate
//! writes. Unknown attributes are skipped using their declared length, like any class file reader does.

use std::io::{Cursor, Read};
use anyhow::{anyhow, bail, Context, Result};
use java_string::JavaString;
use log::trace;
use crate::annotation::{Annotation, ElementValue, ElementValuePair};
use crate::class_constants::{attribute, element_value, pool};
use crate::image::Version;
use crate::pool::PoolEntry;
use crate::{class_constants, ClassRead};

/// A pool entry as read from a class file.
///
/// The kinds the writer knows about are in [`RawPoolEntry::Known`], the rest are only read so that they can be skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPoolEntry {
	Known(PoolEntry),
	InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
	MethodHandle { reference_kind: u8, reference_index: u16 },
	MethodType { descriptor_index: u16 },
	Dynamic { bootstrap_method_attribute_index: u16, name_and_type_index: u16 },
	InvokeDynamic { bootstrap_method_attribute_index: u16, name_and_type_index: u16 },
	Module { name_index: u16 },
	Package { name_index: u16 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
	pub name: String,
	pub info: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawMember {
	pub access: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawExceptionTableEntry {
	pub start_pc: u16,
	pub end_pc: u16,
	pub handler_pc: u16,
	pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCode {
	pub max_stack: u16,
	pub max_locals: u16,
	pub code: Vec<u8>,
	pub exception_table: Vec<RawExceptionTableEntry>,
	pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInnerClass {
	pub inner_class: String,
	pub outer_class: Option<String>,
	pub inner_name: Option<String>,
	pub access: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
	pub version: Version,
	/// The constant pool, indexed by pool index. Index zero and the slots after longs and doubles are `None`.
	pub pool: Vec<Option<RawPoolEntry>>,
	pub access: u16,
	pub this_class: u16,
	/// Zero if there's no super class.
	pub super_class: u16,
	pub interfaces: Vec<u16>,
	pub fields: Vec<RawMember>,
	pub methods: Vec<RawMember>,
	pub attributes: Vec<RawAttribute>,
}

fn read_pool(reader: &mut impl ClassRead) -> Result<Vec<Option<RawPoolEntry>>> {
	let mut pool = vec![None];

	let constant_pool_count = reader.read_u16_as_usize()?;
	while pool.len() < constant_pool_count {
		let index = pool.len();
		let entry = match reader.read_u8()? {
			pool::UTF8 => {
				let length = reader.read_u16_as_usize()?;
				let vec = reader.read_u8_vec(length)?;
				let string = JavaString::from_modified_utf8(vec)
					.with_context(|| anyhow!("failed to read utf8 pool entry at index {index}"))?;
				RawPoolEntry::Known(PoolEntry::Utf8 { string })
			},
			pool::INTEGER => RawPoolEntry::Known(PoolEntry::Integer { bytes: reader.read_i32()? }),
			pool::FLOAT => RawPoolEntry::Known(PoolEntry::Float { bytes: reader.read_u32()? }),
			pool::LONG => RawPoolEntry::Known(PoolEntry::Long { bytes: reader.read_i64()? }),
			pool::DOUBLE => RawPoolEntry::Known(PoolEntry::Double { bytes: reader.read_u64()? }),
			pool::CLASS => RawPoolEntry::Known(PoolEntry::Class { name_index: reader.read_u16()? }),
			pool::STRING => RawPoolEntry::Known(PoolEntry::String { string_index: reader.read_u16()? }),
			pool::FIELD_REF => RawPoolEntry::Known(PoolEntry::FieldRef {
				class_index: reader.read_u16()?,
				name_and_type_index: reader.read_u16()?,
			}),
			pool::METHOD_REF => RawPoolEntry::Known(PoolEntry::MethodRef {
				class_index: reader.read_u16()?,
				name_and_type_index: reader.read_u16()?,
			}),
			pool::INTERFACE_METHOD_REF => RawPoolEntry::InterfaceMethodRef {
				class_index: reader.read_u16()?,
				name_and_type_index: reader.read_u16()?,
			},
			pool::NAME_AND_TYPE => RawPoolEntry::Known(PoolEntry::NameAndType {
				name_index: reader.read_u16()?,
				descriptor_index: reader.read_u16()?,
			}),
			pool::METHOD_HANDLE => RawPoolEntry::MethodHandle {
				reference_kind: reader.read_u8()?,
				reference_index: reader.read_u16()?,
			},
			pool::METHOD_TYPE => RawPoolEntry::MethodType { descriptor_index: reader.read_u16()? },
			pool::DYNAMIC => RawPoolEntry::Dynamic {
				bootstrap_method_attribute_index: reader.read_u16()?,
				name_and_type_index: reader.read_u16()?,
			},
			pool::INVOKE_DYNAMIC => RawPoolEntry::InvokeDynamic {
				bootstrap_method_attribute_index: reader.read_u16()?,
				name_and_type_index: reader.read_u16()?,
			},
			pool::MODULE => RawPoolEntry::Module { name_index: reader.read_u16()? },
			pool::PACKAGE => RawPoolEntry::Package { name_index: reader.read_u16()? },
			tag => bail!("unknown constant pool tag {tag} at index {index}"),
		};

		let takes_two_slots = matches!(entry, RawPoolEntry::Known(PoolEntry::Long { .. } | PoolEntry::Double { .. }));

		trace!("read pool entry {entry:?} at index {index}");
		pool.push(Some(entry));
		if takes_two_slots {
			// long and double take up two pool slots
			pool.push(None);
		}
	}

	if pool.len() != constant_pool_count {
		bail!("last pool entry goes beyond the constant pool count of {constant_pool_count}");
	}

	Ok(pool)
}

fn read_attributes(reader: &mut impl ClassRead, pool: &[Option<RawPoolEntry>]) -> Result<Vec<RawAttribute>> {
	reader.read_vec(
		|r| r.read_u16_as_usize(),
		|r| {
			let name_index = r.read_u16()?;
			let name = get_utf8(pool, name_index)
				.context("failed to get attribute name")?
				.to_owned();
			let length = r.read_u32()? as usize;
			let info = r.read_u8_vec(length)
				.with_context(|| anyhow!("failed to read {length} bytes of attribute {name:?}"))?;
			Ok(RawAttribute { name, info })
		}
	)
}

fn read_member(reader: &mut impl ClassRead, pool: &[Option<RawPoolEntry>]) -> Result<RawMember> {
	Ok(RawMember {
		access: reader.read_u16()?,
		name_index: reader.read_u16()?,
		descriptor_index: reader.read_u16()?,
		attributes: read_attributes(reader, pool)?,
	})
}

fn get_entry(pool: &[Option<RawPoolEntry>], index: u16) -> Result<&RawPoolEntry> {
	pool.get(index as usize)
		.and_then(Option::as_ref)
		.with_context(|| anyhow!("no pool entry at index {index}"))
}

fn get_utf8(pool: &[Option<RawPoolEntry>], index: u16) -> Result<&str> {
	let RawPoolEntry::Known(PoolEntry::Utf8 { string }) = get_entry(pool, index)? else {
		bail!("pool entry at index {index} not `Utf8`");
	};
	string.as_str()
		.with_context(|| anyhow!("utf8 pool entry at index {index} isn't valid utf8"))
}

impl RawClass {
	pub fn read(reader: &mut impl Read) -> Result<RawClass> {
		let magic = reader.read_u32()?;
		if magic != class_constants::MAGIC {
			bail!("wrong magic: got {magic:#x}, expected 0xCAFEBABE");
		}

		let minor = reader.read_u16()?;
		let major = reader.read_u16()?;

		let pool = read_pool(reader).context("failed to read constant pool")?;

		let access = reader.read_u16()?;
		let this_class = reader.read_u16()?;
		let super_class = reader.read_u16()?;
		let interfaces = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| r.read_u16(),
		)?;
		let fields = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| read_member(r, &pool).context("failed to read field"),
		)?;
		let methods = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| read_member(r, &pool).context("failed to read method"),
		)?;
		let attributes = read_attributes(reader, &pool).context("failed to read class attributes")?;

		let mut rest = Vec::new();
		reader.read_to_end(&mut rest)?;
		if !rest.is_empty() {
			bail!("{} trailing bytes after the class file", rest.len());
		}

		Ok(RawClass {
			version: Version::new(major, minor),
			pool,
			access,
			this_class,
			super_class,
			interfaces,
			fields,
			methods,
			attributes,
		})
	}

	/// The `constant_pool_count`, as it was written.
	pub fn pool_count(&self) -> usize {
		self.pool.len()
	}

	pub fn entry(&self, index: u16) -> Result<&RawPoolEntry> {
		get_entry(&self.pool, index)
	}

	pub fn utf8(&self, index: u16) -> Result<&str> {
		get_utf8(&self.pool, index)
	}

	pub fn class(&self, index: u16) -> Result<&str> {
		let &RawPoolEntry::Known(PoolEntry::Class { name_index }) = self.entry(index)? else {
			bail!("pool entry at index {index} not `Class`");
		};
		self.utf8(name_index)
	}

	fn optional<'a, T>(&'a self, index: u16, f: impl FnOnce(&'a RawClass, u16) -> Result<T>) -> Result<Option<T>> {
		if index == 0 {
			Ok(None)
		} else {
			f(self, index).map(Some)
		}
	}

	pub fn class_name(&self) -> Result<&str> {
		self.class(self.this_class)
	}

	pub fn super_class_name(&self) -> Result<Option<&str>> {
		self.optional(self.super_class, RawClass::class)
	}

	pub fn interface_names(&self) -> Result<Vec<&str>> {
		self.interfaces.iter()
			.map(|&index| self.class(index))
			.collect()
	}

	/// Gives the name and descriptor of a field or method.
	pub fn name_and_descriptor(&self, member: &RawMember) -> Result<(&str, &str)> {
		Ok((self.utf8(member.name_index)?, self.utf8(member.descriptor_index)?))
	}

	/// Finds the method with the given name and descriptor.
	pub fn method(&self, name: &str, descriptor: &str) -> Result<Option<&RawMember>> {
		for method in &self.methods {
			if self.name_and_descriptor(method)? == (name, descriptor) {
				return Ok(Some(method));
			}
		}
		Ok(None)
	}

	/// Finds the field with the given name.
	pub fn field(&self, name: &str) -> Result<Option<&RawMember>> {
		for field in &self.fields {
			if self.utf8(field.name_index)? == name {
				return Ok(Some(field));
			}
		}
		Ok(None)
	}

	/// Decodes the info of an attribute, and checks that the decoder used up all of it.
	fn decode<T>(&self, attribute: &RawAttribute, name: &str, f: impl FnOnce(&mut Cursor<&[u8]>) -> Result<T>) -> Result<T> {
		if attribute.name != name {
			bail!("expected a {name:?} attribute, got {:?}", attribute.name);
		}

		let mut cursor = Cursor::new(attribute.info.as_slice());
		let value = f(&mut cursor).with_context(|| anyhow!("failed to decode {name:?} attribute"))?;

		let left = attribute.info.len() as u64 - cursor.position();
		if left != 0 {
			bail!("{left} bytes left over after decoding {name:?} attribute");
		}

		Ok(value)
	}

	pub fn code(&self, attribute: &RawAttribute) -> Result<RawCode> {
		self.decode(attribute, attribute::CODE, |r| {
			let max_stack = r.read_u16()?;
			let max_locals = r.read_u16()?;
			let code_length = r.read_u32()? as usize;
			let code = r.read_u8_vec(code_length)?;
			let exception_table = r.read_vec(
				|r| r.read_u16_as_usize(),
				|r| Ok(RawExceptionTableEntry {
					start_pc: r.read_u16()?,
					end_pc: r.read_u16()?,
					handler_pc: r.read_u16()?,
					catch_type: r.read_u16()?,
				}),
			)?;
			let attributes = read_attributes(r, &self.pool)?;
			Ok(RawCode { max_stack, max_locals, code, exception_table, attributes })
		})
	}

	pub fn exceptions(&self, attribute: &RawAttribute) -> Result<Vec<&str>> {
		self.decode(attribute, attribute::EXCEPTIONS, |r| {
			r.read_vec(
				|r| r.read_u16_as_usize(),
				|r| self.class(r.read_u16()?),
			)
		})
	}

	pub fn inner_classes(&self, attribute: &RawAttribute) -> Result<Vec<RawInnerClass>> {
		self.decode(attribute, attribute::INNER_CLASSES, |r| {
			r.read_vec(
				|r| r.read_u16_as_usize(),
				|r| Ok(RawInnerClass {
					inner_class: self.class(r.read_u16()?)?.to_owned(),
					outer_class: self.optional(r.read_u16()?, RawClass::class)?.map(str::to_owned),
					inner_name: self.optional(r.read_u16()?, RawClass::utf8)?.map(str::to_owned),
					access: r.read_u16()?,
				}),
			)
		})
	}

	/// Gives the pool entry a `ConstantValue` attribute points to.
	pub fn constant_value(&self, attribute: &RawAttribute) -> Result<&RawPoolEntry> {
		self.decode(attribute, attribute::CONSTANT_VALUE, |r| self.entry(r.read_u16()?))
	}

	pub fn signature(&self, attribute: &RawAttribute) -> Result<&str> {
		self.decode(attribute, attribute::SIGNATURE, |r| self.utf8(r.read_u16()?))
	}

	pub fn runtime_visible_annotations(&self, attribute: &RawAttribute) -> Result<Vec<Annotation>> {
		self.decode(attribute, attribute::RUNTIME_VISIBLE_ANNOTATIONS, |r| {
			r.read_vec(
				|r| r.read_u16_as_usize(),
				|r| self.read_annotation(r),
			)
		})
	}

	pub fn annotation_default(&self, attribute: &RawAttribute) -> Result<ElementValue> {
		self.decode(attribute, attribute::ANNOTATION_DEFAULT, |r| self.read_element_value(r))
	}

	fn read_annotation(&self, reader: &mut impl ClassRead) -> Result<Annotation> {
		let type_name = self.utf8(reader.read_u16()?)?.to_owned();
		let pairs = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| Ok(ElementValuePair {
				name: self.utf8(r.read_u16()?)?.to_owned(),
				value: self.read_element_value(r)?,
			}),
		)?;
		Ok(Annotation { type_name, pairs })
	}

	fn read_element_value(&self, reader: &mut impl ClassRead) -> Result<ElementValue> {
		let integer = |index: u16| -> Result<i32> {
			match *self.entry(index)? {
				RawPoolEntry::Known(PoolEntry::Integer { bytes }) => Ok(bytes),
				ref entry => bail!("expected `Integer` pool entry for element value, got {entry:?}"),
			}
		};

		Ok(match reader.read_u8()? {
			element_value::BOOLEAN => ElementValue::Boolean(integer(reader.read_u16()?)? != 0),
			element_value::BYTE => ElementValue::Byte(integer(reader.read_u16()?)? as i8),
			element_value::CHAR => ElementValue::Char(integer(reader.read_u16()?)? as u16),
			element_value::SHORT => ElementValue::Short(integer(reader.read_u16()?)? as i16),
			element_value::INT => ElementValue::Int(integer(reader.read_u16()?)?),
			element_value::LONG => match *self.entry(reader.read_u16()?)? {
				RawPoolEntry::Known(PoolEntry::Long { bytes }) => ElementValue::Long(bytes),
				ref entry => bail!("expected `Long` pool entry for element value, got {entry:?}"),
			},
			element_value::FLOAT => match *self.entry(reader.read_u16()?)? {
				RawPoolEntry::Known(PoolEntry::Float { bytes }) => ElementValue::Float(f32::from_bits(bytes)),
				ref entry => bail!("expected `Float` pool entry for element value, got {entry:?}"),
			},
			element_value::DOUBLE => match *self.entry(reader.read_u16()?)? {
				RawPoolEntry::Known(PoolEntry::Double { bytes }) => ElementValue::Double(f64::from_bits(bytes)),
				ref entry => bail!("expected `Double` pool entry for element value, got {entry:?}"),
			},
			element_value::STRING => ElementValue::String(self.utf8(reader.read_u16()?)?.to_owned()),
			element_value::ENUM => ElementValue::Enum {
				type_name: self.utf8(reader.read_u16()?)?.to_owned(),
				const_name: self.utf8(reader.read_u16()?)?.to_owned(),
			},
			element_value::CLASS => ElementValue::Class(self.utf8(reader.read_u16()?)?.to_owned()),
			element_value::ANNOTATION => ElementValue::Annotation(self.read_annotation(reader)?),
			element_value::ARRAY => ElementValue::Array(reader.read_vec(
				|r| r.read_u16_as_usize(),
				|r| self.read_element_value(r),
			)?),
			tag => bail!("unknown element value tag {tag:#x}"),
		})
	}
}
