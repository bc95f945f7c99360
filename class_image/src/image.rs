use std::io::Write;
use anyhow::{anyhow, Context, Result};
use log::debug;
use crate::attribute::{Attribute, ConstantValueAttribute};
use crate::class_constants;
use crate::ClassWrite;
use crate::pool::{ConstantPool, ConstantValue};

/// Represents a class file version.
///
/// Take a look at [the list of class file versions](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.1-200-B.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
	pub major: u16,
	pub minor: u16,
}

impl Version {
	pub const V1_4: Version = Version::new(48, 0);
	pub const V1_5: Version = Version::new(49, 0);
	pub const V1_6: Version = Version::new(50, 0);
	pub const V1_8: Version = Version::new(52, 0);

	pub const fn new(major: u16, minor: u16) -> Version {
		Version { major, minor }
	}
}

/// A field or a method of a [`ClassFileImage`].
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
	access: u16,
	name_index: u16,
	descriptor_index: u16,
	attributes: Vec<Attribute>,
}

impl Member {
	/// Appends an attribute. The attribute must have been constructed with the pool of the image this member is part of.
	pub fn add_attribute(&mut self, attribute: impl Into<Attribute>) -> &mut Member {
		self.attributes.push(attribute.into());
		self
	}

	pub fn access(&self) -> u16 {
		self.access
	}

	pub fn name_index(&self) -> u16 {
		self.name_index
	}

	pub fn descriptor_index(&self) -> u16 {
		self.descriptor_index
	}

	pub fn attributes(&self) -> &[Attribute] {
		&self.attributes
	}

	fn write(&self, writer: &mut impl ClassWrite) -> Result<()> {
		writer.write_u16(self.access)?;
		writer.write_u16(self.name_index)?;
		writer.write_u16(self.descriptor_index)?;
		writer.write_slice(&self.attributes,
			|w, len| w.write_usize_as_u16(len).context("too many attributes on member"),
			|w, attribute| attribute.write(w),
		)
	}
}

/// The image of a single class file, together with its constant pool.
///
/// Every index stored in here is an index into the pool of this image. The image is meant to be populated and then
/// written once.
#[derive(Debug)]
pub struct ClassFileImage {
	version: Version,
	access: u16,
	this_class: u16,
	super_class: Option<u16>,
	interfaces: Vec<u16>,
	fields: Vec<Member>,
	methods: Vec<Member>,
	attributes: Vec<Attribute>,
	pool: ConstantPool,
}

impl ClassFileImage {
	/// Creates an image for the class `name`, in internal form like `java/lang/Object`.
	///
	/// The class name is interned first, then the super class, if any.
	pub fn new(access: u16, name: &str, super_class: Option<&str>, version: Version) -> Result<ClassFileImage> {
		let mut pool = ConstantPool::new();
		let this_class = pool.put_class(name)?;
		let super_class = super_class.map(|super_class| pool.put_class(super_class)).transpose()?;

		debug!("new class image for {name:?} extending {super_class:?}, version {}.{}", version.major, version.minor);

		Ok(ClassFileImage {
			version,
			access,
			this_class,
			super_class,
			interfaces: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			attributes: Vec::new(),
			pool,
		})
	}

	pub fn pool(&self) -> &ConstantPool {
		&self.pool
	}

	/// The pool, for constructing attributes to add to this image.
	pub fn pool_mut(&mut self) -> &mut ConstantPool {
		&mut self.pool
	}

	pub fn add_interface(&mut self, name: &str) -> Result<()> {
		let index = self.pool.put_class(name)?;
		self.interfaces.push(index);
		Ok(())
	}

	/// Appends a field. With a constant value, the field gets a `ConstantValue` attribute, pointing to a pool entry of
	/// the kind matching the value.
	pub fn add_field(&mut self, access: u16, name: &str, descriptor: &str, constant_value: Option<&ConstantValue>) -> Result<&mut Member> {
		let mut field = self.new_member(access, name, descriptor)?;

		if let Some(constant_value) = constant_value {
			let attribute = ConstantValueAttribute::new(&mut self.pool, constant_value)
				.with_context(|| anyhow!("failed to add constant value {constant_value:?} for field {name:?} {descriptor:?}"))?;
			field.add_attribute(attribute);
		}

		self.fields.push(field);
		let last = self.fields.len() - 1;
		Ok(&mut self.fields[last])
	}

	pub fn add_method(&mut self, access: u16, name: &str, descriptor: &str) -> Result<&mut Member> {
		let method = self.new_member(access, name, descriptor)?;

		self.methods.push(method);
		let last = self.methods.len() - 1;
		Ok(&mut self.methods[last])
	}

	fn new_member(&mut self, access: u16, name: &str, descriptor: &str) -> Result<Member> {
		Ok(Member {
			access,
			name_index: self.pool.put_utf8(name)?,
			descriptor_index: self.pool.put_utf8(descriptor)?,
			attributes: Vec::new(),
		})
	}

	/// Appends a class level attribute. The attribute must have been constructed with the pool of this image.
	pub fn add_attribute(&mut self, attribute: impl Into<Attribute>) {
		self.attributes.push(attribute.into());
	}

	pub fn version(&self) -> Version {
		self.version
	}

	pub fn access(&self) -> u16 {
		self.access
	}

	pub fn this_class(&self) -> u16 {
		self.this_class
	}

	pub fn super_class(&self) -> Option<u16> {
		self.super_class
	}

	pub fn interfaces(&self) -> &[u16] {
		&self.interfaces
	}

	pub fn fields(&self) -> &[Member] {
		&self.fields
	}

	pub fn methods(&self) -> &[Member] {
		&self.methods
	}

	pub fn attributes(&self) -> &[Attribute] {
		&self.attributes
	}

	/// Writes the class file.
	///
	/// If this fails, whatever was written so far is not a valid class file.
	pub fn write(&self, writer: &mut impl Write) -> Result<()> {
		debug!("writing class with {} pool slots, {} fields, {} methods", self.pool.len(), self.fields.len(), self.methods.len());

		writer.write_u32(class_constants::MAGIC)?;
		writer.write_u16(self.version.minor)?;
		writer.write_u16(self.version.major)?;

		self.pool.write(writer).context("failed to write constant pool")?;

		writer.write_u16(self.access)?;
		writer.write_u16(self.this_class)?;
		writer.write_u16(self.super_class.unwrap_or(0))?;
		writer.write_slice(&self.interfaces,
			|w, len| w.write_usize_as_u16(len).context("too many interfaces"),
			|w, &interface| w.write_u16(interface),
		)?;

		writer.write_slice(&self.fields,
			|w, len| w.write_usize_as_u16(len).context("too many fields"),
			|w, field| field.write(w).context("failed to write field"),
		)?;
		writer.write_slice(&self.methods,
			|w, len| w.write_usize_as_u16(len).context("too many methods"),
			|w, method| method.write(w).context("failed to write method"),
		)?;

		writer.write_slice(&self.attributes,
			|w, len| w.write_usize_as_u16(len).context("too many attributes on class"),
			|w, attribute| attribute.write(w),
		)
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		let mut vec = Vec::new();
		self.write(&mut vec)?;
		Ok(vec)
	}
}
