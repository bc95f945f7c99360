//! The description of a class a stub is generated from.
//!
//! The generator only reads through [`ClassMetadata`]. [`ClassDescription`] is the implementation of it that's read
//! from json.

use std::io::Read;
use anyhow::{Context, Result};
use serde::Deserialize;
use class_image::{ConstantValue, ElementValue, flags};

/// Turns a binary name like `java.util.Map$Entry` into the internal form `java/util/Map$Entry`.
pub fn internal_name(binary_name: &str) -> String {
	binary_name.replace('.', "/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
	Public,
	Private,
	Protected,
	Static,
	Final,
	Synchronized,
	Volatile,
	Transient,
	Native,
	Interface,
	Abstract,
	Strict,
}

impl Modifier {
	pub fn flag(self) -> u16 {
		match self {
			Modifier::Public => flags::ACC_PUBLIC,
			Modifier::Private => flags::ACC_PRIVATE,
			Modifier::Protected => flags::ACC_PROTECTED,
			Modifier::Static => flags::ACC_STATIC,
			Modifier::Final => flags::ACC_FINAL,
			Modifier::Synchronized => flags::ACC_SYNCHRONIZED,
			Modifier::Volatile => flags::ACC_VOLATILE,
			Modifier::Transient => flags::ACC_TRANSIENT,
			Modifier::Native => flags::ACC_NATIVE,
			Modifier::Interface => flags::ACC_INTERFACE,
			Modifier::Abstract => flags::ACC_ABSTRACT,
			Modifier::Strict => flags::ACC_STRICT,
		}
	}
}

/// Combines the flags of all the modifiers.
pub fn access_flags(modifiers: &[Modifier]) -> u16 {
	modifiers.iter().fold(0, |access, modifier| access | modifier.flag())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
	Boolean,
	Byte,
	Char,
	Short,
	Int,
	Long,
	Float,
	Double,
}

impl Primitive {
	pub fn descriptor(self) -> char {
		match self {
			Primitive::Boolean => 'Z',
			Primitive::Byte => 'B',
			Primitive::Char => 'C',
			Primitive::Short => 'S',
			Primitive::Int => 'I',
			Primitive::Long => 'J',
			Primitive::Float => 'F',
			Primitive::Double => 'D',
		}
	}
}

/// A java type, either erased or generic.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JavaType {
	#[default]
	Void,
	Primitive(Primitive),
	Class {
		/// The binary name, with dots or slashes.
		name: String,
		/// Whether the class is an interface. Only matters for the first bound of a class type parameter.
		#[serde(default)]
		interface: bool,
	},
	Array(Box<JavaType>),
	Parameterized {
		/// The binary name of the generic class.
		raw: String,
		#[serde(default)]
		owner: Option<Box<JavaType>>,
		arguments: Vec<JavaType>,
	},
	TypeVariable(String),
	Wildcard {
		#[serde(default)]
		lower: Vec<JavaType>,
		#[serde(default)]
		upper: Vec<JavaType>,
	},
}

impl JavaType {
	pub fn class(name: impl Into<String>) -> JavaType {
		JavaType::Class { name: name.into(), interface: false }
	}

	pub fn interface(name: impl Into<String>) -> JavaType {
		JavaType::Class { name: name.into(), interface: true }
	}

	/// Returns `true` if the type is the same after erasure: `void`, primitives, classes and arrays of these.
	pub fn is_raw(&self) -> bool {
		match self {
			JavaType::Void | JavaType::Primitive(_) | JavaType::Class { .. } => true,
			JavaType::Array(component) => component.is_raw(),
			JavaType::Parameterized { .. } | JavaType::TypeVariable(_) | JavaType::Wildcard { .. } => false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeParameter {
	pub name: String,
	/// No bounds means a bound of `java.lang.Object`.
	#[serde(default)]
	pub bounds: Vec<JavaType>,
}

/// A class declared in the class a stub is generated for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NestedClass {
	pub name: String,
	#[serde(default)]
	pub modifiers: Vec<Modifier>,
	#[serde(default)]
	pub annotation: bool,
	#[serde(default, rename = "enum")]
	pub is_enum: bool,
	#[serde(default)]
	pub synthetic: bool,
}

impl NestedClass {
	/// The access flags as used in the `InnerClasses` attribute.
	pub fn access(&self) -> u16 {
		class_access(&self.modifiers, self.annotation, self.is_enum, self.synthetic)
	}
}

fn class_access(modifiers: &[Modifier], annotation: bool, is_enum: bool, synthetic: bool) -> u16 {
	let mut access = access_flags(modifiers);
	if annotation {
		access |= flags::ACC_ANNOTATION;
	}
	if is_enum {
		access |= flags::ACC_ENUM;
	}
	if synthetic {
		access |= flags::ACC_SYNTHETIC;
	}
	access
}

/// The generic view of a method or constructor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenericMethod {
	#[serde(default)]
	pub type_parameters: Vec<TypeParameter>,
	#[serde(default)]
	pub parameters: Vec<JavaType>,
	#[serde(default)]
	pub return_type: JavaType,
	#[serde(default)]
	pub exceptions: Vec<JavaType>,
}

/// A method or a constructor. Constructors ignore the name and return type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MethodDescription {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub modifiers: Vec<Modifier>,
	/// The erased parameter types.
	#[serde(default)]
	pub parameters: Vec<JavaType>,
	/// The erased return type.
	#[serde(default)]
	pub return_type: JavaType,
	/// Binary names of the declared exceptions.
	#[serde(default)]
	pub exceptions: Vec<String>,
	#[serde(default)]
	pub deprecated: bool,
	#[serde(default)]
	pub synthetic: bool,
	#[serde(default)]
	pub bridge: bool,
	#[serde(default)]
	pub varargs: bool,
	#[serde(default)]
	pub generic: Option<GenericMethod>,
	/// The default value of an annotation interface method.
	#[serde(default)]
	pub default_value: Option<ElementValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDescription {
	pub name: String,
	#[serde(default)]
	pub modifiers: Vec<Modifier>,
	/// The erased type.
	#[serde(rename = "type")]
	pub field_type: JavaType,
	#[serde(default)]
	pub generic_type: Option<JavaType>,
	/// The compile time constant value, if the field has one.
	#[serde(default)]
	pub constant_value: Option<ConstantValue>,
	#[serde(default)]
	pub deprecated: bool,
	#[serde(default)]
	pub synthetic: bool,
	#[serde(default)]
	pub enum_constant: bool,
}

/// Read only access to everything known about a class.
pub trait ClassMetadata {
	/// The binary name of the class.
	fn name(&self) -> &str;
	fn super_class(&self) -> Option<&str>;
	fn interfaces(&self) -> &[String];
	/// The modifiers, together with the annotation, enum and synthetic flags.
	fn access(&self) -> u16;
	fn is_interface(&self) -> bool {
		self.access() & flags::ACC_INTERFACE != 0
	}
	fn is_annotation(&self) -> bool {
		self.access() & flags::ACC_ANNOTATION != 0
	}
	fn is_deprecated(&self) -> bool;
	/// The class this class is declared in, if it's a nested class.
	fn declaring_class(&self) -> Option<&str>;
	fn declared_classes(&self) -> &[NestedClass];

	fn type_parameters(&self) -> &[TypeParameter];
	/// The super class with type arguments. If this is `None`, the erased super class is used.
	fn generic_super_class(&self) -> Option<&JavaType>;
	/// The interfaces with type arguments. If this is empty, the erased interfaces are used.
	fn generic_interfaces(&self) -> &[JavaType];

	fn constructors(&self) -> &[MethodDescription];
	fn methods(&self) -> &[MethodDescription];
	fn fields(&self) -> &[FieldDescription];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassDescription {
	pub name: String,
	#[serde(default)]
	pub super_class: Option<String>,
	#[serde(default)]
	pub interfaces: Vec<String>,
	#[serde(default)]
	pub modifiers: Vec<Modifier>,
	#[serde(default)]
	pub annotation: bool,
	#[serde(default, rename = "enum")]
	pub is_enum: bool,
	#[serde(default)]
	pub synthetic: bool,
	#[serde(default)]
	pub deprecated: bool,
	#[serde(default)]
	pub declaring_class: Option<String>,
	#[serde(default)]
	pub declared_classes: Vec<NestedClass>,
	#[serde(default)]
	pub type_parameters: Vec<TypeParameter>,
	#[serde(default)]
	pub generic_super_class: Option<JavaType>,
	#[serde(default)]
	pub generic_interfaces: Vec<JavaType>,
	#[serde(default)]
	pub constructors: Vec<MethodDescription>,
	#[serde(default)]
	pub methods: Vec<MethodDescription>,
	#[serde(default)]
	pub fields: Vec<FieldDescription>,
}

impl ClassMetadata for ClassDescription {
	fn name(&self) -> &str {
		&self.name
	}
	fn super_class(&self) -> Option<&str> {
		self.super_class.as_deref()
	}
	fn interfaces(&self) -> &[String] {
		&self.interfaces
	}
	fn access(&self) -> u16 {
		class_access(&self.modifiers, self.annotation, self.is_enum, self.synthetic)
	}
	fn is_deprecated(&self) -> bool {
		self.deprecated
	}
	fn declaring_class(&self) -> Option<&str> {
		self.declaring_class.as_deref()
	}
	fn declared_classes(&self) -> &[NestedClass] {
		&self.declared_classes
	}
	fn type_parameters(&self) -> &[TypeParameter] {
		&self.type_parameters
	}
	fn generic_super_class(&self) -> Option<&JavaType> {
		self.generic_super_class.as_ref()
	}
	fn generic_interfaces(&self) -> &[JavaType] {
		&self.generic_interfaces
	}
	fn constructors(&self) -> &[MethodDescription] {
		&self.constructors
	}
	fn methods(&self) -> &[MethodDescription] {
		&self.methods
	}
	fn fields(&self) -> &[FieldDescription] {
		&self.fields
	}
}

/// Reads a json array of class descriptions.
pub fn read_descriptions(reader: impl Read) -> Result<Vec<ClassDescription>> {
	serde_json::from_reader(reader)
		.context("failed to parse class descriptions")
}
