use anyhow::{anyhow, Context, Result};
use log::{debug, trace};
use class_image::attribute::{AnnotationDefaultAttribute, AnnotationsAttribute, DeprecatedAttribute, ExceptionsAttribute, InnerClassesAttribute, StringAttribute};
use class_image::code::throwing_code;
use class_image::{Annotation, ClassFileImage, ElementValue, flags, Member, Version};
use crate::model::{access_flags, ClassMetadata, FieldDescription, internal_name, JavaType, MethodDescription, Primitive};
use crate::signature::{class_signature, descriptor, method_descriptor, method_signature, type_signature};

/// How stubs get generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubOptions {
	pub version: Version,
	/// The internal name of the exception stub constructors throw. It must have a constructor taking a `String`.
	pub exception_class: String,
	pub message: String,
}

impl Default for StubOptions {
	fn default() -> Self {
		StubOptions {
			version: Version::V1_5,
			exception_class: "java/lang/UnsatisfiedLinkError".to_owned(),
			message: "this class is a stub and can only be compiled against".to_owned(),
		}
	}
}

fn is_visible(access: u16) -> bool {
	access & (flags::ACC_PUBLIC | flags::ACC_PROTECTED) != 0
}

/// The part after the last `$`, or the whole name.
fn simple_name(name: &str) -> &str {
	name.rsplit_once('$').map_or(name, |(_, simple)| simple)
}

fn add_exceptions(image: &mut ClassFileImage, exceptions: &[String]) -> Result<Option<ExceptionsAttribute>> {
	if exceptions.is_empty() {
		return Ok(None);
	}
	let pool = image.pool_mut();
	let mut attribute = ExceptionsAttribute::new(pool)?;
	for exception in exceptions {
		attribute.add(pool, &internal_name(exception))?;
	}
	Ok(Some(attribute))
}

/// Adds the attributes methods and constructors have in common.
fn add_method_attributes(image: &mut ClassFileImage, method: &MethodDescription, member: impl FnOnce(&mut ClassFileImage) -> Result<&mut Member>) -> Result<()> {
	let exceptions = add_exceptions(image, &method.exceptions)?;
	let deprecated = method.deprecated.then(|| DeprecatedAttribute::new(image.pool_mut())).transpose()?;
	let signature = match &method.generic {
		Some(generic) => method_signature(generic)?,
		None => None,
	};
	let signature = signature.map(|signature| StringAttribute::signature(image.pool_mut(), &signature)).transpose()?;
	let default_value = method.default_value.as_ref()
		.map(|value| AnnotationDefaultAttribute::new(image.pool_mut(), value))
		.transpose()?;

	let member = member(image)?;
	if let Some(exceptions) = exceptions {
		member.add_attribute(exceptions);
	}
	if let Some(deprecated) = deprecated {
		member.add_attribute(deprecated);
	}
	if let Some(signature) = signature {
		member.add_attribute(signature);
	}
	if let Some(default_value) = default_value {
		member.add_attribute(default_value);
	}
	Ok(())
}

fn add_constructor(image: &mut ClassFileImage, constructor: &MethodDescription, options: &StubOptions) -> Result<()> {
	let mut access = access_flags(&constructor.modifiers);
	if !is_visible(access) {
		trace!("skipping constructor {:?}", constructor.parameters);
		return Ok(());
	}
	if constructor.synthetic {
		access |= flags::ACC_SYNTHETIC;
	}
	if constructor.varargs {
		access |= flags::ACC_VARARGS;
	}

	let descriptor = method_descriptor(&constructor.parameters, &JavaType::Void)?;
	let max_locals = u16::try_from(constructor.parameters.len() * 2 + 1)
		.with_context(|| anyhow!("too many parameters for constructor {descriptor:?}"))?;
	let code = throwing_code(image.pool_mut(), &options.exception_class, &options.message, max_locals)?;

	trace!("adding constructor {descriptor:?}");
	add_method_attributes(image, constructor, |image| {
		let member = image.add_method(access, "<init>", &descriptor)?;
		member.add_attribute(code);
		Ok(member)
	}).with_context(|| anyhow!("failed to add constructor {descriptor:?}"))
}

fn add_method(image: &mut ClassFileImage, method: &MethodDescription) -> Result<()> {
	let mut access = access_flags(&method.modifiers);
	if !is_visible(access) {
		trace!("skipping method {:?}", method.name);
		return Ok(());
	}
	if access & flags::ACC_ABSTRACT == 0 {
		access |= flags::ACC_NATIVE;
	}
	if method.bridge {
		access |= flags::ACC_BRIDGE;
	}
	if method.synthetic {
		access |= flags::ACC_SYNTHETIC;
	}
	if method.varargs {
		access |= flags::ACC_VARARGS;
	}

	let descriptor = method_descriptor(&method.parameters, &method.return_type)?;

	trace!("adding method {:?} {descriptor:?}", method.name);
	add_method_attributes(image, method, |image| image.add_method(access, &method.name, &descriptor))
		.with_context(|| anyhow!("failed to add method {:?} {descriptor:?}", method.name))
}

fn is_serial_version_uid(field: &FieldDescription, access: u16) -> bool {
	let static_final = flags::ACC_STATIC | flags::ACC_FINAL;
	access & static_final == static_final
		&& field.name == "serialVersionUID"
		&& field.field_type == JavaType::Primitive(Primitive::Long)
}

fn add_field(image: &mut ClassFileImage, field: &FieldDescription) -> Result<()> {
	let mut access = access_flags(&field.modifiers);
	if !is_visible(access) && !is_serial_version_uid(field, access) {
		trace!("skipping field {:?}", field.name);
		return Ok(());
	}
	if field.enum_constant {
		access |= flags::ACC_ENUM;
	}
	if field.synthetic {
		access |= flags::ACC_SYNTHETIC;
	}

	let descriptor = descriptor(&field.field_type)
		.with_context(|| anyhow!("failed to make descriptor of field {:?}", field.name))?;

	let deprecated = field.deprecated.then(|| DeprecatedAttribute::new(image.pool_mut())).transpose()?;
	let signature = match &field.generic_type {
		Some(generic_type) if *generic_type != field.field_type => {
			let signature = type_signature(generic_type)
				.with_context(|| anyhow!("failed to make signature of field {:?}", field.name))?;
			Some(StringAttribute::signature(image.pool_mut(), &signature)?)
		},
		_ => None,
	};

	trace!("adding field {:?} {descriptor:?}", field.name);
	let member = image.add_field(access, &field.name, &descriptor, field.constant_value.as_ref())?;
	if let Some(deprecated) = deprecated {
		member.add_attribute(deprecated);
	}
	if let Some(signature) = signature {
		member.add_attribute(signature);
	}
	Ok(())
}

fn retention_runtime() -> Annotation {
	Annotation::new("Ljava/lang/annotation/Retention;")
		.with("value", ElementValue::Enum {
			type_name: "Ljava/lang/annotation/RetentionPolicy;".to_owned(),
			const_name: "RUNTIME".to_owned(),
		})
}

/// Builds the image of the stub class.
///
/// The stub has the same name, super class, interfaces and generic signature as the class. Of the members, only
/// public and protected ones are kept (and the `serialVersionUID`). Constructors throw the exception given in the
/// options, all other methods that aren't abstract are made `native`.
pub fn build_stub(class: &impl ClassMetadata, options: &StubOptions) -> Result<ClassFileImage> {
	let name = internal_name(class.name());
	debug!("building stub for {name:?}");

	let super_class = if class.is_interface() {
		Some("java/lang/Object".to_owned())
	} else {
		class.super_class().map(internal_name)
	};

	let declared_access = class.access();
	let mut access = declared_access;
	if class.declaring_class().is_some() {
		// the class file of a nested class has no protected, private or static flag
		if access & flags::ACC_PROTECTED != 0 {
			access |= flags::ACC_PUBLIC;
		}
		access &= !(flags::ACC_STATIC | flags::ACC_PRIVATE | flags::ACC_PROTECTED);
	}

	let mut image = ClassFileImage::new(access, &name, super_class.as_deref(), options.version)?;

	if let Some(signature) = class_signature(class).with_context(|| anyhow!("failed to make signature of class {name:?}"))? {
		let attribute = StringAttribute::signature(image.pool_mut(), &signature)?;
		image.add_attribute(attribute);
	}
	if class.is_deprecated() {
		let attribute = DeprecatedAttribute::new(image.pool_mut())?;
		image.add_attribute(attribute);
	}

	// (inner class, outer class, simple name, access)
	let mut inner_classes = Vec::new();

	if let Some(declaring_class) = class.declaring_class() {
		if class.is_annotation() {
			let pool = image.pool_mut();
			let mut attribute = AnnotationsAttribute::runtime_visible(pool)?;
			attribute.add(pool, &retention_runtime())?;
			image.add_attribute(attribute);
		}
		inner_classes.push((name.clone(), internal_name(declaring_class), simple_name(&name).to_owned(), declared_access));
	}

	for interface in class.interfaces() {
		image.add_interface(&internal_name(interface))?;
	}

	for nested in class.declared_classes() {
		let nested_access = nested.access();
		if is_visible(nested_access) {
			let nested_name = internal_name(&nested.name);
			let simple = simple_name(&nested_name).to_owned();
			inner_classes.push((nested_name, name.clone(), simple, nested_access));
		}
	}

	for constructor in class.constructors() {
		add_constructor(&mut image, constructor, options)?;
	}
	for method in class.methods() {
		add_method(&mut image, method)?;
	}
	for field in class.fields() {
		add_field(&mut image, field)?;
	}

	if !inner_classes.is_empty() {
		let pool = image.pool_mut();
		let mut attribute = InnerClassesAttribute::new(pool)?;
		for (inner, outer, simple, access) in &inner_classes {
			attribute.add(pool, inner, Some(outer.as_str()), Some(simple.as_str()), *access)?;
		}
		image.add_attribute(attribute);
	}

	debug!("stub for {name:?} has {} fields and {} methods", image.fields().len(), image.methods().len());
	Ok(image)
}

/// Generates the bytes of the stub class file, see [`build_stub`].
pub fn generate_stub(class: &impl ClassMetadata, options: &StubOptions) -> Result<Vec<u8>> {
	build_stub(class, options)?.to_bytes()
		.with_context(|| anyhow!("failed to write stub for {:?}", class.name()))
}
