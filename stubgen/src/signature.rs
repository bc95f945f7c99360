//! Descriptors and generic signatures.
//!
//! Only a subset of generic types can be written: parameterized types nested in another parameterized type (those with
//! an owner type) and wildcards with more than one bound give an error.
//!
//! See <https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.7.9.1> for the grammar.

use anyhow::{anyhow, bail, Context, Result};
use crate::model::{ClassMetadata, GenericMethod, internal_name, JavaType, TypeParameter};

const JAVA_LANG_OBJECT: &str = "java/lang/Object";

fn push_descriptor(s: &mut String, ty: &JavaType) -> Result<()> {
	match ty {
		JavaType::Void => s.push('V'),
		JavaType::Primitive(primitive) => s.push(primitive.descriptor()),
		JavaType::Class { name, .. } => {
			s.push('L');
			s.push_str(&internal_name(name));
			s.push(';');
		},
		JavaType::Array(component) => {
			if **component == JavaType::Void {
				bail!("there are no arrays of void");
			}
			s.push('[');
			push_descriptor(s, component)?;
		},
		ty => bail!("can't make a descriptor of the non-erased type {ty:?}"),
	}
	Ok(())
}

/// The field descriptor of an erased type, like `I` or `[Ljava/lang/String;`.
pub fn descriptor(ty: &JavaType) -> Result<String> {
	let mut s = String::new();
	push_descriptor(&mut s, ty)?;
	Ok(s)
}

/// The method descriptor of erased types, like `(I[Ljava/lang/String;)V`.
pub fn method_descriptor(parameters: &[JavaType], return_type: &JavaType) -> Result<String> {
	let mut s = String::from("(");
	for parameter in parameters {
		push_descriptor(&mut s, parameter)?;
	}
	s.push(')');
	push_descriptor(&mut s, return_type)?;
	Ok(s)
}

fn push_type_signature(s: &mut String, ty: &JavaType) -> Result<()> {
	match ty {
		JavaType::Parameterized { raw, owner, arguments } => {
			if let Some(owner) = owner {
				bail!("parameterized type {raw:?} with owner type {owner:?} is not supported");
			}
			s.push('L');
			s.push_str(&internal_name(raw));
			s.push('<');
			for argument in arguments {
				push_type_signature(s, argument)?;
			}
			s.push_str(">;");
		},
		JavaType::TypeVariable(name) => {
			s.push('T');
			s.push_str(name);
			s.push(';');
		},
		JavaType::Wildcard { lower, upper } => {
			match (lower.as_slice(), upper.as_slice()) {
				([], []) => s.push('*'),
				// the upper bound next to a lower bound can only be `Object`
				([lower], [] | [_]) => {
					s.push('-');
					push_type_signature(s, lower)?;
				},
				([], [upper]) => {
					s.push('+');
					push_type_signature(s, upper)?;
				},
				_ => bail!("wildcard with lower bounds {lower:?} and upper bounds {upper:?} is not supported"),
			}
		},
		JavaType::Array(component) if !component.is_raw() => {
			s.push('[');
			push_type_signature(s, component)?;
		},
		ty => push_descriptor(s, ty)?,
	}
	Ok(())
}

/// The signature of a type, like `Ljava/util/List<+TT;>;`. For erased types this is the descriptor.
pub fn type_signature(ty: &JavaType) -> Result<String> {
	let mut s = String::new();
	push_type_signature(&mut s, ty)
		.with_context(|| anyhow!("failed to make signature of {ty:?}"))?;
	Ok(s)
}

fn push_type_parameters(s: &mut String, type_parameters: &[TypeParameter]) -> Result<()> {
	if type_parameters.is_empty() {
		return Ok(());
	}

	s.push('<');
	for type_parameter in type_parameters {
		s.push_str(&type_parameter.name);

		if type_parameter.bounds.is_empty() {
			s.push(':');
			push_descriptor(s, &JavaType::class(JAVA_LANG_OBJECT))?;
		}
		for (i, bound) in type_parameter.bounds.iter().enumerate() {
			// an interface as first bound leaves the class bound empty
			if i == 0 && matches!(bound, JavaType::Class { interface: true, .. }) {
				s.push(':');
			}
			s.push(':');
			push_type_signature(s, bound)
				.with_context(|| anyhow!("failed to write bound of type parameter {:?}", type_parameter.name))?;
		}
	}
	s.push('>');
	Ok(())
}

/// The `Signature` of a class, or `None` if the class isn't generic.
///
/// A class is generic if it has type parameters, or its super class or one of its interfaces has type arguments.
pub fn class_signature(class: &impl ClassMetadata) -> Result<Option<String>> {
	let mut s = String::new();
	let mut generic = !class.type_parameters().is_empty();

	push_type_parameters(&mut s, class.type_parameters())?;

	match (class.generic_super_class(), class.super_class()) {
		(Some(super_class), _) => {
			generic |= !super_class.is_raw();
			push_type_signature(&mut s, super_class).context("failed to write super class")?;
		},
		(None, Some(super_class)) if !class.is_interface() => push_descriptor(&mut s, &JavaType::class(super_class))?,
		(None, _) => push_descriptor(&mut s, &JavaType::class(JAVA_LANG_OBJECT))?,
	}

	if class.generic_interfaces().is_empty() {
		for interface in class.interfaces() {
			push_descriptor(&mut s, &JavaType::class(interface.as_str()))?;
		}
	} else {
		for interface in class.generic_interfaces() {
			generic |= !interface.is_raw();
			push_type_signature(&mut s, interface).context("failed to write interface")?;
		}
	}

	Ok(generic.then_some(s))
}

/// The `Signature` of a method or constructor, or `None` if nothing about it is generic.
pub fn method_signature(method: &GenericMethod) -> Result<Option<String>> {
	let mut s = String::new();
	let mut generic = !method.type_parameters.is_empty();

	push_type_parameters(&mut s, &method.type_parameters)?;

	s.push('(');
	for parameter in &method.parameters {
		generic |= !parameter.is_raw();
		push_type_signature(&mut s, parameter)?;
	}
	s.push(')');

	generic |= !method.return_type.is_raw();
	push_type_signature(&mut s, &method.return_type)?;

	for exception in &method.exceptions {
		generic |= !exception.is_raw();
		s.push('^');
		push_type_signature(&mut s, exception)?;
	}

	Ok(generic.then_some(s))
}
