use std::io::Write;
use anyhow::{Context, Result};
use class_image::reader::{RawAttribute, RawClass, RawMember, RawPoolEntry};
use class_image::PoolEntry;

fn constant(class: &RawClass, entry: &RawPoolEntry) -> Result<String> {
	Ok(match entry {
		RawPoolEntry::Known(PoolEntry::Integer { bytes }) => bytes.to_string(),
		RawPoolEntry::Known(PoolEntry::Long { bytes }) => format!("{bytes}L"),
		RawPoolEntry::Known(PoolEntry::Float { bytes }) => format!("{}F", f32::from_bits(*bytes)),
		RawPoolEntry::Known(PoolEntry::Double { bytes }) => format!("{}D", f64::from_bits(*bytes)),
		RawPoolEntry::Known(PoolEntry::String { string_index }) => format!("{:?}", class.utf8(*string_index)?),
		entry => format!("{entry:?}"),
	})
}

fn attribute(class: &RawClass, out: &mut impl Write, indent: &str, attribute: &RawAttribute) -> Result<()> {
	match attribute.name.as_str() {
		"Code" => {
			let code = class.code(attribute)?;
			writeln!(out, "{indent}Code: max_stack {}, max_locals {}, {} bytes", code.max_stack, code.max_locals, code.code.len())?;
		},
		"Signature" => writeln!(out, "{indent}Signature: {}", class.signature(attribute)?)?,
		"Exceptions" => writeln!(out, "{indent}Exceptions: {}", class.exceptions(attribute)?.join(", "))?,
		"ConstantValue" => writeln!(out, "{indent}ConstantValue: {}", constant(class, class.constant_value(attribute)?)?)?,
		"InnerClasses" => {
			writeln!(out, "{indent}InnerClasses:")?;
			for inner in class.inner_classes(attribute)? {
				writeln!(out, "{indent}\t{} in {} as {} (access {:#06x})",
					inner.inner_class,
					inner.outer_class.as_deref().unwrap_or("-"),
					inner.inner_name.as_deref().unwrap_or("-"),
					inner.access,
				)?;
			}
		},
		"RuntimeVisibleAnnotations" => {
			writeln!(out, "{indent}RuntimeVisibleAnnotations:")?;
			for annotation in class.runtime_visible_annotations(attribute)? {
				writeln!(out, "{indent}\t{annotation:?}")?;
			}
		},
		"AnnotationDefault" => writeln!(out, "{indent}AnnotationDefault: {:?}", class.annotation_default(attribute)?)?,
		name => writeln!(out, "{indent}{name}: {} bytes", attribute.info.len())?,
	}
	Ok(())
}

fn member(class: &RawClass, out: &mut impl Write, kind: &str, member: &RawMember) -> Result<()> {
	let (name, descriptor) = class.name_and_descriptor(member)?;
	writeln!(out, "{kind} {name} {descriptor} (access {:#06x})", member.access)?;
	for a in &member.attributes {
		attribute(class, out, "\t", a)
			.with_context(|| format!("failed to dump attribute {:?} of {kind} {name} {descriptor}", a.name))?;
	}
	Ok(())
}

/// Writes a human readable view of the class file.
pub(crate) fn dump(class: &RawClass, out: &mut impl Write) -> Result<()> {
	writeln!(out, "class {} (access {:#06x})", class.class_name()?, class.access)?;
	writeln!(out, "version {}.{}", class.version.major, class.version.minor)?;
	writeln!(out, "pool count {}", class.pool_count())?;
	writeln!(out, "super class {}", class.super_class_name()?.unwrap_or("-"))?;
	for interface in class.interface_names()? {
		writeln!(out, "interface {interface}")?;
	}
	for a in &class.attributes {
		attribute(class, out, "", a)
			.with_context(|| format!("failed to dump class attribute {:?}", a.name))?;
	}
	for field in &class.fields {
		member(class, out, "field", field)?;
	}
	for method in &class.methods {
		member(class, out, "method", method)?;
	}
	Ok(())
}
