use anyhow::Result;
use pretty_assertions::assert_eq;
use class_image::reader::{RawClass, RawInnerClass, RawPoolEntry};
use class_image::{ElementValue, flags, PoolEntry, Version};
use stubgen::model::{ClassDescription, read_descriptions};
use stubgen::{generate_stub, StubOptions};

fn class(json: &str) -> Result<ClassDescription> {
	let mut classes = read_descriptions(format!("[{json}]").as_bytes())?;
	Ok(classes.remove(0))
}

fn stub(json: &str) -> Result<RawClass> {
	let bytes = generate_stub(&class(json)?, &StubOptions::default())?;
	RawClass::read(&mut bytes.as_slice())
}

fn attribute_names(attributes: &[class_image::reader::RawAttribute]) -> Vec<&str> {
	attributes.iter().map(|a| a.name.as_str()).collect()
}

#[test]
fn generic_class() -> Result<()> {
	let class = stub(r#"{
		"name": "com.example.Box",
		"super_class": "java.lang.Object",
		"interfaces": ["java.lang.Comparable"],
		"modifiers": ["public", "final"],
		"deprecated": true,
		"type_parameters": [{ "name": "T" }],
		"generic_interfaces": [
			{ "parameterized": { "raw": "java.lang.Comparable", "arguments": [
				{ "parameterized": { "raw": "com.example.Box", "arguments": [{ "type_variable": "T" }] } }
			] } }
		],
		"constructors": [
			{
				"modifiers": ["public"],
				"parameters": [{ "class": { "name": "java.lang.Object" } }],
				"generic": { "parameters": [{ "type_variable": "T" }] }
			},
			{
				"modifiers": ["private"],
				"parameters": []
			},
			{
				"modifiers": ["protected"],
				"parameters": [{ "primitive": "long" }, { "array": { "class": { "name": "java.lang.String" } } }],
				"varargs": true,
				"exceptions": ["java.io.IOException"]
			}
		],
		"methods": [
			{
				"name": "get",
				"modifiers": ["public"],
				"return_type": { "class": { "name": "java.lang.Object" } },
				"generic": { "return_type": { "type_variable": "T" } }
			},
			{
				"name": "helper",
				"modifiers": ["private", "static"]
			},
			{
				"name": "compareTo",
				"modifiers": ["public"],
				"parameters": [{ "class": { "name": "java.lang.Object" } }],
				"return_type": { "primitive": "int" },
				"bridge": true,
				"synthetic": true,
				"deprecated": true
			}
		],
		"fields": [
			{ "name": "MAX", "modifiers": ["public", "static", "final"], "type": { "primitive": "int" }, "constant_value": { "int": 10 } },
			{ "name": "serialVersionUID", "modifiers": ["private", "static", "final"], "type": { "primitive": "long" }, "constant_value": { "long": 1 } },
			{ "name": "count", "modifiers": ["private"], "type": { "primitive": "int" } },
			{
				"name": "names",
				"modifiers": ["protected"],
				"type": { "class": { "name": "java.util.List" } },
				"generic_type": { "parameterized": { "raw": "java.util.List", "arguments": [{ "class": { "name": "java.lang.String" } }] } }
			}
		]
	}"#)?;

	assert_eq!(class.version, Version::V1_5);
	assert_eq!(class.class_name()?, "com/example/Box");
	assert_eq!(class.super_class_name()?, Some("java/lang/Object"));
	assert_eq!(class.interface_names()?, ["java/lang/Comparable"]);
	assert_eq!(class.access, flags::ACC_PUBLIC | flags::ACC_FINAL);

	assert_eq!(attribute_names(&class.attributes), ["Signature", "Deprecated"]);
	assert_eq!(
		class.signature(&class.attributes[0])?,
		"<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<Lcom/example/Box<TT;>;>;",
	);

	let methods = class.methods.iter()
		.map(|method| class.name_and_descriptor(method))
		.collect::<Result<Vec<_>>>()?;
	assert_eq!(methods, [
		("<init>", "(Ljava/lang/Object;)V"),
		("<init>", "(J[Ljava/lang/String;)V"),
		("get", "()Ljava/lang/Object;"),
		("compareTo", "(Ljava/lang/Object;)I"),
	]);

	let constructor = &class.methods[0];
	assert_eq!(constructor.access, flags::ACC_PUBLIC);
	assert_eq!(attribute_names(&constructor.attributes), ["Code", "Signature"]);
	assert_eq!(class.signature(&constructor.attributes[1])?, "(TT;)V");
	let code = class.code(&constructor.attributes[0])?;
	assert_eq!(code.max_stack, 3);
	assert_eq!(code.max_locals, 3);
	assert_eq!(code.code.len(), 11);
	// the operand of `new`
	let exception_class = u16::from_be_bytes([code.code[1], code.code[2]]);
	assert_eq!(class.class(exception_class)?, "java/lang/UnsatisfiedLinkError");
	// the operand of `ldc_w`
	let message = u16::from_be_bytes([code.code[5], code.code[6]]);
	let &RawPoolEntry::Known(PoolEntry::String { string_index }) = class.entry(message)? else {
		panic!("ldc_w should load a string");
	};
	assert_eq!(class.utf8(string_index)?, StubOptions::default().message);

	let constructor = &class.methods[1];
	assert_eq!(constructor.access, flags::ACC_PROTECTED | flags::ACC_VARARGS);
	assert_eq!(attribute_names(&constructor.attributes), ["Code", "Exceptions"]);
	assert_eq!(class.code(&constructor.attributes[0])?.max_locals, 5);
	assert_eq!(class.exceptions(&constructor.attributes[1])?, ["java/io/IOException"]);

	let get = &class.methods[2];
	assert_eq!(get.access, flags::ACC_PUBLIC | flags::ACC_NATIVE);
	assert_eq!(attribute_names(&get.attributes), ["Signature"]);
	assert_eq!(class.signature(&get.attributes[0])?, "()TT;");

	let compare_to = &class.methods[3];
	assert_eq!(compare_to.access, flags::ACC_PUBLIC | flags::ACC_NATIVE | flags::ACC_BRIDGE | flags::ACC_SYNTHETIC);
	assert_eq!(attribute_names(&compare_to.attributes), ["Deprecated"]);

	let fields = class.fields.iter()
		.map(|field| class.name_and_descriptor(field))
		.collect::<Result<Vec<_>>>()?;
	assert_eq!(fields, [
		("MAX", "I"),
		("serialVersionUID", "J"),
		("names", "Ljava/util/List;"),
	]);

	let max = class.field("MAX")?.expect("MAX should be kept");
	assert_eq!(class.constant_value(&max.attributes[0])?, &RawPoolEntry::Known(PoolEntry::Integer { bytes: 10 }));
	let uid = class.field("serialVersionUID")?.expect("serialVersionUID should be kept");
	assert_eq!(uid.access, flags::ACC_PRIVATE | flags::ACC_STATIC | flags::ACC_FINAL);
	assert_eq!(class.constant_value(&uid.attributes[0])?, &RawPoolEntry::Known(PoolEntry::Long { bytes: 1 }));
	let names = class.field("names")?.expect("names should be kept");
	assert_eq!(attribute_names(&names.attributes), ["Signature"]);
	assert_eq!(class.signature(&names.attributes[0])?, "Ljava/util/List<Ljava/lang/String;>;");

	Ok(())
}

#[test]
fn enum_fields() -> Result<()> {
	let class = stub(r#"{
		"name": "a.Color",
		"super_class": "java.lang.Enum",
		"modifiers": ["public", "final"],
		"enum": true,
		"fields": [
			{ "name": "RED", "modifiers": ["public", "static", "final"], "type": { "class": { "name": "a.Color" } }, "enum_constant": true },
			{ "name": "access$000", "modifiers": ["protected", "static"], "type": { "primitive": "int" }, "synthetic": true },
			{ "name": "$VALUES", "modifiers": ["private", "static", "final"], "type": { "array": { "class": { "name": "a.Color" } } }, "synthetic": true }
		]
	}"#)?;

	assert_eq!(class.access, flags::ACC_PUBLIC | flags::ACC_FINAL | flags::ACC_ENUM);

	let red = class.field("RED")?.expect("RED should be kept");
	assert_eq!(red.access, flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_FINAL | flags::ACC_ENUM);
	assert!(red.attributes.is_empty());

	let accessor = class.field("access$000")?.expect("access$000 should be kept");
	assert_eq!(accessor.access, flags::ACC_PROTECTED | flags::ACC_STATIC | flags::ACC_SYNTHETIC);

	assert_eq!(class.field("$VALUES")?, None);
	assert_eq!(class.fields.len(), 2);

	Ok(())
}

#[test]
fn nested_annotation() -> Result<()> {
	let class = stub(r#"{
		"name": "a.Outer$Marker",
		"interfaces": ["java.lang.annotation.Annotation"],
		"modifiers": ["public", "static", "interface", "abstract"],
		"annotation": true,
		"declaring_class": "a.Outer",
		"methods": [
			{
				"name": "value",
				"modifiers": ["public", "abstract"],
				"return_type": { "primitive": "int" },
				"default_value": { "int": 5 }
			}
		]
	}"#)?;

	assert_eq!(class.access, flags::ACC_PUBLIC | flags::ACC_INTERFACE | flags::ACC_ABSTRACT | flags::ACC_ANNOTATION);
	assert_eq!(class.super_class_name()?, Some("java/lang/Object"));

	assert_eq!(attribute_names(&class.attributes), ["RuntimeVisibleAnnotations", "InnerClasses"]);
	let annotations = class.runtime_visible_annotations(&class.attributes[0])?;
	assert_eq!(annotations.len(), 1);
	assert_eq!(annotations[0].type_name, "Ljava/lang/annotation/Retention;");
	assert_eq!(annotations[0].pairs[0].value, ElementValue::Enum {
		type_name: "Ljava/lang/annotation/RetentionPolicy;".to_owned(),
		const_name: "RUNTIME".to_owned(),
	});

	assert_eq!(class.inner_classes(&class.attributes[1])?, [RawInnerClass {
		inner_class: "a/Outer$Marker".to_owned(),
		outer_class: Some("a/Outer".to_owned()),
		inner_name: Some("Marker".to_owned()),
		access: flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_INTERFACE | flags::ACC_ABSTRACT | flags::ACC_ANNOTATION,
	}]);

	let value = class.method("value", "()I")?.expect("value should exist");
	assert_eq!(value.access, flags::ACC_PUBLIC | flags::ACC_ABSTRACT);
	assert_eq!(attribute_names(&value.attributes), ["AnnotationDefault"]);
	assert_eq!(class.annotation_default(&value.attributes[0])?, ElementValue::Int(5));

	Ok(())
}

#[test]
fn protected_nested_class_becomes_public() -> Result<()> {
	let class = stub(r#"{
		"name": "a.Outer$Inner",
		"super_class": "java.lang.Object",
		"modifiers": ["protected", "static", "final"],
		"declaring_class": "a.Outer"
	}"#)?;

	assert_eq!(class.access, flags::ACC_PUBLIC | flags::ACC_FINAL);
	assert_eq!(attribute_names(&class.attributes), ["InnerClasses"]);
	assert_eq!(class.inner_classes(&class.attributes[0])?[0].access, flags::ACC_PROTECTED | flags::ACC_STATIC | flags::ACC_FINAL);

	let class = stub(r#"{
		"name": "a.Outer$Hidden",
		"super_class": "java.lang.Object",
		"modifiers": ["private"],
		"declaring_class": "a.Outer"
	}"#)?;
	assert_eq!(class.access, 0);

	Ok(())
}

#[test]
fn declared_classes() -> Result<()> {
	let class = stub(r#"{
		"name": "a.Outer",
		"super_class": "java.lang.Object",
		"modifiers": ["public"],
		"declared_classes": [
			{ "name": "a.Outer$Public", "modifiers": ["public", "static"] },
			{ "name": "a.Outer$Private", "modifiers": ["private"] },
			{ "name": "a.Outer$Kind", "modifiers": ["protected", "static", "final"], "enum": true }
		]
	}"#)?;

	assert_eq!(attribute_names(&class.attributes), ["InnerClasses"]);
	assert_eq!(class.inner_classes(&class.attributes[0])?, [
		RawInnerClass {
			inner_class: "a/Outer$Public".to_owned(),
			outer_class: Some("a/Outer".to_owned()),
			inner_name: Some("Public".to_owned()),
			access: flags::ACC_PUBLIC | flags::ACC_STATIC,
		},
		RawInnerClass {
			inner_class: "a/Outer$Kind".to_owned(),
			outer_class: Some("a/Outer".to_owned()),
			inner_name: Some("Kind".to_owned()),
			access: flags::ACC_PROTECTED | flags::ACC_STATIC | flags::ACC_FINAL | flags::ACC_ENUM,
		},
	]);

	Ok(())
}

#[test]
fn options() -> Result<()> {
	let class = class(r#"{
		"name": "A",
		"super_class": "java.lang.Object",
		"modifiers": ["public"],
		"constructors": [{ "modifiers": ["public"] }]
	}"#)?;
	let options = StubOptions {
		version: Version::new(50, 0),
		exception_class: "java/lang/UnsupportedOperationException".to_owned(),
		message: "nope".to_owned(),
	};

	let bytes = generate_stub(&class, &options)?;
	let class = RawClass::read(&mut bytes.as_slice())?;

	assert_eq!(class.version, Version::V1_6);
	let constructor = class.method("<init>", "()V")?.expect("constructor should exist");
	let code = class.code(&constructor.attributes[0])?;
	assert_eq!(code.max_locals, 1);
	let exception_class = u16::from_be_bytes([code.code[1], code.code[2]]);
	assert_eq!(class.class(exception_class)?, "java/lang/UnsupportedOperationException");

	Ok(())
}

#[test]
fn unsupported_shapes_fail() -> Result<()> {
	let owner = class(r#"{
		"name": "a.B",
		"super_class": "a.Outer$Inner",
		"generic_super_class": { "parameterized": {
			"raw": "a.Outer$Inner",
			"owner": { "parameterized": { "raw": "a.Outer", "arguments": [{ "class": { "name": "java.lang.String" } }] } },
			"arguments": []
		} }
	}"#)?;
	assert!(generate_stub(&owner, &StubOptions::default()).is_err());

	let wildcard = class(r#"{
		"name": "a.B",
		"super_class": "java.lang.Object",
		"methods": [{
			"name": "m",
			"modifiers": ["public"],
			"parameters": [{ "class": { "name": "java.util.List" } }],
			"generic": {
				"parameters": [{ "parameterized": { "raw": "java.util.List", "arguments": [
					{ "wildcard": { "upper": [{ "class": { "name": "java.lang.Number" } }, { "class": { "name": "java.lang.Runnable", "interface": true } }] } }
				] } }]
			}
		}]
	}"#)?;
	assert!(generate_stub(&wildcard, &StubOptions::default()).is_err());

	let nested_annotation = class(r#"{
		"name": "a.B",
		"modifiers": ["public", "interface", "abstract"],
		"annotation": true,
		"methods": [{
			"name": "m",
			"modifiers": ["public", "abstract"],
			"return_type": { "class": { "name": "a.C" } },
			"default_value": { "annotation": { "type_name": "La/C;" } }
		}]
	}"#)?;
	assert!(generate_stub(&nested_annotation, &StubOptions::default()).is_err());

	// but a private method with unsupported shapes is skipped before anything is checked
	let skipped = class(r#"{
		"name": "a.B",
		"super_class": "java.lang.Object",
		"methods": [{
			"name": "m",
			"modifiers": ["private"],
			"parameters": [{ "type_variable": "T" }]
		}]
	}"#)?;
	assert!(generate_stub(&skipped, &StubOptions::default()).is_ok());

	Ok(())
}
