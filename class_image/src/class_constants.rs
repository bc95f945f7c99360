pub(crate) const MAGIC: u32 = 0xCAFE_BABE;

pub(crate) mod pool {
	pub(crate) const UTF8: u8 = 1;
	pub(crate) const INTEGER: u8 = 3;
	pub(crate) const FLOAT: u8 = 4;
	pub(crate) const LONG: u8 = 5;
	pub(crate) const DOUBLE: u8 = 6;
	pub(crate) const CLASS: u8 = 7;
	pub(crate) const STRING: u8 = 8;
	pub(crate) const FIELD_REF: u8 = 9;
	pub(crate) const METHOD_REF: u8 = 10;
	pub(crate) const INTERFACE_METHOD_REF: u8 = 11;
	pub(crate) const NAME_AND_TYPE: u8 = 12;
	pub(crate) const METHOD_HANDLE: u8 = 15;
	pub(crate) const METHOD_TYPE: u8 = 16;
	pub(crate) const DYNAMIC: u8 = 17;
	pub(crate) const INVOKE_DYNAMIC: u8 = 18;
	pub(crate) const MODULE: u8 = 19;
	pub(crate) const PACKAGE: u8 = 20;
}

pub(crate) mod attribute {
	pub(crate) const CONSTANT_VALUE: &str = "ConstantValue";
	pub(crate) const CODE: &str = "Code";
	pub(crate) const EXCEPTIONS: &str = "Exceptions";
	pub(crate) const INNER_CLASSES: &str = "InnerClasses";
	pub(crate) const SIGNATURE: &str = "Signature";
	pub(crate) const DEPRECATED: &str = "Deprecated";
	pub(crate) const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
	pub(crate) const ANNOTATION_DEFAULT: &str = "AnnotationDefault";
}

/// Access flags, as used for classes, fields, methods and inner classes.
pub mod flags {
	pub const ACC_PUBLIC: u16       = 0x0001; // class, field, method, inner class
	pub const ACC_PRIVATE: u16      = 0x0002; // field, method, inner class
	pub const ACC_PROTECTED: u16    = 0x0004; // field, method, inner class
	pub const ACC_STATIC: u16       = 0x0008; // field, method, inner class
	pub const ACC_FINAL: u16        = 0x0010; // class, field, method, inner class
	pub const ACC_SUPER: u16        = 0x0020; // class
	pub const ACC_SYNCHRONIZED: u16 = 0x0020; // method
	pub const ACC_VOLATILE: u16     = 0x0040; // field
	pub const ACC_BRIDGE: u16       = 0x0040; // method
	pub const ACC_TRANSIENT: u16    = 0x0080; // field
	pub const ACC_VARARGS: u16      = 0x0080; // method
	pub const ACC_NATIVE: u16       = 0x0100; // method
	pub const ACC_INTERFACE: u16    = 0x0200; // class, inner class
	pub const ACC_ABSTRACT: u16     = 0x0400; // class, method, inner class
	pub const ACC_STRICT: u16       = 0x0800; // method
	pub const ACC_SYNTHETIC: u16    = 0x1000; // class, field, method, inner class
	pub const ACC_ANNOTATION: u16   = 0x2000; // class, inner class
	pub const ACC_ENUM: u16         = 0x4000; // class, field, inner class
}

/// The few opcodes the stub method bodies are made of.
#[allow(non_upper_case_globals)]
pub mod opcode {
	pub const dup: u8 = 0x59;
	pub const ldc_w: u8 = 0x13;
	pub const new: u8 = 0xbb;
	pub const invokespecial: u8 = 0xb7;
	pub const athrow: u8 = 0xbf;
}

/// The `tag` item of an `element_value` structure.
pub mod element_value {
	pub const BYTE: u8 = b'B';
	pub const CHAR: u8 = b'C';
	pub const DOUBLE: u8 = b'D';
	pub const FLOAT: u8 = b'F';
	pub const INT: u8 = b'I';
	pub const LONG: u8 = b'J';
	pub const SHORT: u8 = b'S';
	pub const BOOLEAN: u8 = b'Z';
	pub const STRING: u8 = b's';
	pub const ENUM: u8 = b'e';
	pub const CLASS: u8 = b'c';
	pub const ANNOTATION: u8 = b'@';
	pub const ARRAY: u8 = b'[';
}
