//! The bodies of stub methods.
//!
//! A stub body creates a new exception with a fixed message and throws it. There is no general bytecode assembly here.

use anyhow::Result;
use crate::attribute::CodeAttribute;
use crate::class_constants::opcode;
use crate::pool::ConstantPool;

/// The operand stack depth [`throw_body`] needs: the new exception, its duplicate and the message.
pub const THROW_BODY_MAX_STACK: u16 = 3;

/// Gives the bytecode of
/// ```text
/// new #exception_class
/// dup
/// ldc_w #message
/// invokespecial #constructor
/// athrow
/// ```
/// where `exception_class` is a `Class`, `message` a `String` and `constructor` a `MethodRef` pool index.
pub fn throw_body(exception_class: u16, message: u16, constructor: u16) -> Vec<u8> {
	let [class_hi, class_lo] = exception_class.to_be_bytes();
	let [message_hi, message_lo] = message.to_be_bytes();
	let [constructor_hi, constructor_lo] = constructor.to_be_bytes();
	vec![
		opcode::new, class_hi, class_lo,
		opcode::dup,
		opcode::ldc_w, message_hi, message_lo,
		opcode::invokespecial, constructor_hi, constructor_lo,
		opcode::athrow,
	]
}

/// Interns what [`throw_body`] refers to and wraps the body into a `Code` attribute.
///
/// The constructor called is `exception_class.<init>(Ljava/lang/String;)V`. `max_locals` must cover `this` and the
/// parameters of the method the code is for.
pub fn throwing_code(pool: &mut ConstantPool, exception_class: &str, message: &str, max_locals: u16) -> Result<CodeAttribute> {
	let class = pool.put_class(exception_class)?;
	let message = pool.put_string(message)?;
	let constructor = pool.put_method_ref(exception_class, "<init>", "(Ljava/lang/String;)V")?;

	CodeAttribute::new(pool, THROW_BODY_MAX_STACK, max_locals, throw_body(class, message, constructor))
}
