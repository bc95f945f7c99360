//! A builder for single [Java Class Files](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html).
//!
//! A [`ClassFileImage`] owns a deduplicating [`ConstantPool`]. Everything added to the image (the class name, members,
//! attributes) is interned into that pool right away, so that once the image is populated, [`ClassFileImage::write`]
//! only has to put the already resolved indices in the order the class file format demands.
//!
//! ```
//! # use anyhow::Result;
//! # fn main() -> Result<()> {
//! use class_image::{ClassFileImage, Version, flags};
//! use class_image::code::throwing_code;
//!
//! let mut image = ClassFileImage::new(flags::ACC_PUBLIC, "com/example/Foo", Some("java/lang/Object"), Version::V1_5)?;
//!
//! let code = throwing_code(image.pool_mut(), "java/lang/UnsupportedOperationException", "stub", 1)?;
//! image.add_method(flags::ACC_PUBLIC, "bar", "()V")?
//! 	.add_attribute(code);
//!
//! let bytes = image.to_bytes()?;
//! assert_eq!(&bytes[..4], &[0xca, 0xfe, 0xba, 0xbe]);
//! # Ok(())
//! # }
//! ```
//!
//! The [`reader`] module can read such a class file back, which is mostly useful for checking what was written.

pub mod attribute;
pub mod code;
pub mod reader;
mod annotation;
mod class_constants;
mod image;
mod pool;

use std::io::Read;
use anyhow::{anyhow, bail, Context, Result};

pub use annotation::{Annotation, ElementValue, ElementValuePair};
pub use class_constants::{element_value, flags, opcode};
pub use image::{ClassFileImage, Member, Version};
pub use pool::{ConstantPool, ConstantValue, PoolEntry};

trait ClassRead {
	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]>;
	fn read_u8(&mut self) -> Result<u8> {
		Ok(u8::from_be_bytes(self.read_n().context("couldn't read u8, perhaps the data's end is reached?")?))
	}
	fn read_u16(&mut self) -> Result<u16> {
		Ok(u16::from_be_bytes(self.read_n().context("couldn't read u16, perhaps the data's end is reached?")?))
	}
	fn read_u32(&mut self) -> Result<u32> {
		Ok(u32::from_be_bytes(self.read_n().context("couldn't read u32, perhaps the data's end is reached?")?))
	}
	fn read_u64(&mut self) -> Result<u64> {
		Ok(u64::from_be_bytes(self.read_n().context("couldn't read u64, perhaps the data's end is reached?")?))
	}
	fn read_i32(&mut self) -> Result<i32> {
		Ok(i32::from_be_bytes(self.read_n().context("couldn't read i32, perhaps the data's end is reached?")?))
	}
	fn read_i64(&mut self) -> Result<i64> {
		Ok(i64::from_be_bytes(self.read_n().context("couldn't read i64, perhaps the data's end is reached?")?))
	}

	fn read_u16_as_usize(&mut self) -> Result<usize> {
		Ok(self.read_u16()? as usize)
	}
	fn read_u8_vec(&mut self, size: usize) -> Result<Vec<u8>>;
	fn read_vec<T, S, E>(&mut self, get_size: S, mut get_element: E) -> Result<Vec<T>>
		where
			S: FnOnce(&mut Self) -> Result<usize>,
			E: FnMut(&mut Self) -> Result<T>
	{
		let size = get_size(self)?;
		let mut vec = Vec::with_capacity(size);
		for _ in 0..size {
			vec.push(get_element(self)?);
		}
		Ok(vec)
	}
}

impl<T: Read> ClassRead for T {
	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut buf = [0u8; N];
		self.read_exact(&mut buf)?;
		Ok(buf)
	}
	fn read_u8_vec(&mut self, size: usize) -> Result<Vec<u8>> {
		let mut vec = Vec::new();
		self.by_ref().take(size as u64).read_to_end(&mut vec)?;
		if vec.len() != size {
			bail!("expected {size} bytes, but only {} are left", vec.len());
		}
		Ok(vec)
	}
}

trait ClassWrite {
	fn write_u8(&mut self, value: u8) -> Result<()> {
		self.write_u8_slice(&[value]).context("couldn't write u8")
	}
	fn write_u16(&mut self, value: u16) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes()).context("couldn't write u16")
	}
	fn write_u32(&mut self, value: u32) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes()).context("couldn't write u32")
	}
	fn write_u64(&mut self, value: u64) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes()).context("couldn't write u64")
	}
	fn write_i32(&mut self, value: i32) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes()).context("couldn't write i32")
	}
	fn write_i64(&mut self, value: i64) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes()).context("couldn't write i64")
	}

	fn write_usize_as_u16(&mut self, value: usize) -> Result<()> {
		self.write_u16(u16::try_from(value).with_context(|| anyhow!("failed to convert {value} to u16 for writing: value too large"))?)
	}
	fn write_usize_as_u32(&mut self, value: usize) -> Result<()> {
		self.write_u32(u32::try_from(value).with_context(|| anyhow!("failed to convert {value} to u32 for writing: value too large"))?)
	}

	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()>;
	fn write_slice<'t, T>(
		&mut self,
		slice: &'t [T],
		put_size: impl FnOnce(&mut Self, usize) -> Result<()>,
		mut put_element: impl FnMut(&mut Self, &'t T) -> Result<()>
	) -> Result<()> {
		put_size(self, slice.len())?;
		for value in slice {
			put_element(self, value)?;
		}
		Ok(())
	}
}

impl<T: std::io::Write> ClassWrite for T {
	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()> {
		self.write_all(buf).context("failed to write &[u8]")
	}
}
