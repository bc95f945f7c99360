use std::collections::hash_map::Entry;
use std::collections::HashMap;
use anyhow::{anyhow, bail, Context, Result};
use java_string::JavaString;
use log::trace;
use crate::class_constants::pool;
use crate::ClassWrite;

/// A constant pool entry, with all references to other entries already resolved to pool indices.
///
/// Two entries are the same constant iff they compare equal, which makes this the key for deduplication.
/// `Float` and `Double` store the bit pattern, so `0.0` and `-0.0` are different constants, but two NaNs with the
/// same bits are the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolEntry {
	Utf8 { string: JavaString },
	Class { name_index: u16 },
	String { string_index: u16 },
	Integer { bytes: i32 },
	Float { bytes: u32 },
	Long { bytes: i64 },
	Double { bytes: u64 },
	NameAndType { name_index: u16, descriptor_index: u16 },
	FieldRef { class_index: u16, name_and_type_index: u16 },
	MethodRef { class_index: u16, name_and_type_index: u16 },
}

impl PoolEntry {
	/// The number of pool indices this entry takes up. Long and double take up two.
	fn width(&self) -> u16 {
		if matches!(self, PoolEntry::Long { .. } | PoolEntry::Double { .. }) { 2 } else { 1 }
	}

	fn write(&self, writer: &mut impl ClassWrite) -> Result<()> {
		match self {
			PoolEntry::Utf8 { string } => {
				writer.write_u8(pool::UTF8)?;
				let vec = string.to_modified_utf8();
				writer.write_usize_as_u16(vec.len()).context("failed to write length of string")?;
				writer.write_u8_slice(&vec)?;
			},
			&PoolEntry::Class { name_index } => {
				writer.write_u8(pool::CLASS)?;
				writer.write_u16(name_index)?;
			},
			&PoolEntry::String { string_index } => {
				writer.write_u8(pool::STRING)?;
				writer.write_u16(string_index)?;
			},
			&PoolEntry::Integer { bytes } => {
				writer.write_u8(pool::INTEGER)?;
				writer.write_i32(bytes)?;
			},
			&PoolEntry::Float { bytes } => {
				writer.write_u8(pool::FLOAT)?;
				writer.write_u32(bytes)?;
			},
			&PoolEntry::Long { bytes } => {
				writer.write_u8(pool::LONG)?;
				writer.write_i64(bytes)?;
			},
			&PoolEntry::Double { bytes } => {
				writer.write_u8(pool::DOUBLE)?;
				writer.write_u64(bytes)?;
			},
			&PoolEntry::NameAndType { name_index, descriptor_index } => {
				writer.write_u8(pool::NAME_AND_TYPE)?;
				writer.write_u16(name_index)?;
				writer.write_u16(descriptor_index)?;
			},
			&PoolEntry::FieldRef { class_index, name_and_type_index } => {
				writer.write_u8(pool::FIELD_REF)?;
				writer.write_u16(class_index)?;
				writer.write_u16(name_and_type_index)?;
			},
			&PoolEntry::MethodRef { class_index, name_and_type_index } => {
				writer.write_u8(pool::METHOD_REF)?;
				writer.write_u16(class_index)?;
				writer.write_u16(name_and_type_index)?;
			},
		}
		Ok(())
	}
}

/// The value of a `ConstantValue` attribute.
///
/// `boolean`, `byte`, `short` and `char` constants are stored as `CONSTANT_Integer` entries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConstantValue {
	Boolean(bool),
	Byte(i8),
	Short(i16),
	Char(u16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	String(String),
}

/// The constant pool of a single class file.
#[derive(Debug)]
pub struct ConstantPool {
	/// The slots of the pool, indexed by pool index.
	///
	/// Slot zero and the slot after each long and double are `None`. These are never written.
	/// The length of this vec is the `constant_pool_count` of the class file and never exceeds [`u16::MAX`].
	slots: Vec<Option<PoolEntry>>,
	/// Maps an entry to its index, to give out the same index for the same constant.
	map: HashMap<PoolEntry, u16>,
}

impl Default for ConstantPool {
	fn default() -> Self {
		ConstantPool::new()
	}
}

impl ConstantPool {
	/// Creates an empty pool. The first index given out is `1`.
	pub fn new() -> ConstantPool {
		ConstantPool {
			slots: vec![None],
			map: HashMap::new(),
		}
	}

	/// The `constant_pool_count` item: one more than the largest index given out so far, counting the reserved slots.
	pub fn len(&self) -> u16 {
		// never exceeds u16::MAX, see `put`
		self.slots.len() as u16
	}

	/// Returns `true` if nothing was added yet.
	pub fn is_empty(&self) -> bool {
		self.slots.len() == 1
	}

	/// Gets the entry at a pool index. Index zero and the slots after longs and doubles have no entry.
	pub fn get(&self, index: u16) -> Option<&PoolEntry> {
		self.slots.get(index as usize)?.as_ref()
	}

	/// Iterates over all entries together with their index, in the order they were added.
	pub fn entries(&self) -> impl Iterator<Item=(u16, &PoolEntry)> {
		self.slots.iter()
			.enumerate()
			.filter_map(|(index, slot)| slot.as_ref().map(|entry| (index as u16, entry)))
	}

	/// Writes the `constant_pool_count` and then all entries.
	pub(crate) fn write(&self, writer: &mut impl ClassWrite) -> Result<()> {
		writer.write_u16(self.len())?;

		for (index, entry) in self.entries() {
			entry.write(writer)
				.with_context(|| anyhow!("failed to write constant pool entry {entry:?} at index {index}"))?;
		}

		Ok(())
	}

	fn put(&mut self, entry: PoolEntry) -> Result<u16> {
		match self.map.entry(entry) {
			Entry::Occupied(entry) => Ok(*entry.get()),
			Entry::Vacant(entry) => {
				let index = u16::try_from(self.slots.len())
					.with_context(|| anyhow!("constant pool is full, can't add pool entry {:?}", entry.key()))?;

				index.checked_add(entry.key().width())
					.with_context(|| anyhow!("pool count overflowed while adding pool entry {:?} to pool at index {}", entry.key(), index))?;

				trace!("adding pool entry {:?} at index {index}", entry.key());

				self.slots.push(Some(entry.key().clone()));
				if entry.key().width() == 2 {
					// the slot after a long or double is unusable
					self.slots.push(None);
				}
				entry.insert(index);

				Ok(index)
			},
		}
	}

	pub fn put_utf8(&mut self, value: &str) -> Result<u16> {
		let string = JavaString::from(value);

		let length = string.to_modified_utf8().len();
		if length > u16::MAX as usize {
			bail!("string of {length} bytes is too long for a constant pool entry: {:?}...", value.chars().take(32).collect::<String>());
		}

		self.put(PoolEntry::Utf8 { string })
	}

	pub fn put_class(&mut self, name: &str) -> Result<u16> {
		let name_index = self.put_utf8(name)?;
		self.put(PoolEntry::Class { name_index })
	}

	pub fn put_string(&mut self, value: &str) -> Result<u16> {
		let string_index = self.put_utf8(value)?;
		self.put(PoolEntry::String { string_index })
	}

	pub fn put_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
		let name_index = self.put_utf8(name)?;
		let descriptor_index = self.put_utf8(descriptor)?;
		self.put(PoolEntry::NameAndType { name_index, descriptor_index })
	}

	pub fn put_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
		let class_index = self.put_class(class)?;
		let name_and_type_index = self.put_name_and_type(name, descriptor)?;
		self.put(PoolEntry::FieldRef { class_index, name_and_type_index })
	}

	pub fn put_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
		let class_index = self.put_class(class)?;
		let name_and_type_index = self.put_name_and_type(name, descriptor)?;
		self.put(PoolEntry::MethodRef { class_index, name_and_type_index })
	}

	pub fn put_integer(&mut self, value: i32) -> Result<u16> {
		self.put(PoolEntry::Integer { bytes: value })
	}
	pub fn put_long(&mut self, value: i64) -> Result<u16> {
		self.put(PoolEntry::Long { bytes: value })
	}
	pub fn put_float(&mut self, value: f32) -> Result<u16> {
		self.put(PoolEntry::Float { bytes: value.to_bits() })
	}
	pub fn put_double(&mut self, value: f64) -> Result<u16> {
		self.put(PoolEntry::Double { bytes: value.to_bits() })
	}

	/// Stores a constant value, picking the pool entry kind from the kind of value.
	pub fn put_constant_value(&mut self, value: &ConstantValue) -> Result<u16> {
		match *value {
			ConstantValue::Boolean(value) => self.put_integer(i32::from(value)),
			ConstantValue::Byte(value) => self.put_integer(i32::from(value)),
			ConstantValue::Short(value) => self.put_integer(i32::from(value)),
			ConstantValue::Char(value) => self.put_integer(i32::from(value)),
			ConstantValue::Int(value) => self.put_integer(value),
			ConstantValue::Long(value) => self.put_long(value),
			ConstantValue::Float(value) => self.put_float(value),
			ConstantValue::Double(value) => self.put_double(value),
			ConstantValue::String(ref value) => self.put_string(value),
		}
	}
}
