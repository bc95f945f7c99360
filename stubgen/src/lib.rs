//! Generates stub class files from descriptions of classes.
//!
//! A stub has the same API as the class it's made from, but no implementation: constructors throw an exception and
//! methods are `native`. Stubs are meant to be compiled against.
//!
//! ```
//! # use anyhow::Result;
//! # fn main() -> Result<()> {
//! use stubgen::{generate_stub, StubOptions};
//! use stubgen::model::read_descriptions;
//!
//! let json = r#"[{ "name": "com.example.Foo", "super_class": "java.lang.Object", "modifiers": ["public"] }]"#;
//! for class in read_descriptions(json.as_bytes())? {
//! 	let bytes = generate_stub(&class, &StubOptions::default())?;
//! 	assert_eq!(&bytes[..4], &[0xca, 0xfe, 0xba, 0xbe]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod model;
pub mod signature;
mod generate;

pub use generate::{build_stub, generate_stub, StubOptions};
