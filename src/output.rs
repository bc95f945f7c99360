use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use zip::write::FileOptions;
use zip::ZipWriter;

/// A generated class file, named by its internal name.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Stub {
	pub(crate) internal_name: String,
	pub(crate) bytes: Vec<u8>,
}

impl Stub {
	/// The path of the class file inside a jar or directory, like `com/example/Foo.class`.
	pub(crate) fn file_name(&self) -> String {
		format!("{}.class", self.internal_name)
	}
}

/// Where the stubs get written to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Output {
	Directory(PathBuf),
	Jar(PathBuf),
}

impl Output {
	/// Paths ending in `.jar` are jars, everything else is a directory.
	pub(crate) fn new(path: PathBuf) -> Output {
		if path.extension().is_some_and(|extension| extension == "jar") {
			Output::Jar(path)
		} else {
			Output::Directory(path)
		}
	}

	pub(crate) fn write(&self, stubs: &[Stub]) -> Result<()> {
		match self {
			Output::Directory(path) => write_directory(path, stubs),
			Output::Jar(path) => {
				if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
					std::fs::create_dir_all(parent)
						.with_context(|| anyhow!("failed to create directory {parent:?}"))?;
				}
				let file = File::create(path)
					.with_context(|| anyhow!("failed to create jar {path:?}"))?;
				write_jar(file, stubs)
					.with_context(|| anyhow!("failed to write jar {path:?}"))?;
				info!("wrote {} stubs to {path:?}", stubs.len());
				Ok(())
			},
		}
	}
}

fn write_directory(directory: &Path, stubs: &[Stub]) -> Result<()> {
	for stub in stubs {
		let path = directory.join(stub.file_name());
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.with_context(|| anyhow!("failed to create directory {parent:?}"))?;
		}
		debug!("writing {path:?}");
		std::fs::write(&path, &stub.bytes)
			.with_context(|| anyhow!("failed to write {path:?}"))?;
	}
	info!("wrote {} stubs to {directory:?}", stubs.len());
	Ok(())
}

pub(crate) fn write_jar<W: Write + Seek>(writer: W, stubs: &[Stub]) -> Result<W> {
	let mut zip = ZipWriter::new(writer);

	for stub in stubs {
		debug!("adding {:?}", stub.file_name());
		zip.start_file(stub.file_name(), FileOptions::<()>::default())?;
		zip.write_all(&stub.bytes)?;
	}

	Ok(zip.finish()?)
}

#[cfg(test)]
mod testing {
	use std::io::{Cursor, Read};
	use std::path::PathBuf;
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use zip::ZipArchive;
	use crate::output::{Output, Stub, write_jar};

	#[test]
	fn output_kind() {
		assert_eq!(Output::new(PathBuf::from("out/stubs.jar")), Output::Jar(PathBuf::from("out/stubs.jar")));
		assert_eq!(Output::new(PathBuf::from("out/classes")), Output::Directory(PathBuf::from("out/classes")));
		assert_eq!(Output::new(PathBuf::from("out.jar.d")), Output::Directory(PathBuf::from("out.jar.d")));
	}

	#[test]
	fn jar() -> Result<()> {
		let stubs = [
			Stub { internal_name: "com/example/Foo".to_owned(), bytes: vec![0xca, 0xfe, 0xba, 0xbe] },
			Stub { internal_name: "Bar".to_owned(), bytes: vec![1, 2, 3] },
		];

		let cursor = write_jar(Cursor::new(Vec::new()), &stubs)?;
		let mut jar = ZipArchive::new(cursor)?;

		assert_eq!(jar.len(), 2);
		for stub in &stubs {
			let mut bytes = Vec::new();
			jar.by_name(&stub.file_name())?.read_to_end(&mut bytes)?;
			assert_eq!(bytes, stub.bytes);
		}
		Ok(())
	}
}
