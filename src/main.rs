use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, info, LevelFilter};
use class_image::reader::RawClass;
use class_image::Version;
use stubgen::model::{ClassMetadata, internal_name, read_descriptions};
use stubgen::{generate_stub, StubOptions};
use crate::output::{Output, Stub};

mod dump;
mod output;

#[derive(Debug, Parser)]
struct Cli {
	/// Be verbose. Use twice for even more output.
	#[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Generates stub class files from a json array of class descriptions
	Generate {
		input: PathBuf,
		/// A directory, or a file ending in `.jar`
		#[arg(short = 'o', long = "output")]
		output: PathBuf,
		/// The major class file version of the stubs
		#[arg(long = "major", default_value_t = Version::V1_5.major)]
		major: u16,
		#[arg(long = "minor", default_value_t = Version::V1_5.minor)]
		minor: u16,
		/// The internal name of the exception constructors throw
		#[arg(long = "exception-class")]
		exception_class: Option<String>,
		/// The message of the exception constructors throw
		#[arg(long = "message")]
		message: Option<String>,
	},
	/// Prints the structure of a class file
	Dump {
		class_file: PathBuf,
	},
}

fn setup_logger(verbose: u8) -> Result<()> {
	let level = match verbose {
		0 => LevelFilter::Info,
		1 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to set up logger")
}

fn generate(input: PathBuf, output: PathBuf, options: StubOptions) -> Result<()> {
	let file = File::open(&input)
		.with_context(|| anyhow!("failed to open {input:?}"))?;
	let classes = read_descriptions(BufReader::new(file))
		.with_context(|| anyhow!("failed to read class descriptions from {input:?}"))?;
	info!("generating {} stubs", classes.len());
	debug!("using {options:?}");

	// all stubs are generated before anything gets written
	let stubs = classes.iter()
		.map(|class| -> Result<Stub> {
			Ok(Stub {
				internal_name: internal_name(class.name()),
				bytes: generate_stub(class, &options)?,
			})
		})
		.collect::<Result<Vec<_>>>()?;

	Output::new(output).write(&stubs)
}

fn dump(class_file: PathBuf) -> Result<()> {
	let file = File::open(&class_file)
		.with_context(|| anyhow!("failed to open {class_file:?}"))?;
	let class = RawClass::read(&mut BufReader::new(file))
		.with_context(|| anyhow!("failed to read class file {class_file:?}"))?;
	debug!("read {:?} with {} pool entries", class.class_name()?, class.pool_count());

	dump::dump(&class, &mut std::io::stdout().lock())
}

fn main() -> Result<()> {
	let Cli { verbose, command } = Cli::parse();

	setup_logger(verbose)?;

	match command {
		Command::Generate { input, output, major, minor, exception_class, message } => {
			let defaults = StubOptions::default();
			let options = StubOptions {
				version: Version::new(major, minor),
				exception_class: exception_class.unwrap_or(defaults.exception_class),
				message: message.unwrap_or(defaults.message),
			};
			generate(input, output, options)
		},
		Command::Dump { class_file } => dump(class_file),
	}
}
