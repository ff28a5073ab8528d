//! Traits at the seams between file formats, the locator and the cache.

use std::{
    fs::File,
    io::{BufWriter, Cursor, Read, Write},
    path::{Path, PathBuf},
};

use crate::{error::Error, types::TypedValue};

/// A trait for reading and writing one resource file.
///
/// # Example
///
/// ```rust,no_run
/// use propkit::{properties::PropertiesFile, traits::Parser};
/// let file = PropertiesFile::read_from("resources/config/ui.properties")?;
/// file.write_to("ui_copy.properties")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from raw bytes read out of any reader.
    fn from_reader<R: Read>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(path),
            _ => Error::Io(e),
        })?;
        Self::from_reader(file)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.to_writer(writer)
    }

    /// Parse from already decoded text.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(bytes))
    }
}

/// Supplies the value of a UI config key, used to look up i18n path templates.
pub trait TemplateSource {
    fn template_value(&self, key: &str) -> Result<Option<TypedValue>, Error>;
}

/// Resolves a `classpath`-relative path to an existing absolute file.
pub trait FileResolver {
    fn resolve_file(&self, relative_path: &str) -> Result<PathBuf, Error>;
}
