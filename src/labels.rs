// Class names artifact: the ordered label vocabulary of the classifier
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Index;
use std::path::Path;

use thiserror::Error;
use npyz::WriterBuilder;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("failed to access class names file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON class names: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed bincode class names: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("failed to encode class names: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("malformed numpy class names: {0}")]
    Npy(#[source] std::io::Error),

    #[error("class names file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("class names list is empty")]
    Empty,

    #[error("class name at index {0} is blank")]
    Blank(usize),
}

/// On-disk encodings of a class names file, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    /// `.json`: a JSON array of strings.
    Json,
    /// `.bin`: a bincode `Vec<String>` (standard config).
    Bincode,
    /// `.npy`: a 1-d numpy unicode array (`<U{n}`), as written by `np.save`.
    Npy,
    /// Anything else: one label per line.
    Text,
}

impl LabelFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => LabelFormat::Json,
            Some("bin") => LabelFormat::Bincode,
            Some("npy") => LabelFormat::Npy,
            _ => LabelFormat::Text,
        }
    }
}

/// Labels index-aligned with the classifier's output positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames(Vec<String>);

impl ClassNames {
    pub fn new(names: Vec<String>) -> Result<Self, LabelError> {
        if names.is_empty() {
            return Err(LabelError::Empty);
        }
        if let Some(index) = names.iter().position(|name| name.trim().is_empty()) {
            return Err(LabelError::Blank(index));
        }
        Ok(Self(names))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LabelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&bytes, LabelFormat::from_path(path))
    }

    pub fn parse(bytes: &[u8], format: LabelFormat) -> Result<Self, LabelError> {
        let names: Vec<String> = match format {
            LabelFormat::Json => serde_json::from_slice(bytes)?,
            LabelFormat::Bincode => {
                let (names, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
                names
            }
            LabelFormat::Npy => npyz::NpyFile::new(bytes)
                .and_then(|npy| npy.into_vec::<Vec<char>>())
                .map_err(LabelError::Npy)?
                .into_iter()
                .map(|chars| {
                    // numpy pads shorter strings with NUL up to the dtype width
                    let name: String = chars.into_iter().collect();
                    name.trim_end_matches('\0').to_string()
                })
                .collect(),
            LabelFormat::Text => std::str::from_utf8(bytes)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        };
        Self::new(names)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LabelError> {
        let path = path.as_ref();
        let io_err = |source| LabelError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut file = BufWriter::new(File::create(path).map_err(io_err)?);
        match LabelFormat::from_path(path) {
            LabelFormat::Json => serde_json::to_writer_pretty(&mut file, &self.0)?,
            LabelFormat::Bincode => {
                bincode::encode_into_std_write(&self.0, &mut file, bincode::config::standard())?;
            }
            LabelFormat::Npy => self.write_npy(&mut file)?,
            LabelFormat::Text => {
                for name in &self.0 {
                    writeln!(file, "{}", name).map_err(io_err)?;
                }
            }
        }
        file.flush().map_err(io_err)
    }

    fn write_npy(&self, out: &mut impl Write) -> Result<(), LabelError> {
        let width = self.0.iter().map(|name| name.chars().count()).max().unwrap_or(1);
        let type_str: npyz::TypeStr = format!("<U{}", width).parse().map_err(|e| {
            LabelError::Npy(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{}", e),
            ))
        })?;
        let mut writer = npyz::WriteOptions::<Vec<char>>::new()
            .dtype(npyz::DType::Plain(type_str))
            .shape(&[self.0.len() as u64])
            .writer(out)
            .begin_nd()
            .map_err(LabelError::Npy)?;
        for name in &self.0 {
            writer
                .push(&name.chars().collect::<Vec<char>>())
                .map_err(LabelError::Npy)?;
        }
        writer.finish().map_err(LabelError::Npy)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl Index<usize> for ClassNames {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}
