use std::fmt;

use tracing::warn;

use crate::error::UploadError;
use crate::upload::types::UploadFile;

/// Something the user should be told about, without failing the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Rejected { file_name: String, reason: String },
    Duplicate { file_name: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Rejected { file_name, reason } => write!(f, "{file_name} was skipped: {reason}"),
            Notice::Duplicate { file_name } => {
                write!(f, "{file_name} was already selected and was skipped")
            }
        }
    }
}

/// Validated set of files ready for the upload pipeline
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub thumbnail: UploadFile,
    pub additional: Vec<UploadFile>,
    pub notices: Vec<Notice>,
}

impl PreparedUpload {
    pub fn file_count(&self) -> usize {
        1 + self.additional.len()
    }

    /// Thumbnail first, then the additional files in order
    pub fn into_files(self) -> impl Iterator<Item = UploadFile> {
        std::iter::once(self.thumbnail).chain(self.additional)
    }
}

pub fn validate_file(file: &UploadFile, max_bytes: usize) -> Result<(), UploadError> {
    if !file.is_image() {
        return Err(UploadError::InvalidMimeType {
            file_name: file.file_name.clone(),
            mime_type: file.content_type.clone(),
        });
    }
    if file.bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            file_name: file.file_name.clone(),
            size: file.bytes.len(),
            max_size: max_bytes,
        });
    }
    Ok(())
}

/// Validate a thumbnail and its gallery files.
///
/// A bad thumbnail fails the whole upload. Bad gallery files, and gallery
/// files named like the thumbnail, are dropped and reported in `notices`.
pub fn prepare_upload(
    thumbnail: UploadFile,
    additional: Vec<UploadFile>,
    max_bytes: usize,
) -> Result<PreparedUpload, UploadError> {
    validate_file(&thumbnail, max_bytes)?;

    let mut accepted = Vec::with_capacity(additional.len());
    let mut notices = Vec::new();

    for file in additional {
        if let Err(err) = validate_file(&file, max_bytes) {
            warn!(file = %file.file_name, "dropping invalid image: {err}");
            notices.push(Notice::Rejected {
                file_name: file.file_name.clone(),
                reason: err.to_string(),
            });
            continue;
        }
        if file.file_name == thumbnail.file_name {
            warn!(file = %file.file_name, "dropping duplicate image");
            notices.push(Notice::Duplicate {
                file_name: file.file_name,
            });
            continue;
        }
        accepted.push(file);
    }

    Ok(PreparedUpload {
        thumbnail,
        additional: accepted,
        notices,
    })
}
