pub mod convert;
pub mod pipeline;
pub mod prepare;
pub mod types;

pub use convert::{convert_in_background, convert_to_webp};
pub use pipeline::{CreatedProperty, ImageUploader};
pub use prepare::{prepare_upload, validate_file, Notice, PreparedUpload};
pub use types::{ConvertOptions, ConvertedImage, FitMode, UploadFile, MAX_UPLOAD_BYTES};
