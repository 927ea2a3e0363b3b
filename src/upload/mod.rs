pub mod model;

pub use model::{format_file_size, select_file, FileKind, UploadForm, UploadedFile};
