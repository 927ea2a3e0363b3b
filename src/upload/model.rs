use crate::jobs::FileInfo;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static DATASET_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(zip|tar|tar\.gz)$").expect("dataset extension pattern"));
static MODEL_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(h5|keras)$").expect("model extension pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Dataset,
    Model,
}

impl FileKind {
    fn pattern(&self) -> &'static Regex {
        match self {
            FileKind::Dataset => &*DATASET_EXT,
            FileKind::Model => &*MODEL_EXT,
        }
    }

    /// 界面提示用的扩展名列表
    pub fn accepted(&self) -> &'static str {
        match self {
            FileKind::Dataset => ".zip, .tar, .tar.gz",
            FileKind::Model => ".h5, .keras",
        }
    }

    /// 只看文件名后缀，不检查内容
    pub fn accepts(&self, file_name: &str) -> bool {
        self.pattern().is_match(file_name)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Dataset => f.write_str("dataset"),
            FileKind::Model => f.write_str("model"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{name} is not an accepted {kind} file (expected {expected})")]
    WrongType {
        kind: FileKind,
        name: String,
        expected: &'static str,
    },
    #[error("{0} is not a regular file")]
    NotAFile(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 已选中的本地文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            size: self.size,
            mime: self.mime.clone(),
        }
    }
}

fn guess_mime(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".zip") {
        "application/zip"
    } else if lower.ends_with(".tar.gz") {
        "application/gzip"
    } else if lower.ends_with(".tar") {
        "application/x-tar"
    } else if lower.ends_with(".h5") {
        "application/x-hdf5"
    } else {
        "application/octet-stream"
    }
}

/// 选择文件：校验后缀并读取 metadata，文件内容从不读取
pub fn select_file(kind: FileKind, path: impl AsRef<Path>) -> Result<UploadedFile, UploadError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !kind.accepts(&name) {
        return Err(UploadError::WrongType {
            kind,
            name,
            expected: kind.accepted(),
        });
    }

    let meta = std::fs::metadata(path).map_err(|source| UploadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if !meta.is_file() {
        return Err(UploadError::NotAFile(path.display().to_string()));
    }

    Ok(UploadedFile {
        mime: guess_mime(&name).to_string(),
        name,
        size: meta.len(),
        path: path.to_path_buf(),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub job_name: String,
    pub dataset: Option<UploadedFile>,
    pub model: Option<UploadedFile>,
}

impl UploadForm {
    pub fn set_file(&mut self, kind: FileKind, file: UploadedFile) {
        match kind {
            FileKind::Dataset => self.dataset = Some(file),
            FileKind::Model => self.model = Some(file),
        }
    }

    pub fn remove_file(&mut self, kind: FileKind) {
        match kind {
            FileKind::Dataset => self.dataset = None,
            FileKind::Model => self.model = None,
        }
    }

    pub fn can_create(&self) -> bool {
        self.dataset.is_some() && self.model.is_some() && !self.job_name.trim().is_empty()
    }

    /// 提交用的 (name, dataset, model)，条件不满足时为 None
    pub fn submission(&self) -> Option<(String, FileInfo, FileInfo)> {
        if !self.can_create() {
            return None;
        }
        let dataset = self.dataset.as_ref()?.info();
        let model = self.model.as_ref()?.info();
        Some((self.job_name.trim().to_string(), dataset, model))
    }
}

/// 0 Bytes / 1.5 KB / 2.25 MB，1024 进制，最多两位小数
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, bytes: usize) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mleval-upload-{}", rand::random::<u32>()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; bytes]).unwrap();
        path
    }

    #[test]
    fn extensions_are_matched_case_insensitively() {
        assert!(FileKind::Dataset.accepts("images.ZIP"));
        assert!(FileKind::Dataset.accepts("images.tar.gz"));
        assert!(FileKind::Dataset.accepts("images.tar"));
        assert!(!FileKind::Dataset.accepts("images.gz"));
        assert!(!FileKind::Dataset.accepts("images.csv"));
        assert!(FileKind::Model.accepts("net.Keras"));
        assert!(FileKind::Model.accepts("net.h5"));
        assert!(!FileKind::Model.accepts("net.h5.bak"));
        assert!(!FileKind::Model.accepts("net.pt"));
    }

    #[test]
    fn extension_patterns_are_compiled_once() {
        assert!(std::ptr::eq(FileKind::Dataset.pattern(), FileKind::Dataset.pattern()));
        assert!(std::ptr::eq(FileKind::Model.pattern(), FileKind::Model.pattern()));
        assert!(!std::ptr::eq(FileKind::Dataset.pattern(), FileKind::Model.pattern()));
    }

    #[test]
    fn select_reads_metadata_only() {
        let path = temp_file("train.tar.gz", 2048);
        let file = select_file(FileKind::Dataset, &path).unwrap();
        assert_eq!(file.name, "train.tar.gz");
        assert_eq!(file.size, 2048);
        assert_eq!(file.mime, "application/gzip");
        assert_eq!(file.info().name, "train.tar.gz");
    }

    #[test]
    fn select_rejects_wrong_kind_before_touching_disk() {
        let err = select_file(FileKind::Model, "/definitely/missing/data.zip").unwrap_err();
        assert!(matches!(err, UploadError::WrongType { kind: FileKind::Model, .. }));

        let err = select_file(FileKind::Model, "/definitely/missing/model.h5").unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }

    #[test]
    fn create_needs_both_files_and_a_name() {
        let file = UploadedFile {
            name: "a.zip".into(),
            size: 1,
            mime: "application/zip".into(),
            path: PathBuf::from("a.zip"),
        };
        let mut form = UploadForm::default();
        assert!(!form.can_create());

        form.set_file(FileKind::Dataset, file.clone());
        form.set_file(FileKind::Model, file);
        assert!(!form.can_create());

        form.job_name = "   ".into();
        assert!(!form.can_create());
        assert!(form.submission().is_none());

        form.job_name = "  Baseline run ".into();
        assert!(form.can_create());
        assert_eq!(form.submission().unwrap().0, "Baseline run");

        form.remove_file(FileKind::Model);
        assert!(!form.can_create());
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2_359_296), "2.25 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
