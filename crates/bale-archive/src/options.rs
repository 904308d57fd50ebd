use std::path::{Path, PathBuf};

use crate::format::{self, Filter, Format};

/// Settings for [`crate::compress`] and [`crate::compress_paths`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompressOptions {
    pub format: Format,
    pub filter: Filter,
    pub password: Option<String>,
    pub include_root_dir: bool,
    pub out_name: Option<PathBuf>,
    pub zstd_workers: Option<u32>,
}

impl CompressOptions {
    pub fn new(format: Format, filter: Filter) -> Self {
        Self {
            format,
            filter,
            ..Self::default()
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn include_root_dir(mut self, include: bool) -> Self {
        self.include_root_dir = include;
        self
    }

    pub fn out_name(mut self, out_name: impl Into<PathBuf>) -> Self {
        self.out_name = Some(out_name.into());
        self
    }

    /// Worker threads for zstd-filtered tar output. Defaults to the number of CPUs.
    pub fn zstd_workers(mut self, workers: u32) -> Self {
        self.zstd_workers = Some(workers);
        self
    }

    pub fn password_str(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Output path: the explicit name if set, otherwise `<base name><extension>`
    /// in the current directory.
    pub fn output_for(&self, source: &Path, source_name: &Path) -> PathBuf {
        match &self.out_name {
            Some(name) if !name.as_os_str().is_empty() => name.clone(),
            _ => {
                let name = source
                    .file_name()
                    .map(Path::new)
                    .unwrap_or(source_name)
                    .to_string_lossy();
                PathBuf::from(format!(
                    "{}{}",
                    name,
                    format::extension(self.format, self.filter)
                ))
            }
        }
    }
}

/// Settings for [`crate::decompress`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompressOptions {
    pub out_dir: Option<PathBuf>,
    pub password: Option<String>,
}

impl DecompressOptions {
    pub fn out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn password_str(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Extraction base; the current directory unless set.
    pub fn out_dir_or_current(&self) -> PathBuf {
        match &self.out_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_options_default() {
        let options = CompressOptions::default();
        assert_eq!(options.format, Format::Tar);
        assert_eq!(options.filter, Filter::Gzip);
        assert!(options.password_str().is_none());
        assert!(!options.include_root_dir);
        assert!(options.out_name.is_none());
        assert!(options.zstd_workers.is_none());
    }

    #[test]
    fn compress_options_builder_pattern() {
        let options = CompressOptions::new(Format::Zip, Filter::Deflate)
            .password("secret")
            .include_root_dir(true)
            .out_name("out.zip")
            .zstd_workers(2);

        assert_eq!(options.format, Format::Zip);
        assert_eq!(options.filter, Filter::Deflate);
        assert_eq!(options.password_str(), Some("secret"));
        assert!(options.include_root_dir);
        assert_eq!(options.out_name, Some(PathBuf::from("out.zip")));
        assert_eq!(options.zstd_workers, Some(2));
    }

    #[test]
    fn empty_password_is_absent() {
        assert!(CompressOptions::default().password("").password_str().is_none());
        assert!(DecompressOptions::default().password("").password_str().is_none());
    }

    #[test]
    fn output_name_synthesis() {
        let src = Path::new("/data/project");
        let name = Path::new("project");
        let cases = [
            (Format::Zip, Filter::Deflate, "project.zip"),
            (Format::SevenZip, Filter::None, "project.7z"),
            (Format::Tar, Filter::None, "project.tar"),
            (Format::Tar, Filter::Gzip, "project.tar.gz"),
            (Format::Tar, Filter::Zstd, "project.tar.zst"),
        ];
        for (format, filter, expected) in cases {
            let options = CompressOptions::new(format, filter);
            assert_eq!(options.output_for(src, name), PathBuf::from(expected));
        }

        let single = Path::new("notes/file.txt");
        assert_eq!(
            CompressOptions::new(Format::Zip, Filter::Deflate)
                .output_for(single, Path::new("file.txt")),
            PathBuf::from("file.txt.zip")
        );
    }

    #[test]
    fn explicit_output_name_wins() {
        let options = CompressOptions::default().out_name("custom.tgz");
        assert_eq!(
            options.output_for(Path::new("x"), Path::new("x")),
            PathBuf::from("custom.tgz")
        );
    }

    #[test]
    fn decompress_defaults_to_current_dir() {
        assert_eq!(DecompressOptions::default().out_dir_or_current(), PathBuf::from("."));
        assert_eq!(
            DecompressOptions::default().out_dir("x").out_dir_or_current(),
            PathBuf::from("x")
        );
    }
}
