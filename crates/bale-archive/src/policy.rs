//! Format/filter/password validation.
//!
//! Every combination is checked here, once, before any file handle is opened.
//! The writers only ever see a [`BackendConfig`].

use crate::error::{Error, Result};
use crate::format::{Filter, Format};

/// Concrete compression method handed to a container backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflate,
    Gzip,
    Zstd { workers: u32 },
}

/// Resolved backend directives for one compression job.
///
/// Only [`validate`] builds one, so holding a `BackendConfig` means the
/// combination is legal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    format: Format,
    method: Method,
    password: Option<String>,
}

impl BackendConfig {
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn encrypted(&self) -> bool {
        self.password.is_some()
    }
}

/// Validate a (format, filter, password) triple.
///
/// `zstd_workers` overrides the worker count used for zstd-filtered tar
/// output; `None` sizes it to the available hardware concurrency.
pub fn validate(
    format: Format,
    filter: Filter,
    password: Option<&str>,
    zstd_workers: Option<u32>,
) -> Result<BackendConfig> {
    let password = password.filter(|p| !p.is_empty());
    if password.is_some() && format != Format::Zip {
        return Err(Error::EncryptionUnsupported { format });
    }

    let method = match format {
        Format::Zip | Format::SevenZip => match filter {
            Filter::None => Method::Stored,
            Filter::Deflate => Method::Deflate,
            Filter::Gzip | Filter::Zstd => {
                return Err(Error::FilterUnsupported { format, filter });
            }
        },
        Format::Tar => match filter {
            Filter::None => Method::Stored,
            Filter::Deflate | Filter::Gzip => Method::Gzip,
            Filter::Zstd => Method::Zstd {
                workers: zstd_workers.unwrap_or_else(hardware_concurrency),
            },
        },
    };

    Ok(BackendConfig {
        format,
        method,
        password: password.map(str::to_owned),
    })
}

fn hardware_concurrency() -> u32 {
    u32::try_from(num_cpus::get()).unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_accepts_store_and_deflate() {
        let config = validate(Format::Zip, Filter::None, None, None).unwrap();
        assert_eq!(config.method, Method::Stored);
        let config = validate(Format::Zip, Filter::Deflate, None, None).unwrap();
        assert_eq!(config.method, Method::Deflate);
        assert!(!config.encrypted());
    }

    #[test]
    fn zip_rejects_stream_filters() {
        for filter in [Filter::Gzip, Filter::Zstd] {
            let err = validate(Format::Zip, filter, None, None).unwrap_err();
            assert!(matches!(err, Error::FilterUnsupported { .. }));
            assert!(err.is_invalid_argument());
        }
    }

    #[test]
    fn seven_zip_rejects_stream_filters() {
        let err = validate(Format::SevenZip, Filter::Zstd, None, None).unwrap_err();
        assert!(matches!(err, Error::FilterUnsupported { format: Format::SevenZip, .. }));
        assert_eq!(
            validate(Format::SevenZip, Filter::Deflate, None, None).unwrap().method,
            Method::Deflate
        );
    }

    #[test]
    fn tar_maps_deflate_to_gzip() {
        let config = validate(Format::Tar, Filter::Deflate, None, None).unwrap();
        assert_eq!(config.method, Method::Gzip);
        let config = validate(Format::Tar, Filter::None, None, None).unwrap();
        assert_eq!(config.method, Method::Stored);
    }

    #[test]
    fn tar_zstd_workers() {
        let config = validate(Format::Tar, Filter::Zstd, None, Some(3)).unwrap();
        assert_eq!(config.method, Method::Zstd { workers: 3 });

        let config = validate(Format::Tar, Filter::Zstd, None, None).unwrap();
        let Method::Zstd { workers } = config.method else {
            panic!("expected zstd");
        };
        assert!(workers >= 1);
    }

    #[test]
    fn password_only_for_zip() {
        let err = validate(Format::Tar, Filter::Deflate, Some("x"), None).unwrap_err();
        assert!(matches!(err, Error::EncryptionUnsupported { format: Format::Tar }));

        let err = validate(Format::SevenZip, Filter::None, Some("x"), None).unwrap_err();
        assert!(err.is_invalid_argument());

        let config = validate(Format::Zip, Filter::Deflate, Some("secret"), None).unwrap();
        assert!(config.encrypted());
        assert_eq!(config.password.as_deref(), Some("secret"));
    }

    #[test]
    fn empty_password_is_absent() {
        let config = validate(Format::Tar, Filter::Gzip, Some(""), None).unwrap();
        assert!(!config.encrypted());
    }
}
