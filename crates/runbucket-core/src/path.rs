//! Conversions between bucket-relative object names and local paths.
//!
//! Objects materialized under an arbitrary mirror directory live at
//! `<destination>/<bucket_name>/<object_name>`. [`path_relative_to_bucket`]
//! recovers the canonical object name from such a path and [`mirror_path`]
//! builds it.

use crate::error::{RetrievalError, RetrievalResult};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Returns the portion of `path` strictly after the first segment equal to
/// `bucket_name`, joined with `/`.
///
/// With no bucket name the path is returned unchanged.
pub fn path_relative_to_bucket(path: &Path, bucket_name: Option<&str>) -> RetrievalResult<String> {
    let Some(bucket_name) = bucket_name else {
        return Ok(path.to_string_lossy().into_owned());
    };

    let display = path.display().to_string();
    let mut components = path.components();
    components
        .by_ref()
        .find(|c| *c == Component::Normal(OsStr::new(bucket_name)))
        .ok_or_else(|| {
            RetrievalError::path(&display, format!("bucket '{bucket_name}' is not a segment of the path"))
        })?;

    let mut segments = Vec::new();
    for component in components {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str().ok_or_else(|| {
                RetrievalError::path(&display, "object path is not valid UTF-8")
            })?),
            Component::CurDir => {}
            _ => {
                return Err(RetrievalError::path(
                    &display,
                    "object path must not leave the bucket root",
                ));
            }
        }
    }

    if segments.is_empty() {
        return Err(RetrievalError::path(&display, format!("no object path after bucket '{bucket_name}'")));
    }
    Ok(segments.join("/"))
}

/// Checks that `name` is a usable bucket-relative object name.
pub fn validate_object_name(name: &str) -> RetrievalResult<()> {
    if name.is_empty() {
        return Err(RetrievalError::path(name, "object name must not be empty"));
    }
    if name.starts_with('/') {
        return Err(RetrievalError::path(name, "object names are bucket-relative, not absolute"));
    }
    if name.contains('\0') {
        return Err(RetrievalError::path(name, "object name contains a null byte"));
    }
    if name.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return Err(RetrievalError::path(name, "object name contains an empty, '.' or '..' segment"));
    }
    Ok(())
}

/// Local mirror location of an object: `<destination>/<bucket_name>/<object_name>`.
pub fn mirror_path(destination: &Path, bucket_name: &str, object_name: &str) -> RetrievalResult<PathBuf> {
    if bucket_name.is_empty() || bucket_name.contains('/') || bucket_name == "." || bucket_name == ".." {
        return Err(RetrievalError::path(bucket_name, "bucket name must be a single path segment"));
    }
    validate_object_name(object_name)?;

    let mut path = destination.join(bucket_name);
    path.extend(object_name.split('/'));
    Ok(path)
}
