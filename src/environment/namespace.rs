//! Namespace derivation from generator file paths.
//!
//! A namespace is the colon-delimited identifier of a generator, derived
//! deterministically from its file path:
//!
//! * `generator-mocha/backbone/model/index.js` -> `mocha:backbone:model`
//! * `backbone/all/index.js` -> `backbone:all`
//! * `backbone.js` -> `backbone`

use crate::error::EnvironmentError;
use std::path::Path;

/// Derive the namespace for `filepath`.
///
/// Derivation is a pure function of the input: the file extension and a
/// trailing `index` component are dropped, everything before the last path
/// segment carrying a recognized package prefix is discarded (and the prefix
/// stripped), and the remaining separators become `:`.
pub(crate) fn derive(prefixes: &[String], filepath: &Path) -> Result<String, EnvironmentError> {
    let raw = filepath.to_string_lossy().replace('\\', "/");
    if raw.trim().is_empty() {
        return Err(EnvironmentError::InvalidPath(filepath.to_path_buf()));
    }

    let mut segments: Vec<&str> = raw
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    // Drop the extension from the final segment. A leading dot is a hidden
    // file, not an extension.
    if let Some(last) = segments.last_mut() {
        if let Some(dot) = last.rfind('.') {
            if dot > 0 {
                *last = &last[..dot];
            }
        }
    }

    if segments.last() == Some(&"index") {
        segments.pop();
    }

    // The package-name segment anchors the namespace; anything before the
    // last prefixed segment is filesystem noise (node_modules, lib dirs).
    let mut anchored: Option<(usize, &str)> = None;
    for (i, segment) in segments.iter().enumerate() {
        for prefix in prefixes {
            match segment.strip_prefix(prefix.as_str()) {
                Some(rest) if !rest.is_empty() => anchored = Some((i, rest)),
                _ => {}
            }
        }
    }

    let parts: Vec<&str> = match anchored {
        Some((i, rest)) => std::iter::once(rest)
            .chain(segments[i + 1..].iter().copied())
            .collect(),
        None => segments,
    };

    let namespace = parts.join(":");
    if namespace.is_empty() {
        return Err(EnvironmentError::InvalidPath(filepath.to_path_buf()));
    }
    Ok(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn derive_default(path: &str) -> Result<String, EnvironmentError> {
        derive(&["generator-".to_string()], Path::new(path))
    }

    #[test]
    fn strips_prefix_index_and_extension() {
        assert_eq!(
            derive_default("generator-mocha/backbone/model/index.js").unwrap(),
            "mocha:backbone:model"
        );
    }

    #[test]
    fn bare_file_keeps_its_stem() {
        assert_eq!(derive_default("backbone.js").unwrap(), "backbone");
    }

    #[test]
    fn unprefixed_directories_become_segments() {
        assert_eq!(derive_default("backbone/all/index.js").unwrap(), "backbone:all");
        assert_eq!(derive_default("generator-backbone/model").unwrap(), "backbone:model");
    }

    #[test]
    fn absolute_paths_anchor_at_the_package_segment() {
        assert_eq!(
            derive_default("/usr/lib/node_modules/generator-foo/app/index.js").unwrap(),
            "foo:app"
        );
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = derive_default("").unwrap_err();
        assert!(matches!(err, EnvironmentError::InvalidPath(_)));
    }

    #[test]
    fn relative_dot_segments_are_ignored() {
        assert_eq!(derive_default("../../generator-ng/app").unwrap(), "ng:app");
    }

    #[test]
    fn derivation_is_deterministic() {
        let path = PathBuf::from("generator-mocha/backbone/model/index.js");
        let first = derive(&["generator-".to_string()], &path).unwrap();
        let second = derive(&["generator-".to_string()], &path).unwrap();
        assert_eq!(first, second);
    }
}
