//! Candidate file probing for import resolution (§4.3 File location).
//!
//! Directly adapted from `analyzer/resolvers.rs`'s `resolve_with_extensions`
//! trio: try a candidate path, and if it doesn't exist as-is, try each of a
//! fixed set of suffixes. Unlike the teacher's resolver (which returns a
//! root-relative display string), a caller here needs a path `std::fs::read`
//! can actually open regardless of the process's working directory, so every
//! match is canonicalized to an absolute path instead. Here the "extensions"
//! are the two object suffixes (`.a`, `.o`) instead of source file
//! extensions, and the "search roots" are the import directories from `-I`
//! plus the goroot package tree instead of a single project root.

use std::path::{Path, PathBuf};

/// Suffixes probed in order for every candidate base path (§4.3: "(a)
/// archive `<path>.a`, (b) raw object `<path>.o`").
const OBJECT_SUFFIXES: &[&str] = &["a", "o"];

/// Resolve `import_path` to an on-disk file, trying in order: the source
/// directory (for local imports), each user search directory, then the
/// goroot package tree. Returns the first candidate that exists.
pub fn resolve_import(
    import_path: &str,
    source_dir: Option<&Path>,
    search_dirs: &[PathBuf],
    goroot_pkg_dir: &Path,
) -> Option<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    if let Some(dir) = source_dir {
        roots.push(dir.to_path_buf());
    }
    roots.extend(search_dirs.iter().cloned());
    roots.push(goroot_pkg_dir.to_path_buf());

    for root in &roots {
        let base = root.join(import_path);
        if let Some(found) = resolve_with_extensions(base) {
            return Some(found);
        }
    }
    None
}

/// Tries `candidate` as-is first (already has a suffix), then each of
/// `OBJECT_SUFFIXES` in order.
fn resolve_with_extensions(candidate: PathBuf) -> Option<PathBuf> {
    if candidate.exists() {
        return candidate.canonicalize().ok();
    }
    for ext in OBJECT_SUFFIXES {
        let with_ext = candidate.with_extension(ext);
        if with_ext.exists() {
            return with_ext.canonicalize().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolves_bare_path_with_a_suffix() {
        let dir = tempdir().unwrap();
        let pkg_dir = dir.path().join("fmt");
        std::fs::create_dir_all(pkg_dir.parent().unwrap()).unwrap();
        std::fs::write(dir.path().join("fmt.a"), b"archive").unwrap();

        let found = resolve_import("fmt", None, &[], dir.path());
        assert!(found.is_some());
        assert!(found.unwrap().ends_with("fmt.a"));
    }

    #[test]
    fn prefers_source_dir_over_goroot() {
        let goroot = tempdir().unwrap();
        let src = tempdir().unwrap();
        std::fs::write(goroot.path().join("pkg.a"), b"goroot version").unwrap();
        std::fs::write(src.path().join("pkg.a"), b"local version").unwrap();

        let found = resolve_import("pkg", Some(src.path()), &[], goroot.path()).unwrap();
        assert_eq!(
            std::fs::read(&found).unwrap(),
            b"local version".to_vec()
        );
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let goroot = tempdir().unwrap();
        assert!(resolve_import("missing/pkg", None, &[], goroot.path()).is_none());
    }

    #[test]
    fn tries_object_suffix_when_archive_suffix_absent() {
        let goroot = tempdir().unwrap();
        std::fs::write(goroot.path().join("pkg.o"), b"raw object").unwrap();
        let found = resolve_import("pkg", None, &[], goroot.path()).unwrap();
        assert!(found.ends_with("pkg.o"));
    }
}
