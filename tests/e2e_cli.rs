//! Black-box CLI tests for the `gocompile` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn gocompile() -> Command {
    Command::cargo_bin("gocompile").unwrap()
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        gocompile()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("usage: gocompile"));
    }

    #[test]
    fn shows_version() {
        gocompile()
            .arg("-V")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        gocompile()
            .arg("--bogus")
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("flag provided but not defined"));
    }

    #[test]
    fn no_input_files_is_a_usage_error() {
        gocompile().assert().failure().code(2);
    }
}

mod compile_mode {
    use super::*;

    #[test]
    fn compiles_a_package_clause_only_file() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, "empty.go", "package main\n");
        let out = dir.path().join("empty.o");

        gocompile()
            .current_dir(dir.path())
            .args(["-o", out.to_str().unwrap()])
            .arg(&src)
            .assert()
            .success();

        let bytes = std::fs::read(&out).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("go object "));
    }

    #[test]
    fn pack_flag_emits_an_archive() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, "empty.go", "package main\n");
        let out = dir.path().join("empty.a");

        gocompile()
            .current_dir(dir.path())
            .args(["-pack", "-o", out.to_str().unwrap()])
            .arg(&src)
            .assert()
            .success();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"!<arch>\n"));
    }

    #[test]
    fn rejects_a_nonexistent_source_file() {
        gocompile()
            .arg("/nonexistent/path/to/a.go")
            .assert()
            .failure()
            .code(2);
    }
}

mod imports {
    use super::*;

    #[test]
    fn importing_unsafe_in_safe_mode_is_a_fatal_import_error() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, "x.go", "package main\n\nimport \"unsafe\"\n");

        gocompile()
            .current_dir(dir.path())
            .args(["-u"])
            .arg(&src)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("unsafe"));
    }

    #[test]
    fn importing_a_malformed_object_is_a_fatal_import_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.a"), b"not an object file at all").unwrap();
        let src = write_source(&dir, "x.go", "package main\n\nimport \"bad\"\n");

        gocompile()
            .current_dir(dir.path())
            .args(["-I", dir.path().to_str().unwrap()])
            .arg(&src)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("malformed object header"));
    }
}
