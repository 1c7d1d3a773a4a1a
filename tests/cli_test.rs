//! CLI integration tests for the mdspec binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("mdspec"))
}

// Helper to create a temp document file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const BASIC_DOC: &str = "\
# Users

## GET /users/{id}

### Params

|Name|In|Type|Required|Description|
|---|---|---|---|---|
|id|path|string|yes|User id|

### Responses

|Status|Meaning|Description|Schema|
|---|---|---|---|
|200|OK|The user|#schemaUser|

<a id=\"schemaUser\"></a>

|Name|Type|Required|Restrictions|Title|Description|
|---|---|---|---|---|---|
|id|string|true|||User id|
";

mod convert_command {
    use super::*;

    #[test]
    fn basic_convert() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);

        cmd()
            .args(["convert", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""version":"1.0.0""#))
            .stdout(predicate::str::contains(r#""/users/{id}""#))
            .stdout(predicate::str::contains("#/components/schemas/user"));
    }

    #[test]
    fn convert_with_title() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);

        cmd()
            .args(["convert", doc.to_str().unwrap(), "--title", "User Service"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""title":"User Service""#));
    }

    #[test]
    fn convert_with_pretty() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);

        cmd()
            .args(["convert", doc.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            // Pretty output has newlines and indentation
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn convert_with_output_file() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);
        let output = dir.path().join("spec.json");

        cmd()
            .args([
                "convert",
                doc.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains(r#""paths""#));
    }

    #[test]
    fn convert_missing_file_exits_3() {
        cmd()
            .args(["convert", "/nonexistent/api.md"])
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }
}

mod render_command {
    use super::*;

    #[test]
    fn basic_render() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);

        cmd()
            .args(["render", doc.to_str().unwrap(), "--title", "Demo API"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Demo API"))
            .stdout(predicate::str::contains("## Users"))
            .stdout(predicate::str::contains("### GET /users/{id}"))
            .stdout(predicate::str::contains("|id|path|string|true|User id|"))
            .stdout(predicate::str::contains("|200|OK|The user|user|"));
    }

    #[test]
    fn render_with_output_file() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);
        let output = dir.path().join("flat.md");

        cmd()
            .args([
                "render",
                doc.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("## Users"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn clean_document_passes() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);

        cmd()
            .args(["lint", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("all passed"));
    }

    #[test]
    fn broken_reference_fails() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "api.md",
            "\
# Users

## GET /users

### Responses

|Status|Meaning|Description|Schema|
|---|---|---|---|
|200|OK|Users|#schemaGhost|
",
        );

        cmd()
            .args(["lint", doc.to_str().unwrap()])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("E002"));
    }

    #[test]
    fn warnings_pass_unless_strict() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "api.md",
            "# Users\n\n## GET /users\n\n## GET /users\n",
        );

        cmd()
            .args(["lint", doc.to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["lint", doc.to_str().unwrap(), "--strict"])
            .assert()
            .failure()
            .code(1);
    }

    #[test]
    fn json_format() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "api.md", BASIC_DOC);

        cmd()
            .args(["lint", doc.to_str().unwrap(), "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""files_checked": 1"#));
    }

    #[test]
    fn lint_directory() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "a.md", BASIC_DOC);
        write_temp_file(&dir, "b.md", "# Users\n\n## GET /users\n");

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 files checked"));
    }

    #[test]
    fn missing_path_exits_2() {
        cmd()
            .args(["lint", "/nonexistent/docs"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}
