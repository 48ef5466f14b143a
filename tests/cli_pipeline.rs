//! End-to-end tests for the `ccpipe` binary.
//!
//! The toolchain is a small shell script that fails on any argument
//! containing "bad", logs each call to `calls.log`, and otherwise creates
//! the `-o` target, so the whole compile/link/cleanup sequence runs
//! without a real compiler. The "linked" program is itself a script that
//! appends its arguments to `run.log` and exits with status 7.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FAKE_TOOL: &str = r#"#!/bin/sh
kind=link
for a in "$@"; do [ "$a" = "-c" ] && kind=compile; done
case "$*" in *bad*) echo "$kind FAIL" >> calls.log; exit 1;; esac
out=""
while [ $# -gt 0 ]; do
    if [ "$1" = "-o" ]; then out="$2"; fi
    shift
done
echo "$kind $out" >> calls.log
if [ "$kind" = link ]; then
    printf '#!/bin/sh\necho "ran $*" >> run.log\nexit 7\n' > "$out"
    chmod +x "$out"
else
    touch "$out"
fi
"#;

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new(sources: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for src in sources {
            let path = dir.path().join(src);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "int main() { return 0; }\n").unwrap();
        }

        let tool = dir.path().join("fakecc.sh");
        fs::write(&tool, FAKE_TOOL).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn tool(&self) -> PathBuf {
        self.path().join("fakecc.sh")
    }

    /// Write ccpipe.toml using the fake tool; `extra` is appended verbatim.
    fn configure(&self, extra: &str) {
        let config = format!(
            r#"[toolchain]
compiler = "{tool}"
linker = "{tool}"
cflags = ["-Wall"]
ldflags = ["-lm"]

{extra}
"#,
            tool = self.tool().display()
        );
        fs::write(self.path().join("ccpipe.toml"), config).unwrap();
    }

    fn ccpipe(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ccpipe"))
            .args(args)
            .current_dir(self.path())
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .expect("failed to run ccpipe")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn run_log(&self) -> Option<String> {
        fs::read_to_string(self.path().join("run.log")).ok()
    }

    fn temp_entries(&self) -> usize {
        fs::read_dir(self.path().join("temp_files"))
            .map(|d| d.count())
            .unwrap_or(0)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_build_compiles_links_and_cleans() {
    let project = Project::new(&["main.cpp", "usb.cpp"]);
    project.configure("[sources]\nfiles = [\"main.cpp\", \"usb.cpp\"]\n");

    let output = project.ccpipe(&["build"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Compilation: . . complete!"));
    assert_eq!(
        project.calls(),
        vec![
            "compile temp_files/main.o",
            "compile temp_files/usb.o",
            "link main.elf",
        ]
    );
    assert!(project.path().join("main.elf").exists());
    assert!(project.path().join("temp_files").is_dir());
    assert_eq!(project.temp_entries(), 0);
}

#[test]
fn test_no_subcommand_means_build() {
    let project = Project::new(&["main.cpp"]);
    project.configure("");

    let output = project.ccpipe(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.path().join("main.elf").exists());
}

#[test]
fn test_compile_failure_never_links() {
    let project = Project::new(&["main.cpp", "bad.cpp", "late.cpp"]);
    project.configure("[sources]\nfiles = [\"main.cpp\", \"bad.cpp\", \"late.cpp\"]\n");

    let output = project.ccpipe(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("compile step failed"));
    assert_eq!(
        project.calls(),
        vec!["compile temp_files/main.o", "compile FAIL"]
    );
    assert!(!project.path().join("main.elf").exists());
    // Artifacts stay for inspection.
    assert!(project.path().join("temp_files/main.o").exists());
}

#[test]
fn test_link_failure_keeps_artifacts() {
    let project = Project::new(&["main.cpp"]);
    project.configure("[output]\nexecutable = \"bad.elf\"\n");

    let output = project.ccpipe(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("link step failed"));
    assert!(project.path().join("temp_files/main.o").exists());
}

#[test]
fn test_post_link_failure_fails_build() {
    let project = Project::new(&["main.cpp"]);
    project.configure("[[post_link]]\nprogram = \"false\"\n");

    let output = project.ccpipe(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("post-link step failed"));
    assert_eq!(project.temp_entries(), 1);
}

#[test]
fn test_discover_mode_walks_tree() {
    let project = Project::new(&["main.cpp", "LIB/Toastbox/Task.cpp", "LIB/Toastbox/Task.h"]);
    project.configure("[sources]\nfiles = [\"main.cpp\"]\n\n[sources.discover]\n");

    let output = project.ccpipe(&["build", "--keep-artifacts"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        project.calls(),
        vec![
            "compile temp_files/main.o",
            "compile temp_files/Task.o",
            "link main.elf",
        ]
    );
    assert_eq!(project.temp_entries(), 2);
}

#[test]
fn test_no_sources_is_an_error() {
    let project = Project::new(&[]);
    project.configure("[sources]\nfiles = [\"only.h\"]\n");

    let output = project.ccpipe(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no source files to compile"));
    assert!(project.calls().is_empty());
}

#[test]
fn test_dry_run_executes_nothing() {
    let project = Project::new(&["main.cpp"]);
    project.configure("");

    let output = project.ccpipe(&["build", "--dry-run"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("DRY RUN"));
    assert!(out.contains("Would execute:"));
    assert!(out.contains("-c main.cpp -o temp_files/main.o"));
    assert!(project.calls().is_empty());
    assert!(!project.path().join("temp_files").exists());
}

#[test]
fn test_compile_commands_written() {
    let project = Project::new(&["main.cpp"]);
    project.configure("");

    let output = project.ccpipe(&["build", "--dry-run", "--compile-commands"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let db = fs::read_to_string(project.path().join("compile_commands.json")).unwrap();
    assert!(db.contains("\"file\": \"main.cpp\""));
}

#[test]
fn test_clean_removes_temp_dir() {
    let project = Project::new(&["main.cpp"]);
    project.configure("");
    assert!(project.ccpipe(&["build", "--keep-artifacts"]).status.success());
    assert!(project.path().join("temp_files/main.o").exists());

    let output = project.ccpipe(&["clean"]);

    assert!(output.status.success());
    assert!(!project.path().join("temp_files").exists());
}

#[test]
fn test_init_writes_loadable_config() {
    let project = Project::new(&[]);

    let first = project.ccpipe(&["init", "--discover"]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let written = fs::read_to_string(project.path().join("ccpipe.toml")).unwrap();
    assert!(written.contains("[sources.discover]"));

    let again = project.ccpipe(&["init"]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    assert!(project.ccpipe(&["init", "--force"]).status.success());
}

#[test]
fn test_invalid_config_is_reported() {
    let project = Project::new(&["main.cpp"]);
    fs::write(project.path().join("ccpipe.toml"), "[toolchain]\nbogus = 1\n").unwrap();

    let output = project.ccpipe(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid configuration"));
}

#[test]
fn test_run_builds_then_forwards_args_and_exit_code() {
    let project = Project::new(&["main.cpp"]);
    project.configure("");

    let output = project.ccpipe(&["run", "--", "--port", "3240"]);

    assert_eq!(output.status.code(), Some(7), "stderr: {}", stderr(&output));
    assert_eq!(
        project.calls(),
        vec!["compile temp_files/main.o", "link main.elf"]
    );
    // run.log lands in the project dir because the program runs from there.
    assert_eq!(project.run_log().as_deref(), Some("ran --port 3240\n"));
    assert_eq!(project.temp_entries(), 0);
}

#[test]
fn test_run_keep_artifacts() {
    let project = Project::new(&["main.cpp"]);
    project.configure("");

    let output = project.ccpipe(&["run", "--keep-artifacts"]);

    assert_eq!(output.status.code(), Some(7));
    assert_eq!(project.run_log().as_deref(), Some("ran \n"));
    assert!(project.path().join("temp_files/main.o").exists());
}

#[test]
fn test_run_does_not_start_program_after_failed_build() {
    let project = Project::new(&["bad.cpp"]);
    project.configure("[sources]\nfiles = [\"bad.cpp\"]\n");

    let output = project.ccpipe(&["run", "--", "x"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("compile step failed"));
    assert!(project.run_log().is_none());
}

#[test]
fn test_completion_script_generated() {
    let project = Project::new(&[]);

    let output = project.ccpipe(&["completion", "bash"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let script = stdout(&output);
    assert!(!script.is_empty());
    assert!(script.contains("ccpipe"));
}
