//! Cross-process tests driving the `regsync` binary
//!
//! Every invocation is a separate process that enables the session,
//! refreshes, runs one command and exits.

use std::process::{Command, Output};

use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn regsync(dir: &TempDir, args: &[&str]) -> Output {
        let output = Command::new(env!("CARGO_BIN_EXE_regsync"))
            .arg("--dir")
            .arg(dir.path())
            .arg("--test-mode")
            .args(["--session", "cli"])
            .args(args)
            .env_remove("REGSYNC_DIR")
            .output()
            .expect("failed to run regsync");
        assert!(
            output.status.success(),
            "regsync {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        output
    }

    fn stdout_lines(output: &Output) -> Vec<String> {
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_append_is_visible_to_next_process() {
        let dir = TempDir::new().unwrap();
        regsync(&dir, &["append", "-r", "a", "/tmp/a"]);

        let output = regsync(&dir, &["list", "a"]);
        assert_eq!(stdout_lines(&output), ["\"a", "/tmp/a"]);
        assert!(dir.path().join("regs-cli.shm").exists());
        assert!(dir.path().join("regs-cli.lock").exists());
    }

    #[test]
    fn test_rename_across_processes() {
        let dir = TempDir::new().unwrap();
        regsync(&dir, &["append", "-r", "a", "/tmp/a"]);
        regsync(&dir, &["append", "-r", "B", "/tmp/b1", "/tmp/b2"]);
        regsync(&dir, &["rename", "/tmp/a", "/tmp/a2"]);

        let output = regsync(&dir, &["list", "ab"]);
        assert_eq!(stdout_lines(&output), ["\"a", "/tmp/a2", "\"b", "/tmp/b2", "/tmp/b1"]);
    }

    #[test]
    fn test_clear_and_copy() {
        let dir = TempDir::new().unwrap();
        regsync(&dir, &["append", "-r", "c", "/c"]);
        regsync(&dir, &["copy", "-r", "c"]);
        regsync(&dir, &["clear", "-r", "c"]);

        let output = regsync(&dir, &["list", "\"c"]);
        assert_eq!(stdout_lines(&output), ["\"\"", "/c"]);
    }

    #[test]
    fn test_growth_is_shared() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<String> = (0..300).map(|i| format!("/tmp/file-{:05}", i)).collect();
        let mut args = vec!["append", "-r", "g"];
        args.extend(paths.iter().map(String::as_str));
        regsync(&dir, &args);

        let output = regsync(&dir, &["list", "g"]);
        let lines = stdout_lines(&output);
        assert_eq!(lines.len(), 301);
        assert_eq!(lines[1], "/tmp/file-00299");

        let dump = String::from_utf8_lossy(&regsync(&dir, &["dump"]).stdout).into_owned();
        assert!(dump.contains("size_backed=8192"));
    }

    #[test]
    fn test_dump_and_info() {
        let dir = TempDir::new().unwrap();
        regsync(&dir, &["append", "-r", "a", "/tmp/a"]);

        let dump = String::from_utf8_lossy(&regsync(&dir, &["dump"]).stdout).into_owned();
        assert!(dump.starts_with("BEGIN register dump"));
        assert!(dump.contains("used:  /tmp/a(0)"));
        assert!(dump.trim_end().ends_with("END register dump"));

        let info = String::from_utf8_lossy(&regsync(&dir, &["info"]).stdout).into_owned();
        assert!(info.contains("regs-cli.shm"));
        assert!(info.contains("Initial size: 4096 bytes"));
    }

    #[test]
    fn test_invalid_register_fails() {
        let dir = TempDir::new().unwrap();
        let status = Command::new(env!("CARGO_BIN_EXE_regsync"))
            .arg("--dir")
            .arg(dir.path())
            .args(["append", "-r", "7", "/tmp/x"])
            .status()
            .unwrap();
        assert!(!status.success());
    }
}
