//! Structural tests for layer boundary enforcement.
//!
//! These tests scan source files to verify that the domain, application and
//! infrastructure layers only depend inward.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(") && trimmed.contains("test") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// `(relative path, line number, line)` for every non-test, non-comment line
/// under `src/<layer>` containing one of `needles`.
fn find_in_layer(layer: &str, needles: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut violations = Vec::new();
    for file in collect_rs_files(&root.join("src").join(layer)) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let rel = file.strip_prefix(root).unwrap_or(&file).display().to_string();
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            if in_test || line.trim().starts_with("//") {
                continue;
            }
            if needles.iter().any(|n| line.contains(n)) {
                violations.push(format!("{rel}:{}: {line}", i + 1));
            }
        }
    }
    violations
}

#[test]
fn domain_is_pure() {
    let violations = find_in_layer(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "std::fs",
            "std::process",
            "tokio::",
            "println!",
            "eprintln!",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must not perform I/O or import outer layers:\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_depend_only_on_ports_and_domain() {
    let violations = find_in_layer(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "std::fs::"],
    );
    assert!(
        violations.is_empty(),
        "application/ must go through port traits:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_in_layer("infra", &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = find_in_layer("infra", &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

#[test]
fn processes_are_spawned_only_in_infra() {
    let mut violations = Vec::new();
    for layer in ["domain", "application", "commands", "output"] {
        violations.extend(find_in_layer(layer, &["process::Command::new"]));
    }
    assert!(
        violations.is_empty(),
        "process spawning belongs in infra/command_runner.rs:\n{}",
        violations.join("\n")
    );
}
