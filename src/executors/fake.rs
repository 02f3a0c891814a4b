//! Deterministic CommandRunner for tests: scripted outcomes, recorded
//! invocations, optional filesystem side effects standing in for the tools'
//! own (openssl writing a key pair, certbot populating its live directory).

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

use super::command::{CommandOutput, CommandRunner};

struct Rule {
    needle: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
}

#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<Rule>,
    touches: Vec<(String, Vec<PathBuf>)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose "program arg arg ..." line contains `needle` exit
    /// non-zero with the given stderr.
    pub fn fail_matching(mut self, needle: &str, stderr: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        });
        self
    }

    /// Commands whose line contains `needle` succeed with the given stdout.
    pub fn respond_matching(mut self, needle: &str, stdout: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        });
        self
    }

    /// Commands whose line contains `needle` create the given files before
    /// returning, like the real tool would.
    pub fn touch_matching(mut self, needle: &str, paths: &[PathBuf]) -> Self {
        self.touches
            .push((needle.to_string(), paths.to_vec()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        for (needle, paths) in &self.touches {
            if line.contains(needle) {
                for path in paths {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, b"fake")?;
                }
            }
        }

        let rule = self.rules.iter().find(|r| line.contains(&r.needle));
        Ok(match rule {
            Some(rule) => CommandOutput {
                stdout: rule.stdout.clone(),
                stderr: rule.stderr.clone(),
                exit_code: rule.exit_code,
                duration_ms: 0,
            },
            None => CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
                duration_ms: 0,
            },
        })
    }
}
