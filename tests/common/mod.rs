pub mod mock_bus;

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// A running panel binary with isolated config/data directories. Display
/// commands are collected from its stdout; user actions go in on stdin.
pub struct PanelProcess {
    pub temp_dir: TempDir,
    pub child: Child,
    stdin: Option<ChildStdin>,
    lines: mpsc::Receiver<String>,
}

impl PanelProcess {
    pub fn spawn() -> Self {
        Self::spawn_with_config(None)
    }

    /// Spawn with a pre-written config file (JSON), or defaults when `None`
    pub fn spawn_with_config(config_json: Option<&str>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let bin_path = env!("CARGO_BIN_EXE_alarmpanel");

        // Isolate the panel from the host system
        let config_dir = temp_dir.path().join("config");
        let data_dir = temp_dir.path().join("data");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        if let Some(json) = config_json {
            let panel_dir = config_dir.join("alarmpanel");
            fs::create_dir_all(&panel_dir).expect("Failed to create panel dir");
            fs::write(panel_dir.join("config.json"), json).expect("Failed to write config");
        }

        let mut child = Command::new(bin_path)
            .env("XDG_CONFIG_HOME", &config_dir)
            .env("XDG_DATA_HOME", &data_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("Failed to spawn alarmpanel");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().expect("Missing stdout handle");
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        PanelProcess {
            temp_dir,
            child,
            stdin,
            lines,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir
            .path()
            .join("config/alarmpanel/config.json")
    }

    /// Write one action line to the panel's stdin
    pub fn send_action(&mut self, json: &str) {
        let stdin = self.stdin.as_mut().expect("stdin already closed");
        stdin
            .write_all(json.as_bytes())
            .expect("Failed to write action");
        stdin.write_all(b"\n").expect("Failed to write newline");
        stdin.flush().expect("Failed to flush stdin");
    }

    /// Close stdin, which asks the panel to shut down
    pub fn close_stdin(&mut self) {
        self.stdin.take();
    }

    /// Wait for a command of the given `type`, skipping everything else
    pub fn wait_for(&mut self, kind: &str, timeout: Duration) -> Option<serde_json::Value> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&line).expect("Command was not valid JSON");
                    if value["type"] == kind {
                        return Some(value);
                    }
                }
                Err(_) => return None,
            }
        }
    }

    /// True once the process has exited within the timeout
    pub fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.child.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(_) => return false,
            }
        }
        false
    }
}

impl Drop for PanelProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
