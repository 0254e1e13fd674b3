//! A stand-in catalog server that answers host, ssh, and scp commands

#![allow(dead_code)]

use async_trait::async_trait;
use command_runner::{ExecutionResult, Shell};
use std::collections::{HashMap, HashSet};
use std::fs;

pub const DOMAIN: &str = "boxes.test";
pub const USER: &str = "vagrant";
pub const BOX_NAME: &str = "team/mint17";
pub const BOX_DIR: &str = "/var/www/vagrant_boxes/team/mint17";
pub const METADATA_PATH: &str = "/var/www/vagrant_boxes/team/mint17/metadata.json";
pub const FAKE_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

pub const SAMPLE_METADATA: &str = r#"{
  "name": "team/mint17",
  "description": "Mint 17 base box",
  "versions": [
    {
      "version": "0.9.0",
      "providers": [
        {
          "name": "virtualbox",
          "url": "http://boxes.test/vagrant_boxes/team/mint17/mint17_0.9.0_virtualbox.box",
          "checksum_type": "sha1",
          "checksum": "1111111111111111111111111111111111111111"
        }
      ]
    },
    {
      "version": "0.10.0",
      "providers": [
        {
          "name": "virtualbox",
          "url": "http://boxes.test/vagrant_boxes/team/mint17/mint17_0.10.0_virtualbox.box",
          "checksum_type": "sha1",
          "checksum": "2222222222222222222222222222222222222222"
        }
      ]
    },
    {
      "version": "0.11.0",
      "providers": [
        {
          "name": "libvirt",
          "url": "http://boxes.test/vagrant_boxes/team/mint17/mint17_0.11.0_libvirt.box",
          "checksum_type": "sha1",
          "checksum": "3333333333333333333333333333333333333333"
        }
      ]
    }
  ]
}"#;

/// In-memory remote file tree plus a record of every command line
pub struct FakeRemote {
    pub resolves: bool,
    pub files: HashMap<String, Vec<u8>>,
    pub dirs: HashSet<String>,
    pub commands: Vec<String>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            resolves: true,
            files: HashMap::new(),
            dirs: HashSet::new(),
            commands: Vec::new(),
        }
    }

    pub fn unresolvable() -> Self {
        Self {
            resolves: false,
            ..Self::new()
        }
    }

    pub fn with_box(mut self, box_dir: &str, metadata: &str) -> Self {
        self.dirs.insert(box_dir.to_string());
        self.files
            .insert(format!("{}/metadata.json", box_dir), metadata.as_bytes().to_vec());
        self
    }

    pub fn file_text(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn handle(&mut self, command: &str) -> (String, String, i32) {
        if let Some(domain) = command.strip_prefix("host ") {
            return if self.resolves {
                (format!("{} has address 192.0.2.10\n", domain), String::new(), 0)
            } else {
                (String::new(), format!("Host {} not found: 3(NXDOMAIN)\n", domain), 1)
            };
        }
        if let Some(rest) = command.strip_prefix("ssh ") {
            let rest = rest.strip_prefix("-q ").unwrap_or(rest);
            let (_login, remote) = rest.split_once(' ').unwrap_or((rest, ""));
            return self.handle_ssh(remote.trim().trim_matches('\''));
        }
        if let Some(rest) = command.strip_prefix("scp -Bqv ") {
            let args: Vec<&str> = rest.split_whitespace().map(|a| a.trim_matches('\'')).collect();
            return self.handle_scp(args[0], args[1]);
        }
        if let Some(path) = command.strip_prefix("sha1sum ") {
            return (format!("{}  {}\n", FAKE_SHA1, path), String::new(), 0);
        }
        (String::new(), format!("sh: 1: {}: not found\n", command), 127)
    }

    fn handle_ssh(&mut self, remote: &str) -> (String, String, i32) {
        if let Some(start) = remote.find("[ -f ") {
            let tail = &remote[start + 5..];
            let path = &tail[..tail.find(" ]").unwrap_or(tail.len())];
            let answer = if self.files.contains_key(path) { "TRUE" } else { "FALSE" };
            return (format!("{}\n", answer), String::new(), 0);
        }
        if let Some(dir) = remote.strip_prefix("mkdir -p ") {
            let mut prefix = String::new();
            for part in dir.split('/').filter(|p| !p.is_empty()) {
                prefix = format!("{}/{}", prefix, part);
                self.dirs.insert(prefix.clone());
            }
            return (String::new(), String::new(), 0);
        }
        if let Some(dir) = remote.strip_prefix("rm -rf ") {
            let nested = format!("{}/", dir);
            self.dirs.retain(|d| d != dir && !d.starts_with(&nested));
            self.files.retain(|f, _| !f.starts_with(&nested));
            return (String::new(), String::new(), 0);
        }
        (String::new(), format!("bash: {}: command not found\n", remote), 127)
    }

    fn handle_scp(&mut self, source: &str, target: &str) -> (String, String, i32) {
        if let Some((_, remote)) = source.split_once(':') {
            return match self.files.get(remote) {
                Some(bytes) => {
                    fs::write(target, bytes).unwrap();
                    (String::new(), String::new(), 0)
                }
                None => (
                    String::new(),
                    format!("scp: {}: No such file or directory\n", remote),
                    1,
                ),
            };
        }

        let (_, remote) = target.split_once(':').unwrap();
        let parent = remote.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        if !self.dirs.contains(parent) {
            return (
                String::new(),
                format!("scp: dest open \"{}\": No such file or directory\n", remote),
                1,
            );
        }
        let bytes = fs::read(source).unwrap();
        self.files.insert(remote.to_string(), bytes);
        (String::new(), String::new(), 0)
    }
}

#[async_trait]
impl Shell for FakeRemote {
    async fn execute(&mut self, command: &str) -> ExecutionResult {
        self.commands.push(command.to_string());
        let (stdout, stderr, code) = self.handle(command);
        ExecutionResult::from_output(command, stdout, stderr, code)
    }
}
