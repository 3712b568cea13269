//! In-memory collaborators shared by unit tests

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::core::config::{Config, ConfigSink};
use crate::core::prompt::{parse_selection, Prompter};
use crate::core::repository::RepositoryCoordinate;
use crate::error::{ExtsyncError, Result};
use crate::github::client::GitHubUser;
use crate::github::contents::{ContentsApi, PutFileRequest, RemoteFileContent};

pub fn sample_user() -> GitHubUser {
    GitHubUser {
        login: "alice".to_string(),
        id: 42,
        avatar_url: "https://avatars.githubusercontent.com/u/42".to_string(),
        name: Some("Alice".to_string()),
        email: None,
    }
}

struct StoredFile {
    sha: String,
    content: String,
    size: u64,
}

/// Contents endpoint backed by a map, enforcing GitHub's sha rules
#[derive(Default)]
pub struct MemoryContents {
    files: Mutex<BTreeMap<String, StoredFile>>,
    puts: Mutex<Vec<PutFileRequest>>,
    next_sha: Mutex<u64>,
    failing_path: Option<String>,
}

impl MemoryContents {
    /// Reject every write to `path` with a 500
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_path = Some(path.to_string());
        self
    }

    fn fresh_sha(&self) -> String {
        let mut next = self.next_sha.lock().unwrap();
        *next += 1;
        format!("sha-{}", *next)
    }

    /// Put a file in place without recording a write
    pub fn seed(&self, path: &str, content: &[u8]) {
        let sha = self.fresh_sha();
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                sha,
                content: STANDARD.encode(content),
                size: content.len() as u64,
            },
        );
    }

    /// Decoded content of `path`
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|f| STANDARD.decode(&f.content).unwrap())
    }

    pub fn sha(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|f| f.sha.clone())
    }

    /// Every accepted or rejected write, in order
    pub fn puts(&self) -> Vec<PutFileRequest> {
        self.puts.lock().unwrap().clone()
    }

    /// Paths currently stored
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ContentsApi for MemoryContents {
    async fn get_file(
        &self,
        repo: &RepositoryCoordinate,
        path: &str,
    ) -> Result<RemoteFileContent> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            // Wrap like GitHub does
            Some(file) => Ok(RemoteFileContent {
                sha: file.sha.clone(),
                content: file
                    .content
                    .as_bytes()
                    .chunks(60)
                    .map(|c| String::from_utf8_lossy(c).to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
                encoding: Some("base64".to_string()),
                size: file.size,
            }),
            None => Err(ExtsyncError::RemoteNotFound {
                repository: repo.full_name(),
                path: path.to_string(),
            }),
        }
    }

    async fn put_file(
        &self,
        _repo: &RepositoryCoordinate,
        path: &str,
        request: PutFileRequest,
    ) -> Result<String> {
        self.puts.lock().unwrap().push(request.clone());

        if self.failing_path.as_deref() == Some(path) {
            return Err(ExtsyncError::GitHubApi {
                status: Some(500),
                message: "Server Error".to_string(),
            });
        }

        let sha = self.fresh_sha();
        let mut files = self.files.lock().unwrap();
        match (files.get(path), &request.sha) {
            (Some(existing), Some(given)) if &existing.sha == given => {}
            (Some(_), _) => {
                return Err(ExtsyncError::GitHubApi {
                    status: Some(409),
                    message: format!("{} does not match", path),
                })
            }
            (None, Some(_)) => {
                return Err(ExtsyncError::GitHubApi {
                    status: Some(422),
                    message: "sha given for a new file".to_string(),
                })
            }
            (None, None) => {}
        }

        let size = STANDARD
            .decode(&request.content)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or_default();
        files.insert(
            path.to_string(),
            StoredFile {
                sha: sha.clone(),
                content: request.content,
                size,
            },
        );
        Ok(sha)
    }
}

/// Prompter answering from a script and recording what it was shown
pub struct ScriptedPrompter {
    inputs: Mutex<VecDeque<Option<String>>>,
    selection: Option<String>,
    asked: Mutex<usize>,
    offered: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new<S: Into<String>>(inputs: Vec<Option<S>>) -> Self {
        Self {
            inputs: Mutex::new(inputs.into_iter().map(|i| i.map(Into::into)).collect()),
            selection: None,
            asked: Mutex::new(0),
            offered: Mutex::new(Vec::new()),
        }
    }

    /// Answer to give `select_many`; `None` cancels
    pub fn with_selection(mut self, selection: Option<&str>) -> Self {
        self.selection = selection.map(str::to_string);
        self
    }

    pub fn inputs_asked(&self) -> usize {
        *self.asked.lock().unwrap()
    }

    /// Item lists passed to `select_many`
    pub fn offered(&self) -> Vec<Vec<String>> {
        self.offered.lock().unwrap().clone()
    }

    fn next(&self) -> Option<String> {
        *self.asked.lock().unwrap() += 1;
        self.inputs.lock().unwrap().pop_front().flatten()
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.next())
    }

    fn secret(&self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.next())
    }

    fn select_many(&self, _title: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        self.offered.lock().unwrap().push(items.to_vec());
        match &self.selection {
            Some(answer) => parse_selection(answer, items.len()).map(Some),
            None => Ok(None),
        }
    }
}

/// Config sink keeping every persisted snapshot
#[derive(Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<Config>>,
}

impl RecordingSink {
    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Config> {
        self.saved.lock().unwrap().last().cloned()
    }
}

impl ConfigSink for RecordingSink {
    fn persist(&self, config: &Config) -> Result<()> {
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}
