//! Scriptable in-memory provider used by unit tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::processing::ReadyFile;
use crate::providers::RemoteFileProvider;
use crate::types::{ReadinessState, RemoteFile};

/// Build a handle the way a backend would return it right after upload
pub(crate) fn remote_file(name: &str) -> RemoteFile {
    RemoteFile {
        name: name.to_string(),
        uri: format!("https://backend.test/v1beta/{}", name),
        mime_type: "application/pdf".to_string(),
        display_name: None,
        size_bytes: None,
        create_time: None,
        state: ReadinessState::Processing,
    }
}

/// Counters for every provider call
#[derive(Debug, Clone, Default)]
pub(crate) struct Calls {
    pub upload: usize,
    pub status: usize,
    pub converse: usize,
    pub delete: usize,
    pub deleted: Vec<String>,
    /// Most recent status handed out when `converse` was called
    pub status_at_converse: Vec<Option<ReadinessState>>,
}

/// Provider whose answers are scripted up front
pub(crate) struct FakeProvider {
    statuses: Vec<ReadinessState>,
    reply: String,
    fail_upload: bool,
    fail_status: bool,
    fail_converse: bool,
    fail_delete: bool,
    calls: Mutex<Calls>,
    last_status: Mutex<Option<ReadinessState>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            statuses: vec![ReadinessState::Active],
            reply: "[]".to_string(),
            fail_upload: false,
            fail_status: false,
            fail_converse: false,
            fail_delete: false,
            calls: Mutex::new(Calls::default()),
            last_status: Mutex::new(None),
        }
    }

    /// Statuses returned in order; the last one repeats forever
    pub fn with_statuses(mut self, statuses: &[ReadinessState]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn failing_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    pub fn failing_converse(mut self) -> Self {
        self.fail_converse = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteFileProvider for FakeProvider {
    async fn upload(&self, path: &Path, mime_type: &str, display_name: &str) -> Result<RemoteFile> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.upload += 1;
            calls.upload
        };

        if self.fail_upload {
            return Err(Error::transport("connection refused"));
        }
        assert!(path.exists(), "upload of missing file {}", path.display());

        let mut file = remote_file(&format!("files/test-{}", count));
        file.mime_type = mime_type.to_string();
        file.display_name = Some(display_name.to_string());
        Ok(file)
    }

    async fn get_status(&self, file: &RemoteFile) -> Result<ReadinessState> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.status += 1;
            calls.status - 1
        };

        if self.fail_status {
            return Err(Error::transport(format!("unknown file {}", file.name)));
        }

        let state = self.statuses[index.min(self.statuses.len() - 1)];
        *self.last_status.lock().unwrap() = Some(state);
        Ok(state)
    }

    async fn converse(&self, _file: &ReadyFile, _instruction: &str) -> Result<String> {
        let last = *self.last_status.lock().unwrap();
        {
            let mut calls = self.calls.lock().unwrap();
            calls.converse += 1;
            calls.status_at_converse.push(last);
        }

        if self.fail_converse {
            return Err(Error::inference("model overloaded"));
        }
        Ok(self.reply.clone())
    }

    async fn delete(&self, file: &RemoteFile) -> Result<()> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.delete += 1;
            calls.deleted.push(file.name.clone());
        }

        if self.fail_delete {
            return Err(Error::transport("delete rejected"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
