/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Dataset source backed by JSON files in one directory

use crate::domain::{DatasetDomain, DatasetError};
use crate::ports::DatasetSource;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reads each domain's files from a dataset directory.
///
/// A domain backed by several files (chipsets) loads whichever of them
/// exist; it fails only when none do.
pub struct JsonFileDatasetSource {
    dir: PathBuf,
}

impl JsonFileDatasetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_document(&self, file_name: &str) -> Result<Option<Value>, DatasetError> {
        let path = self.dir.join(file_name);
        let display = path.display().to_string();

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DatasetError::Io {
                    path: display,
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| DatasetError::Parse {
                path: display,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl DatasetSource for JsonFileDatasetSource {
    async fn load(&self, domain: DatasetDomain) -> Result<Vec<Value>, DatasetError> {
        let mut documents = Vec::new();
        for file_name in domain.file_names() {
            match self.read_document(file_name).await? {
                Some(doc) => documents.push(doc),
                None => debug!("Dataset file {} not present in {}", file_name, self.location()),
            }
        }

        if documents.is_empty() {
            return Err(DatasetError::NotFound(
                domain
                    .file_names()
                    .iter()
                    .map(|name| self.dir.join(name).display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }
        Ok(documents)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
