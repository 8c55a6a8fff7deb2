use anyhow::{Context, Result};
use std::io::Read;

use super::Command;
use crate::actions::{dispatch, ActionRequest, ActionResponse};
use crate::errors::EscrowError;
use crate::service::JobService;

/// Executes one JSON-encoded [`ActionRequest`] from a file or stdin
pub struct ApplyCommand {
    file: Option<String>,
}

impl ApplyCommand {
    pub fn new(file: Option<String>) -> Self {
        Self { file }
    }

    fn read_source(&self) -> Result<String> {
        match self.file.as_deref() {
            None | Some("-") => {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("reading request from stdin")?;
                Ok(input)
            }
            Some(path) => {
                std::fs::read_to_string(path).with_context(|| format!("reading request file {path}"))
            }
        }
    }
}

/// Malformed requests become a VALIDATION_ERROR envelope
pub fn parse_request(input: &str) -> Result<ActionRequest, EscrowError> {
    serde_json::from_str(input).map_err(|e| EscrowError::validation("request", e.to_string()))
}

impl Command for ApplyCommand {
    async fn execute(&self, service: &JobService) -> Result<ActionResponse> {
        let input = self.read_source()?;
        Ok(match parse_request(&input) {
            Ok(request) => dispatch(service, request).await,
            Err(e) => ActionResponse::error(&e),
        })
    }
}
