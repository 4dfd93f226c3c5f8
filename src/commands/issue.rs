use thiserror::Error;

use crate::issuer::{IssuanceRequest, Issuer};
use crate::jwt::error::IssueError;
use crate::jwt::signer::JwtSigner;
use crate::parameters::OutputTokenFormat;

#[derive(Error, Debug)]
pub enum IssueCommandError {
    /// The token could not be issued.
    #[error("issuing token: {0}")]
    Issue(#[from] IssueError),
    /// The response could not be rendered as JSON.
    #[error("formatting output: {0}")]
    Output(#[from] serde_json::Error),
}

pub struct IssueCommand<S> {
    issuer: Issuer<S>,
}

impl<S> IssueCommand<S>
where
    S: JwtSigner,
{
    pub fn new(issuer: Issuer<S>) -> Self {
        Self { issuer }
    }

    /// Issues a token and renders it in the requested format.
    pub fn issue(
        &self,
        request: IssuanceRequest,
        format: OutputTokenFormat,
    ) -> Result<String, IssueCommandError> {
        let response = self.issuer.issue(request)?;
        match format {
            OutputTokenFormat::Plain => Ok(response.token),
            OutputTokenFormat::Json => Ok(serde_json::to_string_pretty(&response)?),
        }
    }
}
