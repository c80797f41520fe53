#[derive(Debug, thiserror::Error)]
#[error("{status_code} status code")]
pub struct ServerError {
    pub status_code: u16,
}

impl ServerError {
    /// Whether the authorization server is having trouble rather than
    /// rejecting the credentials.
    pub fn is_transient(&self) -> bool {
        self.status_code == 429 || (500..600).contains(&self.status_code)
    }
}

pub fn check_status(res: &reqwest::Response) -> Result<(), ServerError> {
    let status = res.status();
    if !status.is_success() {
        return Err(ServerError {
            status_code: status.as_u16(),
        });
    }
    Ok(())
}
