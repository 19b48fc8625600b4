use remotefs_storage::{ClientError, ClientResult};
use serde::Deserialize;

/// Envelope every slave endpoint answers with. A non-zero `code` is an error
/// even when the HTTP status is 200.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i32,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> ClientResult<Option<T>> {
        if self.code != 0 {
            return Err(ClientError::Remote {
                code: self.code,
                message: self.msg,
            });
        }
        Ok(self.data)
    }
}

/// One path the slave could not delete.
#[derive(Debug, Deserialize)]
pub(crate) struct DeleteFailure {
    pub path: String,
    pub reason: String,
}
