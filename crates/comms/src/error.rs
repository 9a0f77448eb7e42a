use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommsError>;

#[derive(Error, Debug)]
pub enum CommsError {
    #[error("conversation query needs a person or a search term")]
    InvalidQuery,
}
