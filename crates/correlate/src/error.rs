use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorrelateError>;

#[derive(Error, Debug)]
pub enum CorrelateError {
    #[error("min_devices must be at least 1, got {0}")]
    InvalidMinDevices(usize),
}
