use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Timestamp error: {0}")]
    Timestamp(String),
    #[error("Config error: {0}")]
    Config(String),
}
