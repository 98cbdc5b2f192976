use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("matrix error: {0}")]
    Matrix(#[from] sq_matrix::MatrixError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
