use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("invalid particle field configuration: count must be at least 1, got {count}")]
    InvalidConfiguration { count: u32 },
}
