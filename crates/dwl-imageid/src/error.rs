#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageIdError {
    #[error("invalid frame range {start}..={end}")]
    InvalidFrameRange { start: u32, end: u32 },

    #[error("instance is missing {0}")]
    MissingIdentifier(&'static str),
}

pub type ImageIdResult<T> = Result<T, ImageIdError>;
