//! Closed error taxonomy for the producer buffer (C9).

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("buffer has been disposed")]
    Disposed,
}
