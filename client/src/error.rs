use crate::session::ClientState;
use shared::{DecodeError, DispatchError, ProtocolError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to encode packet: {0}")]
    Encode(#[from] bincode::Error),
    #[error("operation not allowed while {0:?}")]
    InvalidState(ClientState),
}

impl ClientError {
    /// Whether a fresh handshake attempt can reasonably succeed after this.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ClientError::Transport(TransportError::Io(_)) | ClientError::InvalidState(_)
        )
    }
}

impl From<DispatchError> for ClientError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Protocol(e) => ClientError::Protocol(e),
            DispatchError::Decode(e) => ClientError::Decode(e),
        }
    }
}
