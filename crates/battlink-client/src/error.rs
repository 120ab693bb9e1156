/// Errors that can occur during a request/response exchange.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure. Aborts the exchange; never retried here.
    #[error("transport error: {0}")]
    Transport(#[from] battlink_transport::TransportError),

    /// Frame-level failure while decoding a matched response.
    #[error("frame error: {0}")]
    Frame(#[from] battlink_frame::FrameError),

    /// The caller-supplied field name or value could not be encoded.
    #[error("config error: {0}")]
    Config(#[from] battlink_frame::ConfigError),

    /// The retry budget was spent without a matching response.
    #[error("no response to command 0x{command:02X} after {attempts} attempts")]
    RetriesExhausted { command: u8, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, ClientError>;
