#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Receiver not found: {0}")]
    ReceiverNotFound(String),

    #[error("Failed to claim interface {iface}: {reason}")]
    ClaimInterface { iface: u8, reason: String },

    #[error("Device removed")]
    DeviceRemoved,

    #[error("Transfer timed out")]
    Timeout,

    #[error("USB error: {0}")]
    Usb(#[source] rusb::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Thread spawn failed: {0}")]
    ThreadSpawn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusb::Error> for DriverError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::NoDevice => DriverError::DeviceRemoved,
            rusb::Error::Timeout => DriverError::Timeout,
            other => DriverError::Usb(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
