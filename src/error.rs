use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid client or call parameters, rejected before any request is made.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure, timeout, non-2xx status or an unreadable JSON envelope.
    #[error("request to {endpoint} ({params}) failed{}: {message}", fmt_status(.status, .timed_out))]
    ExchangeRequest {
        endpoint: String,
        params: String,
        status: Option<u16>,
        timed_out: bool,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The envelope decoded but a record inside it did not.
    #[error("malformed record #{index} from {endpoint}: {message}")]
    MalformedRecord {
        endpoint: String,
        index: usize,
        message: String,
    },
}

fn fmt_status(status: &Option<u16>, timed_out: &bool) -> String {
    match (status, timed_out) {
        (_, true) => " (timed out)".to_string(),
        (Some(code), false) => format!(" with status {}", code),
        (None, false) => String::new(),
    }
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_exchange_request(&self) -> bool {
        matches!(self, Error::ExchangeRequest { .. })
    }

    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Error::MalformedRecord { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ExchangeRequest { timed_out: true, .. })
    }

    /// HTTP status of a failed request, if the exchange answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ExchangeRequest { status, .. } => *status,
            _ => None,
        }
    }
}
