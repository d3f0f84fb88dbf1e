use desk_reconcile::SettleRefusal;
use serde::Serialize;

/// Stable machine-readable error code. The HTTP layer maps each kind to a
/// status code; the string form is what clients match on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    TransactionFailed,
    VerificationFailed,
    /// A caller-supplied policy blocked an otherwise valid transition.
    PolicyRefused,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TransactionFailed => "transaction_failed",
            ErrorKind::VerificationFailed => "verification_failed",
            ErrorKind::PolicyRefused => "policy_refused",
        }
    }
}

/// Failure of a payment engine operation. Nothing was committed unless the
/// kind is `VerificationFailed` on a pending payment, which is recorded as
/// `failed` before this is returned.
#[derive(Debug)]
pub struct PaymentError {
    kind: ErrorKind,
    message: String,
    source: Option<anyhow::Error>,
}

impl PaymentError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn verification_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VerificationFailed, message)
    }

    pub fn policy_refused(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyRefused, message)
    }

    /// Datastore or collaborator failure. The cause is kept as the source
    /// for logs; the client-facing message stays generic.
    pub fn transaction_failed(what: &str, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            kind: ErrorKind::TransactionFailed,
            message: format!("{what} failed; no changes were saved"),
            source: Some(cause.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for PaymentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

impl From<SettleRefusal> for PaymentError {
    fn from(r: SettleRefusal) -> Self {
        match r {
            // Stored status ahead of the stored balance: the row is corrupt,
            // not the request.
            SettleRefusal::StatusRegression { .. } => {
                PaymentError::transaction_failed("settlement", anyhow::Error::new(r))
            }
            other => PaymentError::invalid_argument(other.to_string()),
        }
    }
}
