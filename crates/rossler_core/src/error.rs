//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    /// Rejected input: bad integration time, malformed vectors, invalid grids or settings.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The integrator could not meet its tolerances.
    #[error("Integration failed at t = {time}: {reason}")]
    IntegrationFailure { time: f64, reason: String },
}

impl FlowError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FlowError::InvalidArgument(message.into())
    }

    pub(crate) fn failure(time: f64, reason: impl Into<String>) -> Self {
        FlowError::IntegrationFailure {
            time,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::FlowError;

    #[test]
    fn messages_carry_context() {
        let err = FlowError::invalid("Jacobian time must be positive.");
        assert_eq!(
            format!("{err}"),
            "Invalid argument: Jacobian time must be positive."
        );

        let err = FlowError::failure(1.5, "step size underflow");
        assert_eq!(
            format!("{err}"),
            "Integration failed at t = 1.5: step size underflow"
        );
    }
}
