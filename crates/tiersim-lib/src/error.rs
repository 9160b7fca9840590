use thiserror::Error;

/// Failures the engine reports to its caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Invalid pricing table or policy parameters. Raised before any month
    /// is simulated.
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    /// A quantity stopped being finite.
    #[error("{quantity} became non-finite in month {month}")]
    Numeric { month: u32, quantity: String },
}

impl SimulationError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimulationError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn numeric(month: u32, quantity: impl Into<String>) -> Self {
        SimulationError::Numeric {
            month,
            quantity: quantity.into(),
        }
    }

    /// Name of the offending field for configuration errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            SimulationError::Configuration { field, .. } => Some(field),
            SimulationError::Numeric { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
