use thiserror::Error;

/// Numerical edge cases that would otherwise silently yield non-finite values.
///
/// No corrective value is ever substituted; deciding how to recover is left to
/// the caller or the solver policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalError {
    #[error("Near-zero denominator in {what}: {value}")]
    NearZeroDenominator { what: String, value: f64 },
    #[error("Fractional power of a negative base in {what}: {base}^{exponent}")]
    NegativeBase {
        what: String,
        base: f64,
        exponent: f64,
    },
    #[error("Depreciation rate must lie in [0, 1), got {0}")]
    InvalidDepreciation(f64),
    #[error("Non-finite value in {what}: {value}")]
    NonFinite { what: String, value: f64 },
}

/// Argument and unit errors raised by the quantity resolver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantityError {
    #[error("A quantity takes 2 or 3 arguments (string, target) or (value, unit, target), got {0}")]
    WrongArgumentCount(usize),
    #[error("Quantity was skipped with `false` but skipping is not allowed here")]
    SkipNotAllowed,
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("Could not parse '{input}': {details}")]
    Parse { input: String, details: String },
    #[error("Cannot convert from '{from}' to '{to}': incompatible dimensions")]
    IncompatibleUnits { from: String, to: String },
}

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum RSIAMError {
    #[error("{0}")]
    Error(String),
    #[error("Unknown damage module '{0}'. Expected one of RICE2010, RICE2012, WITCH")]
    UnknownDamageModule(String),
    #[error("Region '{region}' is not known to the {module} coefficient mapping")]
    UnknownRegion { region: String, module: String },
    #[error("Missing parameter '{parameter}' for {context}")]
    MissingParameter { parameter: String, context: String },
    #[error("Invalid value for '{parameter}': {value} ({reason})")]
    InvalidParameter {
        parameter: String,
        value: f64,
        reason: String,
    },
    #[error("'{0}' is already declared in the model namespace")]
    DuplicateDeclaration(String),
    #[error("'{0}' has not been declared in the model namespace")]
    UndeclaredName(String),
    #[error("'{name}' is declared with index {declared} but was accessed as {requested}")]
    IndexMismatch {
        name: String,
        declared: String,
        requested: String,
    },
    #[error("Variable '{variable}' required by {component} is neither produced by a component nor supplied exogenously")]
    MissingInput { variable: String, component: String },
    #[error("Variable '{variable}' is produced by both {first} and {second}")]
    DuplicateProducer {
        variable: String,
        first: String,
        second: String,
    },
    #[error("{component} did not declare its output '{variable}'")]
    UndeclaredOutput { component: String, variable: String },
    #[error("Component dependencies contain a cycle through {0}")]
    CircularDependency(String),
    #[error("Invalid time axis: {0}")]
    InvalidTimeAxis(String),
    #[error("Invalid region set: {0}")]
    InvalidRegions(String),
    #[error("Shape mismatch for '{name}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RSIAMError {
    /// True for errors in how the model was configured (fatal at assembly time).
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            RSIAMError::Numerical(_) | RSIAMError::Quantity(_) | RSIAMError::Error(_)
        )
    }

    /// True for numerical edge cases detected while evaluating relations.
    pub fn is_numerical(&self) -> bool {
        matches!(self, RSIAMError::Numerical(_))
    }
}

/// Convenience type for `Result<T, RSIAMError>`.
pub type RSIAMResult<T> = Result<T, RSIAMError>;
