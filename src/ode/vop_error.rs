use crate::symbolic::parse_expr::ParseError;
use crate::symbolic::polynomial::RootError;
use crate::symbolic::symbolic_expand::ExpandError;
use crate::symbolic::symbolic_integration::IntegrationError;
use thiserror::Error;

/// Errors of the variation-of-parameters pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VopError {
    #[error("cannot parse equation: {0}")]
    Parse(String),
    #[error("cannot determine the order of the equation: {0}")]
    DegreeMismatch(String),
    #[error("unresolved characteristic roots: {0}")]
    UnresolvedRoots(String),
    #[error("fundamental set has {found} functions, the equation has order {expected}")]
    BasisSizeMismatch { expected: usize, found: usize },
    #[error("singular Wronskian: {0}")]
    SingularWronskian(String),
    #[error("no elementary antiderivative of u{index}' = {integrand}")]
    NonElementaryIntegral { index: usize, integrand: String },
    #[error("expected {expected} initial conditions, got {found}")]
    ConditionCount { expected: usize, found: usize },
    #[error("the system of initial conditions cannot be solved: {0}")]
    UnsolvableSystem(String),
    #[error("solution still contains the constants {0:?}")]
    UnresolvedConstants(Vec<String>),
    #[error("{operation} requires the stage {required}, the solver is at {current}")]
    StageOrder {
        operation: String,
        required: String,
        current: String,
    },
    #[error("computation cancelled")]
    Cancelled,
    #[error("computation exceeded the time limit of {0} ms")]
    TimedOut(u128),
    #[error("algebra error: {0}")]
    Algebra(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type VopResult<T> = Result<T, VopError>;

impl From<ParseError> for VopError {
    fn from(e: ParseError) -> Self {
        VopError::Parse(e.to_string())
    }
}

impl From<ExpandError> for VopError {
    fn from(e: ExpandError) -> Self {
        VopError::Algebra(e.to_string())
    }
}

impl From<RootError> for VopError {
    fn from(e: RootError) -> Self {
        match e {
            RootError::ZeroPolynomial => VopError::DegreeMismatch(e.to_string()),
            RootError::Unresolved { .. } => VopError::UnresolvedRoots(e.to_string()),
            // the limit guard reports the precise reason
            RootError::Interrupted => VopError::Cancelled,
        }
    }
}

impl From<toml::de::Error> for VopError {
    fn from(e: toml::de::Error) -> Self {
        VopError::Config(e.to_string())
    }
}

impl From<std::io::Error> for VopError {
    fn from(e: std::io::Error) -> Self {
        VopError::Config(e.to_string())
    }
}

impl From<IntegrationError> for VopError {
    fn from(e: IntegrationError) -> Self {
        match e {
            IntegrationError::Interrupted => VopError::Cancelled,
            IntegrationError::NoElementaryForm(integrand) => VopError::NonElementaryIntegral { index: 0, integrand },
            IntegrationError::Expand(inner) => inner.into(),
        }
    }
}
