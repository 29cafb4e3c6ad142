/// Result of running one task: the function's value, or the error it failed with.
///
/// Failures travel as data. Nothing is re-raised on the consumer side, so callers
/// branch on the variant.
#[derive(Debug)]
pub enum Outcome<R> {
    Success(R),
    Failure(anyhow::Error),
}

impl<R> Outcome<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn success(self) -> Option<R> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(self) -> Option<anyhow::Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> anyhow::Result<R> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(e) => Err(e),
        }
    }
}

impl<R> From<anyhow::Result<R>> for Outcome<R> {
    fn from(result: anyhow::Result<R>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Failure(e),
        }
    }
}
