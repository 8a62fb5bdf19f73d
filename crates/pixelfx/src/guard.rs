use std::fmt::Display;

/// Runs one host-boundary operation, logging and swallowing its failure.
pub fn attempt<T, E: Display>(step: &'static str, op: impl FnOnce() -> Result<T, E>) -> Option<T> {
    match op() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(step, error = %err, "host operation failed; continuing");
            None
        }
    }
}

/// [`attempt`] with a running failure count.
#[derive(Debug, Default)]
pub struct Attempts {
    failures: usize,
}

impl Attempts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run<T, E: Display>(
        &mut self,
        step: &'static str,
        op: impl FnOnce() -> Result<T, E>,
    ) -> Option<T> {
        let result = attempt(step, op);
        if result.is_none() {
            self.failures += 1;
        }
        result
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}
