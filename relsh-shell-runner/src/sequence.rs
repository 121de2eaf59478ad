use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::operation::{Operation, Outcome};

/// Ordered list of operations run one after another.
///
/// A step starts only after the previous one succeeded; the first failure
/// ends the sequence and is returned as-is.
#[derive(Debug, Default)]
pub struct Sequence {
    steps: Vec<Operation>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, step: Operation) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Operation) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(self, dispatcher: &Dispatcher) -> Result<Vec<Outcome>, DispatchError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        for step in self.steps {
            outcomes.push(dispatcher.run(step).await?);
        }
        Ok(outcomes)
    }
}

impl FromIterator<Operation> for Sequence {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
