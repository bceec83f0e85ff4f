use super::{ObjectId, TypedObject};
use crate::error::{Error, Result};

/// Value of a git reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    Direct(ObjectId),
    Symbolic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub target: RefTarget,
}

impl Reference {
    pub fn direct(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Direct(id),
        }
    }

    pub fn symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Symbolic(target.into()),
        }
    }
}

/// Read access to the local repository
pub trait ObjectStore {
    /// Resolve a reference by name without following symbolic targets
    fn resolve_reference(&self, name: &str) -> Result<Reference>;

    /// All local branches (`refs/heads/*`)
    fn branches(&self) -> Result<Vec<Reference>>;

    /// Fetch an object's kind, header size and payload
    fn object(&self, id: &ObjectId) -> Result<TypedObject>;

    /// Follow symbolic references until a direct one is reached
    fn peel_reference(&self, name: &str) -> Result<ObjectId> {
        let mut current = name.to_string();
        // git itself gives up after 5 levels of symref nesting
        for _ in 0..5 {
            match self.resolve_reference(&current)?.target {
                RefTarget::Direct(id) => return Ok(id),
                RefTarget::Symbolic(target) => current = target,
            }
        }
        Err(Error::retrieval(format!(
            "symbolic reference chain too deep starting at {}",
            name
        )))
    }
}
