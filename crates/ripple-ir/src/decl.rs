//! Declarations: variables, methods, types and external methods

use serde::{Deserialize, Serialize};

use crate::hash::stable_hash;
use crate::{Block, MethodId, Span, VarId};

/// Where a variable lives, which decides whether effects on it can be
/// observed outside the method that performs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarScope {
    /// Method-local variable that is never captured
    Local,
    /// Method parameter
    Parameter,
    /// Instance field
    Field,
    /// Static (class-level) variable
    Static,
    /// Local captured by a lambda or inner class
    Captured,
}

impl VarScope {
    /// Escaping variables may be read or written by other code or threads
    pub fn is_escaping(self) -> bool {
        matches!(self, VarScope::Field | VarScope::Static | VarScope::Captured)
    }
}

/// A variable declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub id: VarId,
    pub name: String,
    /// Declaring type for fields/statics, declaring method for locals
    pub owner: String,
    pub scope: VarScope,
    pub span: Span,
}

impl VariableDecl {
    pub fn is_escaping(&self) -> bool {
        self.scope.is_escaping()
    }

    /// Name that identifies the variable across compilation units
    pub fn stable_name(&self) -> String {
        format!("{}#{}", self.owner, self.name)
    }

    /// Stable hash of [`Self::stable_name`], used by the persistent cache
    pub fn stable_hash(&self) -> u64 {
        stable_hash(&self.stable_name())
    }
}

/// Identity of a method across compilation units: declaring type plus
/// signature. Two keys are equal exactly when they denote the same method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    pub declaring_type: String,
    pub name: String,
    /// Parameter type names, in order
    pub params: Vec<String>,
}

impl MethodKey {
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        params: &[&str],
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Same name and parameter list, regardless of declaring type
    pub fn same_signature(&self, other: &MethodKey) -> bool {
        self.name == other.name && self.params == other.params
    }

    /// Stable hash of the rendered key
    pub fn signature_hash(&self) -> u64 {
        stable_hash(&self.to_string())
    }
}

impl std::fmt::Display for MethodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}({})", self.declaring_type, self.name, self.params.join(","))
    }
}

/// How a method's behavior is provided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    /// Has an analyzable body
    Concrete,
    /// Abstract or interface method without a body
    Abstract,
    /// Native/foreign method whose body cannot be analyzed
    Native,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodModifiers {
    pub kind: MethodKind,
    pub is_static: bool,
    pub is_private: bool,
    pub is_constructor: bool,
}

impl MethodModifiers {
    pub fn concrete() -> Self {
        Self::of(MethodKind::Concrete)
    }

    pub fn of(kind: MethodKind) -> Self {
        Self {
            kind,
            is_static: false,
            is_private: false,
            is_constructor: false,
        }
    }

    /// Whether calls to this method are dispatched dynamically
    pub fn is_virtual(&self) -> bool {
        !self.is_static && !self.is_private && !self.is_constructor
    }
}

/// A method declared in the program being compiled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub id: MethodId,
    pub key: MethodKey,
    pub return_type: String,
    pub modifiers: MethodModifiers,
    /// Present exactly for [`MethodKind::Concrete`] methods
    pub body: Option<Block>,
    pub span: Span,
}

impl MethodDecl {
    pub fn kind(&self) -> MethodKind {
        self.modifiers.kind
    }
}

/// A class or interface declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Direct supertypes (superclass and implemented interfaces)
    pub supertypes: Vec<String>,
    pub span: Span,
}

/// A method outside the program (library code) known only by its compiled
/// content hash. Its effects come from the persistent cache, if anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalMethod {
    pub key: MethodKey,
    pub content_hash: String,
}
