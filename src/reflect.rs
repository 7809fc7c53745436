//! Type metadata registry backing the reflection assertions.
//!
//! A statically compiled program has no runtime type introspection, so the
//! reflection predicates (`be_a`, `have_methods`, `have_trait`, the
//! kind-existence checks) operate over an explicit registry populated by
//! test authors. Declarations carry a kind, assignability edges, directly
//! composed mixin traits, and callable member names.
//!
//! The process-wide registry is append-only and is never torn down between
//! test units: a unit may register types that a later unit's assertions
//! observe.
//!
//! ## Registry Invariant
//! The global registry is the single source of truth for the assertion
//! engine. Unit tests that need a differently-configured registry (e.g. one
//! without enum support) construct a local [`TypeRegistry`] and use the
//! query methods directly.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::RwLock;

use once_cell::sync::Lazy;

// ============================================================================
// Declarations
// ============================================================================

/// The kind of a registered type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete, instantiable type.
    Class,
    /// A pure contract; only assignability and methods.
    Interface,
    /// A mixin composed into other types.
    Trait,
    /// An enumeration.
    Enum,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Trait => "trait",
            TypeKind::Enum => "enum",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One type declaration: name, kind, supertype edges, composed mixins, and
/// declared method names. Built fluently:
///
/// ```rust
/// use attest::reflect::TypeDecl;
/// let decl = TypeDecl::class("User")
///     .extends("Model")
///     .implements("Serializable")
///     .mixes("Timestamps")
///     .methods(["save", "load"]);
/// assert_eq!(decl.name, "User");
/// ```
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Assignability edges: parents and implemented interfaces alike.
    pub supers: Vec<String>,
    /// Directly composed mixin traits.
    pub mixins: Vec<String>,
    /// Callable member names declared directly on this type.
    pub methods: Vec<String>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supers: Vec::new(),
            mixins: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn trait_(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Trait)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    /// Adds a parent type edge.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.supers.push(parent.into());
        self
    }

    /// Adds an implemented-interface edge. Same assignability list as
    /// `extends`; the two spellings exist for declaration readability.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.supers.push(interface.into());
        self
    }

    /// Composes a mixin trait directly into this type.
    pub fn mixes(mut self, mixin: impl Into<String>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    /// Declares one callable member.
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    /// Declares several callable members.
    pub fn methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(names.into_iter().map(Into::into));
        self
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A collection of type declarations with the queries the assertion engine
/// needs. Append-only: re-registering a name keeps the first declaration.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    decls: HashMap<String, TypeDecl>,
    enum_support: bool,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            decls: HashMap::new(),
            enum_support: true,
        }
    }

    /// A registry modeling an environment without enum declarations. Enum
    /// assertions against it are a fatal precondition violation.
    pub fn without_enums() -> Self {
        Self {
            decls: HashMap::new(),
            enum_support: false,
        }
    }

    pub fn supports_enums(&self) -> bool {
        self.enum_support
    }

    pub fn register(&mut self, decl: TypeDecl) {
        self.decls.entry(decl.name.clone()).or_insert(decl);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.decls.get(name).map(|decl| decl.kind)
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// True when `subject` names `target` or any transitive supertype of it.
    /// Unknown names simply fail the walk; they are not an error here.
    pub fn is_a(&self, subject: &str, target: &str) -> bool {
        if subject == target {
            return true;
        }
        let mut visited = HashSet::new();
        let mut pending = vec![subject.to_string()];
        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(decl) = self.decls.get(&name) else {
                continue;
            };
            for parent in &decl.supers {
                if parent == target {
                    return true;
                }
                pending.push(parent.clone());
            }
        }
        false
    }

    /// True when the named type exposes a callable member with this name,
    /// whether declared directly, provided by a composed mixin, or
    /// inherited from a supertype.
    pub fn has_method(&self, type_name: &str, method: &str) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![type_name.to_string()];
        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(decl) = self.decls.get(&name) else {
                continue;
            };
            if decl.methods.iter().any(|m| m == method) {
                return true;
            }
            for mixin in &decl.mixins {
                if let Some(mixin_decl) = self.decls.get(mixin) {
                    if mixin_decl.methods.iter().any(|m| m == method) {
                        return true;
                    }
                }
            }
            pending.extend(decl.supers.iter().cloned());
        }
        false
    }

    /// True when the named type *directly* composes the named mixin.
    /// Inherited composition does not count.
    pub fn uses_trait(&self, type_name: &str, mixin: &str) -> bool {
        self.decls
            .get(type_name)
            .map(|decl| decl.mixins.iter().any(|m| m == mixin))
            .unwrap_or(false)
    }
}

// ============================================================================
// Process-wide registry
// ============================================================================

static GLOBAL: Lazy<RwLock<TypeRegistry>> = Lazy::new(|| RwLock::new(TypeRegistry::new()));

/// Registers a declaration in the process-wide registry. Append-only; the
/// first registration of a name wins.
pub fn register(decl: TypeDecl) {
    let mut registry = GLOBAL.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.register(decl);
}

/// Runs a query against the process-wide registry.
pub fn with_global<R>(query: impl FnOnce(&TypeRegistry) -> R) -> R {
    let registry = GLOBAL.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    query(&registry)
}
