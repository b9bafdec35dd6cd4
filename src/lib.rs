//! Java type-system primitives for Javelin.
//!
//! This crate is the core of Javelin's semantic understanding of Java types:
//! a compact [`Type`] term representation plus the algebra a front-end needs
//! on top of it — structural equality, subtyping with unchecked conversion,
//! supertype enumeration, substitution, capture conversion, type projection,
//! method signatures and overriding, and functional-interface (SAM) function
//! types.
//!
//! Class and type-parameter metadata live in a [`TypeStore`] behind the
//! read-only [`TypeEnv`] trait. All algebra operations are methods on
//! [`TyContext`], a per-analysis session that additionally owns
//! context-local capture variables and inference-variable bound sets. The
//! context is the only mutable piece: queries in inference mode accrete
//! bounds on [`Type::Infer`] variables as a documented side effect, which is
//! what the surrounding inference solver builds on.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod ctx;
mod equate;
mod format;
mod project;
mod sam;
mod sig;
mod store;
mod subst;
mod subtype;

pub use ctx::{BoundKind, TyContext};
pub use equate::{mentions, mentions_any, mentions_any_tvar, sig_mentions_any};
pub use format::{format_method_sig, format_type, MethodSigDisplay, TypeDisplay};
pub use sig::{accessible_method_filter, KeepAllOverloads, MethodSig, OverloadComparator};
pub use store::{
    boxed_class, declaration, ClassDef, ClassKind, MethodDef, TypeEnv, TypeParamDef, TypeStore,
    Visibility, WellKnownTypes,
};
pub use subst::{subst, subst_types, Substitution};
pub use subtype::{all_args_unbounded_wildcards, as_list};

/// Identifier for a Java class or interface (top-level or nested).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// Identifier for a type variable.
///
/// Declared type parameters live in the [`TypeStore`]; capture variables are
/// allocated by a [`TyContext`] and carry the high bit so both kinds resolve
/// through the same lookup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct TypeVarId(pub u32);

impl TypeVarId {
    const CONTEXT_LOCAL_BIT: u32 = 1 << 31;

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) fn new_context_local(index: u32) -> Self {
        Self(Self::CONTEXT_LOCAL_BIT | index)
    }

    pub(crate) fn context_local_index(self) -> Option<usize> {
        if (self.0 & Self::CONTEXT_LOCAL_BIT) == 0 {
            return None;
        }
        Some((self.0 & !Self::CONTEXT_LOCAL_BIT) as usize)
    }
}

/// Identifier for an inference variable, owned by a [`TyContext`] session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct InferVarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }

    /// Widening primitive conversion (JLS 5.1.2), reflexively.
    pub fn widens_to(self, to: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == to {
            return true;
        }
        match (self, to) {
            (Byte, Short | Int | Long | Float | Double) => true,
            (Short, Int | Long | Float | Double) => true,
            (Char, Int | Long | Float | Double) => true,
            (Int, Long | Float | Double) => true,
            (Long, Float | Double) => true,
            (Float, Double) => true,
            _ => false,
        }
    }

    /// Binary name of the wrapper class for this primitive.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }
}

/// A class or interface instantiation: `C<A1, .., An>`, possibly nested in
/// an enclosing instantiation.
///
/// `args` empty while the class declares type parameters means the *raw*
/// type, which is viewed with erased supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
    pub enclosing: Option<Box<ClassType>>,
}

impl ClassType {
    pub fn new(def: ClassId, args: Vec<Type>) -> Self {
        Self {
            def,
            args,
            enclosing: None,
        }
    }

    pub fn with_enclosing(mut self, enclosing: ClassType) -> Self {
        self.enclosing = Some(Box::new(enclosing));
        self
    }
}

/// Bound of a wildcard type argument.
///
/// Exactly one side of a wildcard is ever non-trivial: the lower bound of an
/// `extends` (or unbounded) wildcard is the null type, the upper bound of a
/// `super` wildcard is `Object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

impl WildcardBound {
    /// Whether this wildcard is upper-bounded (`?` or `? extends U`).
    pub fn is_upper(&self) -> bool {
        !matches!(self, WildcardBound::Super(_))
    }

    /// Whether this wildcard is lower-bounded (`? super L`).
    pub fn is_lower(&self) -> bool {
        matches!(self, WildcardBound::Super(_))
    }
}

/// A Java type term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// The special `void` pseudo-type.
    Void,

    /// Primitive types: `int`, `boolean`, etc.
    Primitive(PrimitiveType),

    /// Reference to a class/interface with type arguments.
    Class(ClassType),

    /// Array type.
    Array(Box<Type>),

    /// Type variable: a declared type parameter or a capture variable.
    TypeVar(TypeVarId),

    /// Inference variable owned by a [`TyContext`] session.
    Infer(InferVarId),

    /// Wildcard type argument: `?`, `? extends T`, `? super T`.
    Wildcard(WildcardBound),

    /// Intersection type `A & B & ..`. Flattened; at most one non-interface
    /// component, ordered first.
    Intersection(Vec<Type>),

    /// The null type, bottom of the reference types.
    Null,

    /// An unresolved type (missing symbol). Used for error recovery.
    Unknown,

    /// An error type (failed check). Used for error recovery.
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType::new(def, args))
    }

    pub fn inner_class(enclosing: ClassType, def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType::new(def, args).with_enclosing(enclosing))
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn wildcard_extends(bound: Type) -> Self {
        Type::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    pub fn wildcard_super(bound: Type) -> Self {
        Type::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_)
                | Type::Array(_)
                | Type::TypeVar(_)
                | Type::Infer(_)
                | Type::Intersection(_)
                | Type::Null
        )
    }

    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Error)
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(ct) => Some(ct),
            _ => None,
        }
    }

    pub fn array_element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        })
    }
}
