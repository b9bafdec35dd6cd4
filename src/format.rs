//! Java-like, deterministic formatting for types and method signatures.
//!
//! Meant for user-visible output (diagnostics, hover). Formatting rules are
//! simple and stable: binary names as stored, `<..>` for arguments, nested
//! instantiations joined with `.`.

use std::fmt;

use crate::sig::MethodSig;
use crate::store::TypeEnv;
use crate::{ClassType, Type, WildcardBound};

/// Convenience helper to format a [`Type`] into a newly allocated `String`.
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    TypeDisplay { env, ty }.to_string()
}

/// Display wrapper for formatting a [`Type`] with access to a [`TypeEnv`].
pub struct TypeDisplay<'a> {
    pub env: &'a dyn TypeEnv,
    pub ty: &'a Type,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(env: &'a dyn TypeEnv, ty: &'a Type) -> Self {
        Self { env, ty }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_type(self.env, self.ty, f)
    }
}

/// Convenience helper to format a [`MethodSig`].
pub fn format_method_sig(env: &dyn TypeEnv, sig: &MethodSig) -> String {
    MethodSigDisplay { env, sig }.to_string()
}

/// Display wrapper for formatting a [`MethodSig`].
pub struct MethodSigDisplay<'a> {
    pub env: &'a dyn TypeEnv,
    pub sig: &'a MethodSig,
}

impl fmt::Display for MethodSigDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.sig;
        if !sig.type_params.is_empty() {
            f.write_str("<")?;
            for (i, var) in sig.type_params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match self.env.type_param(*var) {
                    Some(def) => f.write_str(&def.name)?,
                    None => write!(f, "T#{}", var.0)?,
                }
            }
            f.write_str("> ")?;
        }
        if !sig.is_constructor {
            fmt_type(self.env, &sig.return_type, f)?;
            f.write_str(" ")?;
        }
        f.write_str(&sig.name)?;
        f.write_str("(")?;
        for (i, param) in sig.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt_type(self.env, param, f)?;
        }
        f.write_str(")")?;
        if !sig.thrown.is_empty() {
            f.write_str(" throws ")?;
            for (i, thrown) in sig.thrown.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_type(self.env, thrown, f)?;
            }
        }
        Ok(())
    }
}

fn fmt_type(env: &dyn TypeEnv, ty: &Type, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match ty {
        Type::Void => f.write_str("void"),
        Type::Primitive(prim) => write!(f, "{prim}"),
        Type::Null => f.write_str("null"),
        Type::Unknown => f.write_str("<unknown>"),
        Type::Error => f.write_str("<error>"),
        Type::Class(ct) => fmt_class(env, ct, f),
        Type::Array(elem) => {
            fmt_type(env, elem, f)?;
            f.write_str("[]")
        }
        Type::TypeVar(var) => match env.type_param(*var) {
            Some(def) => f.write_str(&def.name),
            None => write!(f, "T#{}", var.0),
        },
        Type::Infer(var) => write!(f, "#{}", var.0),
        Type::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            f.write_str("? extends ")?;
            fmt_type(env, bound, f)
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            f.write_str("? super ")?;
            fmt_type(env, bound, f)
        }
        Type::Intersection(parts) => {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(" & ")?;
                }
                fmt_type(env, part, f)?;
            }
            Ok(())
        }
    }
}

fn fmt_class(env: &dyn TypeEnv, ct: &ClassType, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(enclosing) = &ct.enclosing {
        fmt_class(env, enclosing, f)?;
        f.write_str(".")?;
        f.write_str(simple_name(env, ct))?;
    } else {
        match env.class(ct.def) {
            Some(def) => f.write_str(&def.name)?,
            None => write!(f, "C#{}", ct.def.0)?,
        }
    }
    if !ct.args.is_empty() {
        f.write_str("<")?;
        for (i, arg) in ct.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt_type(env, arg, f)?;
        }
        f.write_str(">")?;
    }
    Ok(())
}

fn simple_name<'e>(env: &'e dyn TypeEnv, ct: &ClassType) -> &'e str {
    match env.class(ct.def) {
        Some(def) => def
            .name
            .rsplit_once(['.', '$'])
            .map(|(_, simple)| simple)
            .unwrap_or(&def.name),
        None => "<missing>",
    }
}
