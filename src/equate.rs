//! Structural type equality and supertype enumeration.
//!
//! Equality runs in one of two modes. In pure mode it is a side-effect-free
//! structural check. In inference mode, comparing against an inference
//! variable records a bound on it and succeeds; the surrounding solver
//! interprets the accumulated bounds. The mode is a parameter of the check,
//! not of the types.

use std::collections::HashSet;

use crate::ctx::{BoundKind, TyContext};
use crate::sig::MethodSig;
use crate::store::TypeEnv;
use crate::subst::{subst, Substitution};
use crate::{ClassType, InferVarId, Type, TypeVarId, WildcardBound};

impl TyContext<'_> {
    /// Returns true if `t` and `s` are the same type.
    ///
    /// With `in_inference`, encountering an inference variable adds a bound
    /// on it instead of comparing identities: equality against a wildcard
    /// absorbs the wildcard bound as an upper or lower bound, equality
    /// against a primitive fails, and anything else becomes an equality
    /// bound.
    pub fn is_same_type(&mut self, t: &Type, s: &Type, in_inference: bool) -> bool {
        if t == s {
            return true;
        }
        if !in_inference {
            return self.same_type_visit(t, s, false);
        }
        // Reorder so the inference-variable side drives the dispatch.
        match (t, s) {
            (_, Type::Infer(_)) if !matches!(t, Type::Infer(_)) => self.same_type_visit(s, t, true),
            _ => self.same_type_visit(t, s, true),
        }
    }

    /// Element-wise same-type over two lists, applying `s_subst` to the
    /// right-hand elements first.
    pub fn are_same_types(
        &mut self,
        ts: &[Type],
        ss: &[Type],
        s_subst: &Substitution,
        in_inference: bool,
    ) -> bool {
        if ts.len() != ss.len() {
            return false;
        }
        ts.iter().zip(ss).all(|(t, s)| {
            let s = subst(s, s_subst);
            self.is_same_type(t, &s, in_inference)
        })
    }

    fn same_type_visit(&mut self, t: &Type, s: &Type, in_inference: bool) -> bool {
        match t {
            // Primitives and sentinels compare by tag.
            Type::Void | Type::Null | Type::Unknown | Type::Error | Type::Primitive(_) => t == s,

            Type::TypeVar(_) => t == s,

            Type::Class(tc) => match s {
                Type::Class(sc) => self.same_class_type(tc, sc, in_inference),
                _ => false,
            },

            Type::Array(t_elem) => match s {
                Type::Array(s_elem) => self.is_same_type(t_elem, s_elem, in_inference),
                _ => false,
            },

            Type::Wildcard(tw) => match s {
                Type::Wildcard(sw) => {
                    let t_bound = self.wildcard_bound(tw);
                    let s_bound = self.wildcard_bound(sw);
                    tw.is_upper() == sw.is_upper()
                        && self.is_same_type(&t_bound, &s_bound, in_inference)
                }
                _ => false,
            },

            Type::Intersection(t_parts) => match s {
                Type::Intersection(s_parts) => {
                    let t_parts = t_parts.clone();
                    let s_parts = s_parts.clone();
                    self.same_intersection(&t_parts, &s_parts, in_inference)
                }
                _ => false,
            },

            Type::Infer(var) => {
                if !in_inference {
                    return t == s;
                }
                match s {
                    Type::Primitive(_) => false,
                    Type::Wildcard(w) => {
                        let kind = if w.is_upper() {
                            BoundKind::Upper
                        } else {
                            BoundKind::Lower
                        };
                        let bound = self.wildcard_bound(w);
                        self.add_bound(*var, kind, bound);
                        true
                    }
                    other => {
                        self.add_bound(*var, BoundKind::Eq, other.clone());
                        true
                    }
                }
            }
        }
    }

    fn same_class_type(&mut self, t: &ClassType, s: &ClassType, in_inference: bool) -> bool {
        if t.def != s.def {
            return false;
        }
        let enclosing_same = match (&t.enclosing, &s.enclosing) {
            (None, None) => true,
            (Some(te), Some(se)) => {
                let (te, se) = (*te.clone(), *se.clone());
                self.same_class_type(&te, &se, in_inference)
            }
            _ => false,
        };
        enclosing_same
            && self.are_same_types(&t.args, &s.args, &Substitution::empty(), in_inference)
    }

    /// Intersections compare unordered: same superclass component, and a
    /// bijection between interface components keyed by erasure.
    fn same_intersection(&mut self, ts: &[Type], ss: &[Type], in_inference: bool) -> bool {
        let t_super = self.intersection_super_class(ts);
        let s_super = self.intersection_super_class(ss);
        if !self.is_same_type(&t_super, &s_super, in_inference) {
            return false;
        }

        let mut t_by_erasure: Vec<(Type, Type)> = ts
            .iter()
            .filter(|c| self.is_interface_type(c))
            .map(|c| (self.erasure(c), c.clone()))
            .collect();
        let s_interfaces: Vec<Type> = ss
            .iter()
            .filter(|c| self.is_interface_type(c))
            .cloned()
            .collect();
        for si in &s_interfaces {
            let si_erased = self.erasure(si);
            let Some(pos) = t_by_erasure.iter().position(|(e, _)| *e == si_erased) else {
                return false;
            };
            let (_, ti) = t_by_erasure.swap_remove(pos);
            if !self.is_same_type(&ti, si, in_inference) {
                return false;
            }
        }
        t_by_erasure.is_empty()
    }

    /// The superclass component of an intersection; `Object` when every
    /// component is an interface.
    pub(crate) fn intersection_super_class(&self, parts: &[Type]) -> Type {
        parts
            .iter()
            .find(|c| !self.is_interface_type(c))
            .cloned()
            .unwrap_or_else(|| self.object())
    }

    /// The explicit bound of a wildcard; `Object` for the unbounded form.
    pub(crate) fn wildcard_bound(&self, w: &WildcardBound) -> Type {
        match w {
            WildcardBound::Unbounded => self.object(),
            WildcardBound::Extends(bound) | WildcardBound::Super(bound) => (**bound).clone(),
        }
    }

    // --- supertype enumeration ----------------------------------------------

    /// The set of all supertypes of `t`, in insertion order, starting with
    /// `t` itself.
    ///
    /// Classes walk the superclass chain before interfaces, with type
    /// arguments substituted along the way; raw types walk erased
    /// supertypes; leaf interfaces fall back to `Object`. Arrays promote the
    /// component's supertypes element-wise (primitive components excepted)
    /// and add `Cloneable`, `Serializable`, `Object`.
    ///
    /// # Panics
    ///
    /// Panics on the null type, whose supertype set (every reference type)
    /// is not representable.
    pub fn get_super_type_set(&mut self, t: &Type) -> Vec<Type> {
        let mut acc = SuperTypes::default();
        self.super_types_into(t, &mut acc);
        debug_assert!(!acc.list.is_empty(), "empty supertype set");
        acc.list
    }

    fn super_types_into(&mut self, t: &Type, acc: &mut SuperTypes) {
        match t {
            Type::Null => panic!("the null type has every reference type as a supertype"),

            Type::Void | Type::Unknown | Type::Error | Type::Infer(_) => {
                acc.add(t.clone());
            }

            Type::TypeVar(var) => {
                // The seen-check cuts F-bounded cycles like
                // `E extends Enum<E>`.
                if acc.add(t.clone()) {
                    let upper = self.upper_bound_of(*var);
                    self.super_types_into(&upper, acc);
                }
            }

            // Wildcards are expected to have been captured; treat like their
            // upper bound.
            Type::Wildcard(w) => {
                let upper = self.wildcard_bound(w);
                let upper = if w.is_upper() { upper } else { self.object() };
                self.super_types_into(&upper, acc);
            }

            Type::Primitive(prim) => {
                acc.add(t.clone());
                for wider in [
                    crate::PrimitiveType::Byte,
                    crate::PrimitiveType::Short,
                    crate::PrimitiveType::Char,
                    crate::PrimitiveType::Int,
                    crate::PrimitiveType::Long,
                    crate::PrimitiveType::Float,
                    crate::PrimitiveType::Double,
                ] {
                    if *prim != wider && prim.widens_to(wider) {
                        acc.add(Type::Primitive(wider));
                    }
                }
                if let Some(boxed) = crate::store::boxed_class(&*self, *prim) {
                    acc.add(Type::class(boxed, vec![]));
                }
                acc.add(self.object());
            }

            Type::Intersection(parts) => {
                for part in parts.clone() {
                    self.super_types_into(&part, acc);
                }
            }

            Type::Array(elem) => {
                acc.add(t.clone());
                if !elem.is_primitive() {
                    for component_super in self.get_super_type_set(&elem.clone()) {
                        acc.add(Type::array(component_super));
                    }
                }
                let wk = self.well_known();
                let (cloneable, serializable) = (wk.cloneable, wk.serializable);
                acc.add(Type::class(cloneable, vec![]));
                acc.add(Type::class(serializable, vec![]));
                acc.add(self.object());
            }

            Type::Class(ct) => {
                let ct = ct.clone();
                self.class_super_types(&ct, acc);
            }
        }
    }

    fn class_super_types(&mut self, ct: &ClassType, acc: &mut SuperTypes) {
        if !acc.add(Type::Class(ct.clone())) {
            return;
        }
        let Some(def) = self.class(ct.def).cloned() else {
            return;
        };

        let raw = self.is_raw(ct);
        let sigma = if raw {
            Substitution::empty()
        } else {
            self.type_param_subst(ct)
        };

        // Dig up the superclass chain first.
        if let Some(super_class) = &def.super_class {
            let instantiated = self.instantiate_declared(super_class, &sigma, raw);
            self.super_types_into(&instantiated, acc);
        }
        for iface in &def.interfaces {
            let instantiated = self.instantiate_declared(iface, &sigma, raw);
            self.super_types_into(&instantiated, acc);
        }
        if def.kind.is_interface() && def.interfaces.is_empty() {
            acc.add(self.object());
        }
    }

    /// View a declared supertype through the subtype's instantiation: erased
    /// when the subtype is raw, substituted otherwise.
    pub(crate) fn instantiate_declared(
        &self,
        declared: &Type,
        sigma: &Substitution,
        raw: bool,
    ) -> Type {
        if raw {
            self.erasure(declared)
        } else {
            subst(declared, sigma).into_owned()
        }
    }
}

#[derive(Default)]
struct SuperTypes {
    seen: HashSet<Type>,
    list: Vec<Type>,
}

impl SuperTypes {
    /// Insert preserving first-seen order; true if newly added.
    fn add(&mut self, ty: Type) -> bool {
        if self.seen.insert(ty.clone()) {
            self.list.push(ty);
            true
        } else {
            false
        }
    }
}

// --- mentions ---------------------------------------------------------------

/// Deep argument nests bottom out here instead of overflowing the stack.
const MENTIONS_DEPTH_LIMIT: u32 = 512;

enum VarTargets<'a> {
    TypeVars(&'a [TypeVarId]),
    InferVars(&'a [InferVarId]),
}

/// Whether `t` mentions the inference variable `var`.
pub fn mentions(t: &Type, var: InferVarId) -> bool {
    mentions_rec(t, &VarTargets::InferVars(std::slice::from_ref(&var)), 0)
}

/// Whether `t` mentions any of the inference variables.
pub fn mentions_any(t: &Type, vars: &[InferVarId]) -> bool {
    !vars.is_empty() && mentions_rec(t, &VarTargets::InferVars(vars), 0)
}

/// Whether `t` mentions any of the type variables. Bounds of other type
/// variables are not followed; `E extends Enum<E>` does not loop.
pub fn mentions_any_tvar(t: &Type, vars: &[TypeVarId]) -> bool {
    !vars.is_empty() && mentions_rec(t, &VarTargets::TypeVars(vars), 0)
}

/// Whether a method signature mentions any of the inference variables in
/// its return type, parameter types, or thrown types.
pub fn sig_mentions_any(sig: &MethodSig, vars: &[InferVarId]) -> bool {
    if vars.is_empty() {
        return false;
    }
    let targets = VarTargets::InferVars(vars);
    mentions_rec(&sig.return_type, &targets, 0)
        || sig.params.iter().any(|p| mentions_rec(p, &targets, 0))
        || sig.thrown.iter().any(|p| mentions_rec(p, &targets, 0))
}

fn mentions_rec(t: &Type, targets: &VarTargets<'_>, depth: u32) -> bool {
    if depth > MENTIONS_DEPTH_LIMIT {
        return false;
    }
    match t {
        Type::TypeVar(var) => matches!(targets, VarTargets::TypeVars(vars) if vars.contains(var)),
        Type::Infer(var) => matches!(targets, VarTargets::InferVars(vars) if vars.contains(var)),
        Type::Wildcard(WildcardBound::Extends(bound) | WildcardBound::Super(bound)) => {
            mentions_rec(bound, targets, depth + 1)
        }
        Type::Class(ct) => class_mentions(ct, targets, depth + 1),
        Type::Intersection(parts) => parts.iter().any(|c| mentions_rec(c, targets, depth + 1)),
        Type::Array(elem) => mentions_rec(elem, targets, depth + 1),
        _ => false,
    }
}

fn class_mentions(ct: &ClassType, targets: &VarTargets<'_>, depth: u32) -> bool {
    if depth > MENTIONS_DEPTH_LIMIT {
        return false;
    }
    if let Some(enclosing) = &ct.enclosing {
        if class_mentions(enclosing, targets, depth + 1) {
            return true;
        }
    }
    ct.args.iter().any(|arg| mentions_rec(arg, targets, depth + 1))
}
