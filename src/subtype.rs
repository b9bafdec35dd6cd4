//! Subtyping, type-argument containment, and supertype instantiation.

use crate::ctx::{BoundKind, TyContext};
use crate::store::{declaration, TypeEnv};
use crate::{ClassId, ClassType, Type, WildcardBound};

impl TyContext<'_> {
    /// Returns true if `T <: S`.
    ///
    /// With `unchecked`, raw types additionally convert to their
    /// parameterizations (JLS 5.1.9); this makes the check a convertibility
    /// test rather than strict subtyping.
    ///
    /// When `S` is an inference variable the check records `T` as a lower
    /// bound and succeeds; an inference-variable `T` likewise absorbs `S` as
    /// an upper bound. Unresolved types satisfy the check on the subtype
    /// side only, so one missing symbol does not cascade.
    pub fn is_subtype(&mut self, t: &Type, s: &Type, unchecked: bool) -> bool {
        if t == s {
            return true;
        }
        if self.is_object(s) {
            return !t.is_primitive();
        }
        if let Type::Infer(var) = s {
            // Bounds accrete even on unresolved subtypes.
            self.add_bound(*var, BoundKind::Lower, t.clone());
            return true;
        }
        if self.is_unresolved(t) {
            // Deliberately not symmetric: an unresolved supertype still has
            // to be proven.
            return true;
        }

        let captured = self.capture(t);
        self.subtype_visit(&captured, s, unchecked)
    }

    fn subtype_visit(&mut self, t: &Type, s: &Type, unchecked: bool) -> bool {
        match t {
            Type::TypeVar(var) => {
                if self.is_type_range(s) {
                    let lower = self.lower_bound_rec(s);
                    return self.is_subtype(t, &lower, unchecked);
                }
                let upper = self.upper_bound_of(*var);
                self.is_subtype(&upper, s, unchecked)
            }

            Type::Null => !s.is_primitive(),

            // Sentinels satisfy every check so analysis can continue.
            Type::Void | Type::Unknown | Type::Error => true,

            Type::Infer(var) => {
                if matches!(s, Type::Null | Type::Primitive(_)) {
                    return false;
                }
                self.add_bound(*var, BoundKind::Upper, s.clone());
                true
            }

            // Wildcards are captured before dispatch; a bare one compares
            // only through type-argument containment.
            Type::Wildcard(_) => false,

            Type::Intersection(parts) => {
                let parts = parts.clone();
                parts.iter().any(|c| self.is_subtype(c, s, unchecked))
            }

            Type::Array(elem) => self.array_subtype(elem, s, unchecked),

            Type::Primitive(prim) => {
                matches!(s, Type::Primitive(to) if prim.widens_to(*to))
            }

            Type::Class(ct) => {
                let ct = ct.clone();
                self.class_subtype(&ct, s, unchecked)
            }
        }
    }

    fn array_subtype(&mut self, elem: &Type, s: &Type, unchecked: bool) -> bool {
        if let Type::Class(sc) = s {
            let wk = self.well_known();
            if sc.args.is_empty() && (sc.def == wk.cloneable || sc.def == wk.serializable) {
                return true;
            }
        }
        let Type::Array(s_elem) = s else {
            // Arrays compare to no other kind of type.
            return false;
        };
        if elem.is_primitive() || s_elem.is_primitive() {
            // Arrays of primitives have no sub- or supertypes among arrays.
            elem == s_elem.as_ref()
        } else {
            let (elem, s_elem) = (elem.clone(), (**s_elem).clone());
            self.is_subtype(&elem, &s_elem, unchecked)
        }
    }

    fn class_subtype(&mut self, t: &ClassType, s: &Type, unchecked: bool) -> bool {
        match s {
            // T must conform to every bound of an intersection; one matching
            // component suffices when the intersection is on the left.
            Type::Intersection(parts) => {
                let parts = parts.clone();
                let t = Type::Class(t.clone());
                parts.iter().all(|u| self.is_subtype(&t, u, unchecked))
            }

            _ if self.is_type_range(s) => {
                let lower = self.lower_bound_rec(s);
                self.is_subtype(&Type::Class(t.clone()), &lower, unchecked)
            }

            Type::Class(sc) => {
                // The most specific instantiation of S's class among T's
                // supertypes; no instantiation, no subtyping.
                let Some(super_decl) = self.as_super_class(t, sc.def) else {
                    return false;
                };
                // Unchecked conversion maps a raw C to any C<T1, .., Tn>.
                if unchecked && self.is_raw(&super_decl) {
                    return true;
                }
                // A raw supertype absorbs the whole family of
                // parameterizations of its erasure.
                if self.is_raw(sc) {
                    return true;
                }
                self.type_args_contained(&super_decl.args, &sc.args, unchecked)
            }

            _ => false,
        }
    }

    /// Pairwise containment of type arguments: `C<T..> <: C<S..>` needs
    /// `S_i` to contain `T_i` for each position.
    fn type_args_contained(&mut self, targs: &[Type], sargs: &[Type], unchecked: bool) -> bool {
        if targs.is_empty() && !sargs.is_empty() {
            // T is raw. `C -> D<?, .., ?>` is an unchecked conversion that
            // is provably safe, so it is accepted exactly when unchecked
            // conversion is on and every argument is unbounded.
            if !unchecked {
                return false;
            }
            return all_args_unbounded_wildcards(sargs);
        }
        if targs.len() != sargs.len() {
            return false;
        }
        targs
            .iter()
            .zip(sargs)
            .all(|(targ, sarg)| self.type_arg_contains(sarg, targ))
    }

    /// Returns true if `S <= T`, i.e. the type argument `t` contains `s`
    /// (JLS 4.5.1): `L(T) <: L(S)` and `U(S) <: U(T)`.
    ///
    /// Reading types as ranges, `T` contains `S` when its range is wider.
    /// A wildcard is either `super` or `extends`, so either `L(T)` is the
    /// null type or `U(T)` is `Object`, and one of the two checks is
    /// vacuous.
    pub fn type_arg_contains(&mut self, t: &Type, s: &Type) -> bool {
        if self.is_same_type(t, s, true) {
            return true;
        }

        let Type::Wildcard(tw) = t else {
            return false;
        };
        let tw = tw.clone();

        // L(T) <: L(S), vacuous for an extends-bound T.
        if tw.is_lower() {
            let t_lower = self.wildcard_bound(&tw);
            let s_lower = self.lower_bound_shallow(s);
            if !self.is_subtype(&t_lower, &s_lower, false) {
                return false;
            }
        }
        // U(S) <: U(T), vacuous for a super-bound T.
        if tw.is_upper() {
            let t_upper = self.wildcard_bound(&tw);
            let s_upper = self.upper_bound_shallow(s);
            if !self.is_subtype(&s_upper, &t_upper, false) {
                return false;
            }
        }
        true
    }

    /// Shallow upper bound: unwraps wildcards only (`Object` for a
    /// super-bound or unbounded wildcard).
    fn upper_bound_shallow(&self, ty: &Type) -> Type {
        match ty {
            Type::Wildcard(WildcardBound::Extends(bound)) => self.upper_bound_shallow(bound),
            Type::Wildcard(_) => self.object(),
            other => other.clone(),
        }
    }

    /// Shallow lower bound: unwraps wildcards only (the null type for an
    /// extends-bound or unbounded wildcard).
    fn lower_bound_shallow(&self, ty: &Type) -> Type {
        match ty {
            Type::Wildcard(WildcardBound::Super(bound)) => self.lower_bound_shallow(bound),
            Type::Wildcard(_) => Type::Null,
            other => other.clone(),
        }
    }

    /// Whether `s` is a type range: a wildcard or a capture variable.
    pub(crate) fn is_type_range(&self, s: &Type) -> bool {
        match s {
            Type::Wildcard(_) => true,
            Type::TypeVar(var) => self.is_captured(*var),
            _ => false,
        }
    }

    /// Recursive lower bound: unwraps wildcards and capture variables down
    /// to a proper type (the null type when none exists).
    pub(crate) fn lower_bound_rec(&self, ty: &Type) -> Type {
        match ty {
            Type::Wildcard(w) => match w {
                WildcardBound::Super(bound) => self.lower_bound_rec(bound),
                _ => Type::Null,
            },
            Type::TypeVar(var) if self.is_captured(*var) => {
                let lower = self.lower_bound_of(*var);
                self.lower_bound_rec(&lower)
            }
            _ => ty.clone(),
        }
    }

    // --- as-super ------------------------------------------------------------

    /// The unique supertype of `t` whose erasure is `target`, or `None`.
    ///
    /// Single class inheritance makes the superclass-chain instantiation
    /// unambiguous, so it is searched first; interfaces are searched only
    /// for interface targets.
    pub fn as_super(&mut self, t: &Type, target: ClassId) -> Option<Type> {
        if !t.is_primitive() && target == self.well_known().object {
            // Interface types reach Object somewhere up their hierarchy.
            return Some(self.object());
        }
        self.as_super_visit(t, target)
    }

    fn as_super_visit(&mut self, t: &Type, target: ClassId) -> Option<Type> {
        match t {
            Type::Class(ct) => {
                let ct = ct.clone();
                self.as_super_class(&ct, target).map(Type::Class)
            }
            Type::TypeVar(var) => {
                let upper = self.upper_bound_of(*var);
                self.as_super_visit(&upper, target)
            }
            Type::Intersection(parts) => {
                let parts = parts.clone();
                parts.iter().find_map(|c| self.as_super_visit(c, target))
            }
            Type::Array(_) => {
                // Cloneable, Serializable, Object.
                let decl = declaration(&*self, target);
                if self.is_subtype(t, &decl, false) {
                    Some(decl)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub(crate) fn as_super_class(&mut self, ct: &ClassType, target: ClassId) -> Option<ClassType> {
        if ct.def == target {
            return Some(ct.clone());
        }
        let def = self.class(ct.def).cloned()?;
        let raw = self.is_raw(ct);
        let sigma = if raw {
            crate::Substitution::empty()
        } else {
            self.type_param_subst(ct)
        };

        // Superclass chain first.
        if let Some(super_class) = &def.super_class {
            let instantiated = self.instantiate_declared(super_class, &sigma, raw);
            if let Type::Class(super_ct) = instantiated {
                if let Some(found) = self.as_super_class(&super_ct, target) {
                    return Some(found);
                }
            }
        }
        // Then interfaces, when they can match at all.
        if self.is_interface_class(target) {
            for iface in &def.interfaces {
                let instantiated = self.instantiate_declared(iface, &sigma, raw);
                if let Type::Class(iface_ct) = instantiated {
                    if let Some(found) = self.as_super_class(&iface_ct, target) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Like [`TyContext::as_super`], additionally walking the chain of
    /// enclosing instantiations — the lookup needed to resolve members of
    /// inner classes.
    pub fn as_outer_super(&mut self, t: &Type, target: ClassId) -> Option<Type> {
        match t {
            Type::Class(ct) => {
                let mut current = Some(ct.clone());
                while let Some(c) = current {
                    if let Some(found) = self.as_super_class(&c, target) {
                        return Some(Type::Class(found));
                    }
                    current = c.enclosing.map(|b| *b);
                }
                None
            }
            Type::TypeVar(_) | Type::Array(_) => self.as_super(t, target),
            _ => None,
        }
    }

    // --- most specific -------------------------------------------------------

    /// The subset of `set` whose elements have no strict supertype in
    /// `set`, preserving order.
    pub fn most_specific(&mut self, set: &[Type]) -> Vec<Type> {
        let mut result = Vec::with_capacity(set.len());
        'next: for v in set {
            for w in set {
                if w != v && self.is_subtype(w, v, true) {
                    continue 'next;
                }
            }
            result.push(v.clone());
        }
        result
    }
}

/// The components of an intersection, or the singleton list of `t` itself.
pub fn as_list(t: &Type) -> Vec<Type> {
    match t {
        Type::Intersection(parts) => parts.clone(),
        other => vec![other.clone()],
    }
}

/// Whether every argument is the unbounded wildcard.
pub fn all_args_unbounded_wildcards(args: &[Type]) -> bool {
    args.iter()
        .all(|arg| matches!(arg, Type::Wildcard(WildcardBound::Unbounded)))
}

