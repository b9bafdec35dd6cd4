//! Method signatures, overriding, and member lookup.
//!
//! A [`MethodSig`] is a *view*: the same declared method seen from two
//! different parameterizations of its declaring type yields two different
//! signatures. Signatures carry their instantiation substitution so the
//! bounds of method type parameters can be viewed consistently too.
//!
//! Thrown exceptions are never part of a signature comparison, and neither
//! is the static modifier: for static methods these predicates test
//! *hiding*, and a static/instance mismatch is its own error, diagnosed by
//! callers.

use crate::ctx::TyContext;
use crate::store::{nest_root, package_name, MethodDef, TypeEnv, Visibility};
use crate::subst::{subst, subst_types, Substitution};
use crate::{ClassId, ClassType, Type, TypeVarId};

/// A method or constructor signature, viewed from a particular
/// parameterization of its declaring type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// The declaring-type instantiation this view was built from.
    pub owner: Type,
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_default: bool,
    pub is_constructor: bool,
    /// Formal type parameters; empty after erasure.
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub thrown: Vec<Type>,
    /// Accumulated substitution of the view, applied lazily to the bounds
    /// of `type_params`.
    pub(crate) subst: Substitution,
}

impl MethodSig {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// This signature with `sigma` applied to its parameter, return, and
    /// thrown types (and, transitively, its type-parameter bounds).
    pub fn applied(&self, sigma: &Substitution) -> MethodSig {
        MethodSig {
            owner: self.owner.clone(),
            name: self.name.clone(),
            visibility: self.visibility,
            is_static: self.is_static,
            is_abstract: self.is_abstract,
            is_default: self.is_default,
            is_constructor: self.is_constructor,
            type_params: self.type_params.clone(),
            params: subst_types(&self.params, sigma).into_owned(),
            return_type: subst(&self.return_type, sigma).into_owned(),
            thrown: subst_types(&self.thrown, sigma).into_owned(),
            subst: self.subst.then(sigma),
        }
    }

    /// The declaring class, when the declaring type is a class type.
    pub fn owner_class(&self) -> Option<ClassId> {
        self.owner.as_class().map(|ct| ct.def)
    }
}

/// External reducer that keeps only the most specific overloads of a
/// candidate set. Overload resolution proper lives outside this crate.
pub trait OverloadComparator {
    fn most_specific(&self, ctx: &mut TyContext<'_>, methods: Vec<MethodSig>) -> Vec<MethodSig>;
}

/// The identity reducer.
pub struct KeepAllOverloads;

impl OverloadComparator for KeepAllOverloads {
    fn most_specific(&self, _ctx: &mut TyContext<'_>, methods: Vec<MethodSig>) -> Vec<MethodSig> {
        methods
    }
}

/// A predicate selecting members named `name` that are visible from
/// `access_site` (JLS 6.6).
pub fn accessible_method_filter<'a>(
    name: &'a str,
    access_site: ClassId,
) -> impl Fn(&TyContext<'_>, &MethodSig) -> bool + 'a {
    move |ctx, sig| sig.name == name && ctx.is_accessible(sig, access_site)
}

impl TyContext<'_> {
    /// The signature of `method` viewed from the instantiation `owner`.
    /// Views from a raw owner are erased.
    pub fn sig_of(&self, owner: &ClassType, method: &MethodDef) -> MethodSig {
        let raw = self.is_raw(owner);
        let sigma = if raw {
            Substitution::empty()
        } else {
            self.type_param_subst(owner)
        };
        let sig = MethodSig {
            owner: Type::Class(owner.clone()),
            name: method.name.clone(),
            visibility: method.visibility,
            is_static: method.is_static,
            is_abstract: method.is_abstract,
            is_default: method.is_default,
            is_constructor: method.is_constructor,
            type_params: method.type_params.clone(),
            params: subst_types(&method.params, &sigma).into_owned(),
            return_type: subst(&method.return_type, &sigma).into_owned(),
            thrown: subst_types(&method.thrown, &sigma).into_owned(),
            subst: sigma,
        };
        if raw {
            self.erase_sig(&sig)
        } else {
            sig
        }
    }

    /// The erasure of a signature: no type parameters, erased types.
    pub fn erase_sig(&self, sig: &MethodSig) -> MethodSig {
        MethodSig {
            type_params: vec![],
            params: self.erase(&sig.params),
            return_type: self.erasure(&sig.return_type),
            thrown: self.erase(&sig.thrown),
            ..sig.clone()
        }
    }

    /// The declared bound of the i-th type parameter of `sig`, seen through
    /// the view's substitution.
    pub fn sig_type_param_bound(&self, sig: &MethodSig, i: usize) -> Type {
        let declared = sig
            .type_params
            .get(i)
            .and_then(|var| self.type_param(*var))
            .map(|def| def.upper_bound.clone())
            .unwrap_or_else(|| self.object());
        subst(&declared, &sig.subst).into_owned()
    }

    /// Same count of type parameters and pairwise equal bounds after
    /// renaming `m2`'s parameters to `m1`'s (JLS 8.4.4).
    pub fn have_same_type_params(&mut self, m1: &MethodSig, m2: &MethodSig) -> bool {
        if m1.type_params.len() != m2.type_params.len() {
            return false;
        }
        if m1.type_params.is_empty() {
            return true;
        }
        let rename = Substitution::rename(&m2.type_params, &m1.type_params);
        for i in 0..m1.type_params.len() {
            let b1 = self.sig_type_param_bound(m1, i);
            let b2 = self.sig_type_param_bound(m2, i);
            let b2 = subst(&b2, &rename).into_owned();
            if !self.is_same_type(&b1, &b2, false) {
                return false;
            }
        }
        true
    }

    /// Same name, same type parameters, and the same formal parameter types
    /// after adapting `m2` to `m1`'s type parameters (JLS 8.4.2).
    pub fn have_same_signature(&mut self, m1: &MethodSig, m2: &MethodSig) -> bool {
        if m1.name != m2.name || m1.arity() != m2.arity() {
            return false;
        }
        if !self.have_same_type_params(m1, m2) {
            return false;
        }
        let rename = Substitution::rename(&m2.type_params, &m1.type_params);
        self.are_same_types(&m1.params, &m2.params, &rename, false)
    }

    /// `m1` has the same signature as `m2`, or as the erasure of `m2`.
    /// Asymmetric: a generic `m1` is never a subsignature of a non-generic
    /// `m2`.
    pub fn is_sub_signature(&mut self, m1: &MethodSig, m2: &MethodSig) -> bool {
        if m1.arity() != m2.arity() || m1.name != m2.name {
            return false;
        }
        match (m1.is_generic(), m2.is_generic()) {
            (true, false) => false,
            (false, true) => {
                let m2_erased = self.erase_sig(m2);
                self.have_same_signature(m1, &m2_erased)
            }
            _ => self.have_same_signature(m1, m2),
        }
    }

    /// Either signature is a subsignature of the other (JLS 8.4.2). When
    /// exactly one side is generic, it is erased first.
    pub fn are_override_equivalent(&mut self, m1: &MethodSig, m2: &MethodSig) -> bool {
        // Hot path for pruning override/hidden candidates; bail out on
        // arity before anything costly.
        if m1.arity() != m2.arity() {
            return false;
        }
        match (m1.is_generic(), m2.is_generic()) {
            (true, false) => {
                let m1_erased = self.erase_sig(m1);
                self.have_same_signature(&m1_erased, m2)
            }
            (false, true) => {
                let m2_erased = self.erase_sig(m2);
                self.have_same_signature(m1, &m2_erased)
            }
            _ => self.have_same_signature(m1, m2),
        }
    }

    /// Same declaring type and same signature.
    pub fn is_same_method_type(&mut self, m1: &MethodSig, m2: &MethodSig) -> bool {
        let (o1, o2) = (m1.owner.clone(), m2.owner.clone());
        self.is_same_type(&o1, &o2, false) && self.have_same_signature(m1, m2)
    }

    /// Adapt `m1` to the type parameters of `m2` (JLS 8.4.4), or `None`
    /// when their type parameters differ.
    fn adapt_for_type_params(&mut self, m1: &MethodSig, m2: &MethodSig) -> Option<MethodSig> {
        if self.have_same_type_params(m1, m2) {
            Some(m1.applied(&Substitution::rename(&m1.type_params, &m2.type_params)))
        } else {
            None
        }
    }

    /// Return-type substitutability (JLS 8.4.5): covariant returns for
    /// reference types, identity for `void` and primitives, with the raw /
    /// erasure escape hatches unchecked overriding relies on.
    pub fn is_return_type_substitutable(&mut self, m1: &MethodSig, m2: &MethodSig) -> bool {
        let r1 = m1.return_type.clone();
        let r2 = m2.return_type.clone();

        if matches!(r1, Type::Void) {
            return r1 == r2;
        }
        if r1.is_primitive() {
            return r1 == r2;
        }
        if self.is_raw_type(&r1) && self.unchecked_conversion_exists(&r1, &r2) {
            return true;
        }
        if let Some(m1_adapted) = self.adapt_for_type_params(m1, m2) {
            let adapted_return = m1_adapted.return_type;
            if self.is_subtype(&adapted_return, &r2, false) {
                return true;
            }
        }
        if !self.have_same_signature(m1, m2) {
            let r2_erased = self.erasure(&r2);
            return self.is_same_type(&r1, &r2_erased, false);
        }
        false
    }

    /// Returns true if `m1` overrides (or, for statics, hides) `m2` when
    /// both are viewed as members of `origin` (JLS 8.4.8.1).
    ///
    /// `m1` and `m2` may be declared in unrelated supertypes of `origin`
    /// (default methods), which is what the third parameter is for. By
    /// convention a method overrides itself.
    pub fn overrides(&mut self, m1: &MethodSig, m2: &MethodSig, origin: &Type) -> bool {
        if m1.is_constructor || m2.is_constructor {
            return false;
        }
        let m1_owner = m1.owner.clone();
        let Some(m2_owner) = m2.owner_class() else {
            return false;
        };

        // Direct override: m2 is overridable from m1's declaring class and
        // that class derives from m2's.
        if let Some(m1_site) = m1.owner_class() {
            if self.is_overridable_in(m2, m2_owner, m1_site)
                && self.as_super(&m1_owner, m2_owner).is_some()
                && self.is_sub_sig_in_origin(m1, m2, &m1_owner)
            {
                return true;
            }
        }

        // Otherwise m1 can provide an inherited implementation for m2 at
        // origin.
        if m1.is_abstract {
            return false;
        }
        if !m2.is_abstract && !m2.is_default {
            return false;
        }
        let Some(origin_class) = origin.as_class().map(|ct| ct.def) else {
            return false;
        };
        if !self.is_overridable_in(m2, m2_owner, origin_class) {
            return false;
        }
        let m2_owner_ty = m2.owner.clone();
        if !self.is_subtype(origin, &m2_owner_ty, false) {
            return false;
        }
        self.is_sub_sig_in_origin(m1, m2, origin)
    }

    /// Subsignature check with both methods viewed as members of `origin`:
    /// both erased when `origin` is raw, both substituted by its
    /// type-parameter substitution otherwise.
    fn is_sub_sig_in_origin(&mut self, m1: &MethodSig, m2: &MethodSig, origin: &Type) -> bool {
        let (s1, s2) = if self.is_raw_type(origin) {
            (self.erase_sig(m1), self.erase_sig(m2))
        } else {
            let sigma = origin
                .as_class()
                .map(|ct| self.type_param_subst(ct))
                .unwrap_or_default();
            (m1.applied(&sigma), m2.applied(&sigma))
        };
        self.is_sub_signature(&s1, &s2)
    }

    /// Whether `m` (declared in `declaring`) can be overridden in `origin`,
    /// looking only at access modifiers (JLS 8.4.6.1). Final and static are
    /// deliberately not consulted here.
    fn is_overridable_in(&self, m: &MethodSig, declaring: ClassId, origin: ClassId) -> bool {
        match m.visibility {
            Visibility::Public => true,
            Visibility::Protected => !self.is_interface_class(origin),
            Visibility::Package => {
                package_name(self, declaring) == package_name(self, origin)
                    && !self.is_interface_class(origin)
            }
            Visibility::Private => false,
        }
    }

    /// JLS 6.6 member accessibility, viewed from the class `access_site`.
    pub fn is_accessible(&self, m: &MethodSig, access_site: ClassId) -> bool {
        let Some(owner) = m.owner_class() else {
            // Members of array types are synthetic and always visible.
            return true;
        };
        match m.visibility {
            Visibility::Public => true,
            Visibility::Private => nest_root(self, access_site) == nest_root(self, owner),
            Visibility::Protected => {
                package_name(self, access_site) == package_name(self, owner)
                    || self.is_subclass_of_no_interface(access_site, owner)
            }
            Visibility::Package => {
                // Interfaces are excluded: their members are all public.
                package_name(self, access_site) == package_name(self, owner)
                    && !self.is_interface_class(access_site)
            }
        }
    }

    fn is_subclass_of_no_interface(&self, sub: ClassId, target: ClassId) -> bool {
        if sub == target {
            return true;
        }
        let Some(super_class) = self
            .class(sub)
            .and_then(|def| def.super_class.as_ref())
            .and_then(|ty| ty.as_class())
            .map(|ct| ct.def)
        else {
            return false;
        };
        self.is_subclass_of_no_interface(super_class, target)
    }

    /// Every method of `t`, as signature views over the supertype set of
    /// `t`. Array receivers see `Object`'s members.
    pub fn methods_of(&mut self, t: &Type) -> Vec<MethodSig> {
        let receiver = match t {
            Type::Array(_) => self.object(),
            other => other.clone(),
        };
        let mut out = Vec::new();
        for super_ty in self.get_super_type_set(&receiver) {
            let Type::Class(ct) = super_ty else {
                continue;
            };
            let Some(def) = self.class(ct.def).cloned() else {
                continue;
            };
            for method in &def.methods {
                out.push(self.sig_of(&ct, method));
            }
        }
        out
    }

    /// Keep only the accessible signatures, preserving order.
    pub fn filter_accessible(&self, sigs: Vec<MethodSig>, access_site: ClassId) -> Vec<MethodSig> {
        sigs.into_iter()
            .filter(|sig| self.is_accessible(sig, access_site))
            .collect()
    }

    /// The methods of `t` named `name` visible from `access_site`, reduced
    /// to the most specific overloads by the external `comparator`.
    pub fn get_methods_of(
        &mut self,
        t: &Type,
        name: &str,
        static_only: bool,
        access_site: ClassId,
        comparator: &dyn OverloadComparator,
    ) -> Vec<MethodSig> {
        let mut selected = Vec::new();
        for sig in self.methods_of(t) {
            if sig.is_constructor || (static_only && !sig.is_static) || sig.name != name {
                continue;
            }
            if self.is_accessible(&sig, access_site) {
                selected.push(sig);
            }
        }
        comparator.most_specific(self, selected)
    }
}
