//! Function types of functional (single-abstract-method) interfaces
//! (JLS 9.9).

use tracing::debug;

use crate::ctx::TyContext;
use crate::equate::mentions_any_tvar;
use crate::sig::MethodSig;
use crate::store::{ClassKind, TypeEnv, Visibility};
use crate::{ClassType, Type, WildcardBound};

impl TyContext<'_> {
    /// The non-wildcard parameterization of a functional interface type
    /// (JLS 9.9): each wildcard argument is replaced by a witness drawn
    /// from its bound and the declared parameter bound. `None` when a
    /// declared bound mentions the formals themselves (F-bounds), which
    /// makes the parameterization inexpressible.
    pub fn non_wildcard_parameterization(&mut self, ct: &ClassType) -> Option<ClassType> {
        if !ct.args.iter().any(|arg| matches!(arg, Type::Wildcard(_))) {
            return Some(ct.clone());
        }
        let def = self.class(ct.def).cloned()?;
        let formals = def.type_params;
        if formals.len() != ct.args.len() {
            return None;
        }

        let mut new_args = Vec::with_capacity(ct.args.len());
        for (i, arg) in ct.args.iter().enumerate() {
            let Type::Wildcard(wild) = arg else {
                new_args.push(arg.clone());
                continue;
            };
            let declared_bound = self
                .type_param(formals[i])
                .map(|d| d.upper_bound.clone())
                .unwrap_or_else(|| self.object());
            if mentions_any_tvar(&declared_bound, &formals) {
                return None;
            }
            let witness = match wild {
                WildcardBound::Unbounded => declared_bound,
                WildcardBound::Extends(upper) => {
                    self.glb(vec![(**upper).clone(), declared_bound])
                }
                WildcardBound::Super(lower) => (**lower).clone(),
            };
            new_args.push(witness);
        }

        Some(ClassType {
            def: ct.def,
            args: new_args,
            enclosing: ct.enclosing.clone(),
        })
    }

    /// The method of `t` that a lambda implements: a function type able to
    /// override every abstract method of the interface at once. `None` when
    /// `t` is not a functional interface.
    pub fn find_functional_interface_method(&mut self, t: &Type) -> Option<MethodSig> {
        let ct = t.as_class()?.clone();

        if self.is_raw(&ct) {
            // The function type of a raw functional interface is the
            // erasure of the generic declaration's function type.
            let decl = crate::store::declaration(&*self, ct.def);
            let decl_ct = decl.as_class()?.clone();
            let fun = self.function_type_of(&decl_ct)?;
            return Some(self.erase_sig(&fun));
        }
        if !ct.args.is_empty() {
            let nwp = self.non_wildcard_parameterization(&ct)?;
            return self.function_type_of(&nwp);
        }
        self.function_type_of(&ct)
    }

    fn function_type_of(&mut self, ct: &ClassType) -> Option<MethodSig> {
        let def = self.class(ct.def).cloned()?;
        if def.kind != ClassKind::Interface {
            return None;
        }

        // All abstract instance methods in the hierarchy, minus those that
        // merely redeclare a public method of Object (JLS 9.8).
        let mut candidates: Vec<MethodSig> = Vec::new();
        for sig in self.methods_of(&Type::Class(ct.clone())) {
            if !sig.is_abstract || sig.is_static || sig.is_constructor {
                continue;
            }
            if self.redeclares_object_method(&sig) {
                continue;
            }
            candidates.push(sig);
        }

        if candidates.is_empty() {
            return None;
        }
        if candidates.len() == 1 {
            return candidates.pop();
        }

        // More than one abstract method: look for one that can stand in for
        // all the others, preferring the most specific return type.
        debug!(
            interface = %def.name,
            candidates = candidates.len(),
            "selecting function type among several abstract methods"
        );
        let mut best: Option<MethodSig> = None;
        'next: for i in 0..candidates.len() {
            for j in 0..candidates.len() {
                if i == j {
                    continue;
                }
                let (cand, other) = (candidates[i].clone(), candidates[j].clone());
                if !self.is_sub_signature(&cand, &other)
                    || !self.is_return_type_substitutable(&cand, &other)
                {
                    continue 'next;
                }
            }
            let cand = candidates[i].clone();
            best = match best {
                None => Some(cand),
                Some(current) => {
                    let cand_ret = cand.return_type.clone();
                    let current_ret = current.return_type.clone();
                    if self.is_subtype(&cand_ret, &current_ret, false) {
                        Some(cand)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }

    /// Whether `sig` has the same signature as a public method declared in
    /// `java.lang.Object`.
    fn redeclares_object_method(&mut self, sig: &MethodSig) -> bool {
        let object = self.well_known().object;
        let Some(object_def) = self.class(object).cloned() else {
            return false;
        };
        let object_ct = ClassType::new(object, vec![]);
        for method in &object_def.methods {
            if method.visibility != Visibility::Public || method.name != sig.name {
                continue;
            }
            let object_sig = self.sig_of(&object_ct, method);
            if self.have_same_signature(sig, &object_sig) {
                return true;
            }
        }
        false
    }
}
