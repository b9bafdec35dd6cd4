//! Per-analysis typing session.
//!
//! A [`TyContext`] wraps a read-only [`TypeEnv`] and owns the two pieces of
//! mutable state the algebra needs: capture variables allocated by capture
//! conversion, and the bound sets of inference variables. Everything else in
//! the crate is a pure function of its inputs.
//!
//! Sessions are single-threaded; independent sessions over disjoint term
//! graphs can run in parallel, each with its own context.

use std::fmt;

use tracing::trace;

use crate::store::{is_raw_class, ClassDef, TypeParamDef, TypeEnv, WellKnownTypes};
use crate::subst::{subst, Substitution};
use crate::{ClassId, ClassType, InferVarId, Type, TypeVarId, WildcardBound};

/// Kind of a bound recorded on an inference variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    /// `var <: bound`
    Upper,
    /// `bound <: var`
    Lower,
    /// `var = bound`
    Eq,
}

impl BoundKind {
    fn index(self) -> usize {
        match self {
            BoundKind::Upper => 0,
            BoundKind::Lower => 1,
            BoundKind::Eq => 2,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct InferVarData {
    bounds: [Vec<Type>; 3],
}

pub struct TyContext<'env> {
    base: &'env dyn TypeEnv,
    locals: Vec<TypeParamDef>,
    infer_vars: Vec<InferVarData>,
}

impl fmt::Debug for TyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TyContext")
            .field("locals", &self.locals)
            .field("infer_vars", &self.infer_vars)
            .finish_non_exhaustive()
    }
}

impl<'env> TyContext<'env> {
    pub fn new(base: &'env dyn TypeEnv) -> Self {
        Self {
            base,
            locals: Vec::new(),
            infer_vars: Vec::new(),
        }
    }

    /// Clear all session-local allocations (capture variables and inference
    /// variables). Types minted from the old state must not be used after.
    pub fn reset(&mut self) {
        self.locals.clear();
        self.infer_vars.clear();
    }

    /// The plain `java.lang.Object` type.
    pub fn object(&self) -> Type {
        Type::class(self.well_known().object, vec![])
    }

    pub(crate) fn is_object(&self, ty: &Type) -> bool {
        matches!(ty, Type::Class(ct) if ct.def == self.well_known().object && ct.args.is_empty())
    }

    // --- inference variables -------------------------------------------------

    /// Allocate a fresh inference variable for this session.
    pub fn new_infer_var(&mut self) -> InferVarId {
        let id = InferVarId(self.infer_vars.len() as u32);
        self.infer_vars.push(InferVarData::default());
        id
    }

    /// The bounds of `var` of the given kind, in accretion order.
    pub fn bounds(&self, var: InferVarId, kind: BoundKind) -> &[Type] {
        self.infer_vars
            .get(var.0 as usize)
            .map(|data| data.bounds[kind.index()].as_slice())
            .unwrap_or(&[])
    }

    /// Record a bound on `var`. Bound sets only ever grow during a session;
    /// repeated bounds are dropped.
    pub fn add_bound(&mut self, var: InferVarId, kind: BoundKind, bound: Type) {
        let data = self
            .infer_vars
            .get_mut(var.0 as usize)
            .expect("inference variable from another session");
        let set = &mut data.bounds[kind.index()];
        if !set.contains(&bound) {
            trace!(var = var.0, ?kind, "adding inference bound");
            set.push(bound);
        }
    }

    // --- capture variables ---------------------------------------------------

    fn alloc_local(&mut self, def: TypeParamDef) -> TypeVarId {
        let index: u32 = self
            .locals
            .len()
            .try_into()
            .expect("too many context-local type params");
        self.locals.push(def);
        TypeVarId::new_context_local(index)
    }

    pub(crate) fn is_captured(&self, var: TypeVarId) -> bool {
        self.type_param(var).is_some_and(|def| def.capture)
    }

    /// Upper bound of a type variable; `Object` when the variable is
    /// unknown to this context.
    pub(crate) fn upper_bound_of(&self, var: TypeVarId) -> Type {
        self.type_param(var)
            .map(|def| def.upper_bound.clone())
            .unwrap_or_else(|| self.object())
    }

    /// Lower bound of a type variable; the null type when it has none.
    pub(crate) fn lower_bound_of(&self, var: TypeVarId) -> Type {
        self.type_param(var)
            .and_then(|def| def.lower_bound.clone())
            .unwrap_or(Type::Null)
    }

    /// Substitute inside the bounds of `var`, keeping the variable itself.
    /// Returns the same id when nothing in the bounds changed; otherwise a
    /// context-local variable with the same name and rewritten bounds.
    pub fn subst_in_bounds(&mut self, var: TypeVarId, s: &Substitution) -> TypeVarId {
        let Some(def) = self.type_param(var).cloned() else {
            return var;
        };
        let upper = subst(&def.upper_bound, s);
        let lower = def.lower_bound.as_ref().map(|lb| subst(lb, s));
        let changed = matches!(&upper, std::borrow::Cow::Owned(_))
            || matches!(&lower, Some(std::borrow::Cow::Owned(_)));
        if !changed {
            return var;
        }
        self.alloc_local(TypeParamDef {
            name: def.name,
            upper_bound: upper.into_owned(),
            lower_bound: lower.map(|lb| lb.into_owned()),
            capture: def.capture,
        })
    }

    /// Capture conversion (JLS 5.1.10).
    ///
    /// Each wildcard argument becomes a fresh capture variable whose bounds
    /// combine the wildcard bound with the declared parameter bound, with the
    /// formal parameters substituted by the capture variables themselves
    /// (self-referential bounds like `E extends Enum<E>` stay well-formed).
    /// Non-class types and wildcard-free instantiations are returned as-is.
    pub fn capture(&mut self, ty: &Type) -> Type {
        let Type::Class(ct) = ty else {
            return ty.clone();
        };
        if !ct.args.iter().any(|arg| matches!(arg, Type::Wildcard(_))) {
            return ty.clone();
        }
        let Some(class_def) = self.class(ct.def).cloned() else {
            return ty.clone();
        };
        if class_def.type_params.len() != ct.args.len() {
            return ty.clone();
        }

        // First allocate the fresh variables so the substitution
        // [Pi := CAPi] exists before any bound is written.
        let mut new_args = Vec::with_capacity(ct.args.len());
        let mut fresh = Vec::new();
        for arg in &ct.args {
            match arg {
                Type::Wildcard(_) => {
                    let cap = self.alloc_local(TypeParamDef {
                        name: format!("CAP#{}", self.locals.len()),
                        upper_bound: Type::Unknown,
                        lower_bound: None,
                        capture: true,
                    });
                    fresh.push(new_args.len());
                    new_args.push(Type::TypeVar(cap));
                }
                other => new_args.push(other.clone()),
            }
        }

        let sigma = Substitution::mapping(&class_def.type_params, &new_args);

        for i in fresh {
            let declared = self
                .type_param(class_def.type_params[i])
                .map(|def| def.upper_bound.clone())
                .unwrap_or_else(|| self.object());
            let declared = subst(&declared, &sigma).into_owned();

            let Type::Wildcard(wild) = &ct.args[i] else {
                unreachable!("non-wildcard argument marked for capture");
            };
            let (upper, lower) = match wild {
                WildcardBound::Unbounded => (declared, None),
                WildcardBound::Extends(u) => {
                    (self.glb(vec![(**u).clone(), declared]), None)
                }
                WildcardBound::Super(l) => (declared, Some((**l).clone())),
            };

            let Type::TypeVar(cap) = new_args[i].clone() else {
                unreachable!("capture argument replaced");
            };
            let index = cap.context_local_index().unwrap();
            trace!(name = %self.locals[index].name, "capturing wildcard");
            self.locals[index].upper_bound = upper;
            self.locals[index].lower_bound = lower;
        }

        Type::Class(ClassType {
            def: ct.def,
            args: new_args,
            enclosing: ct.enclosing.clone(),
        })
    }

    // --- erasure, glb, raw types --------------------------------------------

    /// The erasure of a type (JLS 4.6): type arguments stripped, variables
    /// replaced by the erasure of their leftmost bound.
    pub fn erasure(&self, ty: &Type) -> Type {
        match ty {
            Type::Class(ct) => Type::Class(erase_class(ct)),
            Type::Array(elem) => Type::array(self.erasure(elem)),
            Type::TypeVar(var) => {
                let upper = self.upper_bound_of(*var);
                let leftmost = match &upper {
                    Type::Intersection(parts) => {
                        parts.first().cloned().unwrap_or_else(|| self.object())
                    }
                    other => other.clone(),
                };
                self.erasure(&leftmost)
            }
            Type::Intersection(parts) => parts
                .first()
                .map(|first| self.erasure(first))
                .unwrap_or_else(|| self.object()),
            Type::Wildcard(WildcardBound::Extends(bound)) => self.erasure(bound),
            Type::Wildcard(_) => self.object(),
            other => other.clone(),
        }
    }

    /// Erasure applied element-wise, returning a new list.
    pub fn erase(&self, ts: &[Type]) -> Vec<Type> {
        ts.iter().map(|ty| self.erasure(ty)).collect()
    }

    /// Greatest lower bound: flatten intersections, drop components that
    /// have a strict subtype in the set, and order a class component first.
    pub fn glb(&mut self, parts: Vec<Type>) -> Type {
        let mut flat: Vec<Type> = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Type::Intersection(components) => {
                    for c in components {
                        if !flat.contains(&c) {
                            flat.push(c);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }

        let mut reduced = self.most_specific(&flat);
        match reduced.len() {
            0 => self.object(),
            1 => reduced.pop().unwrap(),
            _ => {
                // The (unique, if the input was well-formed) non-interface
                // component goes first.
                if let Some(pos) = reduced.iter().position(|c| !self.is_interface_type(c)) {
                    let super_class = reduced.remove(pos);
                    reduced.insert(0, super_class);
                }
                Type::Intersection(reduced)
            }
        }
    }

    /// Whether an unchecked conversion applies from `from` to `to`
    /// (raw to parameterized with compatible erasures, JLS 5.1.9).
    pub fn unchecked_conversion_exists(&mut self, from: &Type, to: &Type) -> bool {
        let (Type::Class(from_ct), Type::Class(to_ct)) = (from, to) else {
            return false;
        };
        if !self.is_raw(from_ct) || to_ct.args.is_empty() {
            return false;
        }
        let from_erased = self.erasure(from);
        let to_erased = self.erasure(to);
        self.is_subtype(&from_erased, &to_erased, false)
    }

    pub(crate) fn is_raw(&self, ct: &ClassType) -> bool {
        is_raw_class(self, ct)
    }

    pub(crate) fn is_raw_type(&self, ty: &Type) -> bool {
        matches!(ty, Type::Class(ct) if self.is_raw(ct))
    }

    pub(crate) fn is_unresolved(&self, ty: &Type) -> bool {
        match ty {
            Type::Unknown | Type::Error => true,
            Type::Class(ct) => self.class(ct.def).is_some_and(|def| def.is_unresolved),
            _ => false,
        }
    }

    pub(crate) fn is_interface_class(&self, id: ClassId) -> bool {
        self.class(id).is_some_and(|def| def.kind.is_interface())
    }

    pub(crate) fn is_interface_type(&self, ty: &Type) -> bool {
        matches!(ty, Type::Class(ct) if self.is_interface_class(ct.def))
    }

    /// The substitution mapping the declared type parameters of `ct` (and of
    /// its enclosing instantiations) to the instantiation's arguments.
    pub fn type_param_subst(&self, ct: &ClassType) -> Substitution {
        let mut sigma = Substitution::empty();
        let mut current = Some(ct);
        while let Some(c) = current {
            if let Some(def) = self.class(c.def) {
                if def.type_params.len() == c.args.len() {
                    for (var, arg) in def.type_params.iter().zip(&c.args) {
                        sigma.insert(*var, arg.clone());
                    }
                }
            }
            current = c.enclosing.as_deref();
        }
        sigma
    }
}

fn erase_class(ct: &ClassType) -> ClassType {
    ClassType {
        def: ct.def,
        args: vec![],
        enclosing: ct.enclosing.as_deref().map(|e| Box::new(erase_class(e))),
    }
}

impl TypeEnv for TyContext<'_> {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.base.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if let Some(index) = id.context_local_index() {
            return self.locals.get(index);
        }
        self.base.type_param(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.base.lookup_class(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.base.well_known()
    }
}
