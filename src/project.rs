//! Upwards and downwards type projection (JLS 4.10.5).
//!
//! Projection rewrites a type so it no longer mentions capture variables,
//! used when a local variable's inferred type must be denotable. The upward
//! projection is total and yields a supertype; the downward projection
//! yields a subtype and is partial, with `None` propagating through
//! composite types.

use crate::ctx::TyContext;
use crate::equate::mentions_any_tvar;
use crate::store::TypeEnv;
use crate::{ClassType, Type, WildcardBound};

impl TyContext<'_> {
    /// Some supertype of `t` that mentions no capture variable.
    pub fn project_upwards(&mut self, t: &Type) -> Type {
        self.project(t, true)
            .expect("upwards projection is total")
    }

    /// Some subtype of `t` that mentions no capture variable, when one is
    /// expressible.
    pub fn project_downwards(&mut self, t: &Type) -> Option<Type> {
        self.project(t, false)
    }

    /// `None` only ever in the downwards direction. A type that mentions no
    /// capture variable projects to itself, unchanged.
    fn project(&mut self, t: &Type, upwards: bool) -> Option<Type> {
        match t {
            Type::TypeVar(var) => {
                if !self.is_captured(*var) {
                    return Some(t.clone());
                }
                if upwards {
                    let upper = self.upper_bound_of(*var);
                    self.project(&upper, true)
                } else {
                    // An absent lower bound is the null type, which has no
                    // downward projection.
                    let lower = self.lower_bound_of(*var);
                    self.project(&lower, false)
                }
            }

            Type::Null => {
                if upwards {
                    Some(t.clone())
                } else {
                    None
                }
            }

            Type::Primitive(_) | Type::Void | Type::Unknown | Type::Error | Type::Infer(_) => {
                Some(t.clone())
            }

            Type::Wildcard(w) => {
                let w = w.clone();
                self.project_wildcard(&w, upwards).map(Type::Wildcard)
            }

            Type::Array(elem) => {
                let elem = (**elem).clone();
                let projected = self.project(&elem, upwards)?;
                Some(if projected == elem {
                    t.clone()
                } else {
                    Type::array(projected)
                })
            }

            Type::Intersection(parts) => {
                let parts = parts.clone();
                let mut out = Vec::with_capacity(parts.len());
                let mut changed = false;
                for part in &parts {
                    let projected = self.project(part, upwards)?;
                    changed |= projected != *part;
                    out.push(projected);
                }
                Some(if changed {
                    self.glb(out)
                } else {
                    t.clone()
                })
            }

            Type::Class(ct) => {
                let ct = ct.clone();
                self.project_class(&ct, upwards)
            }
        }
    }

    /// Projection of a wildcard used as a type argument. Bounds swap
    /// direction under a `super` wildcard.
    fn project_wildcard(&mut self, w: &WildcardBound, upwards: bool) -> Option<WildcardBound> {
        let bound = self.wildcard_bound(w);
        let up = self
            .project(&bound, true)
            .expect("upwards projection is total");
        if up == bound {
            return Some(w.clone());
        }

        if upwards {
            if w.is_upper() {
                Some(WildcardBound::Extends(Box::new(up)))
            } else {
                Some(match self.project(&bound, false) {
                    None => WildcardBound::Unbounded,
                    Some(down) => WildcardBound::Super(Box::new(down)),
                })
            }
        } else if w.is_upper() {
            let down = self.project(&bound, false)?;
            Some(WildcardBound::Extends(Box::new(down)))
        } else {
            Some(WildcardBound::Super(Box::new(up)))
        }
    }

    fn project_class(&mut self, ct: &ClassType, upwards: bool) -> Option<Type> {
        if ct.args.is_empty() {
            return Some(Type::Class(ct.clone()));
        }
        let Some(def) = self.class(ct.def).cloned() else {
            return Some(Type::Class(ct.clone()));
        };
        let formals = def.type_params;
        if formals.len() != ct.args.len() {
            return Some(Type::Class(ct.clone()));
        }

        let mut new_args = Vec::with_capacity(ct.args.len());
        let mut changed = false;

        for (i, arg) in ct.args.iter().enumerate() {
            if let Type::Wildcard(w) = arg {
                let w = w.clone();
                let projected = Type::Wildcard(self.project_wildcard(&w, upwards)?);
                changed |= projected != *arg;
                new_args.push(projected);
                continue;
            }

            let projected = self.project(arg, upwards)?;
            if projected == *arg {
                new_args.push(projected);
                continue;
            }
            if !upwards {
                // An argument that mentions a restricted variable has no
                // downward projection.
                return None;
            }
            changed = true;

            let declared_bound = self
                .type_param(formals[i])
                .map(|d| d.upper_bound.clone())
                .unwrap_or_else(|| self.object());

            // An F-bounded parameter, or a bound the projection does not
            // stay above, can only be approximated from above.
            if !self.is_object(&projected)
                && (mentions_any_tvar(&declared_bound, &formals)
                    || !self.is_subtype(&declared_bound, &projected, false))
            {
                new_args.push(Type::wildcard_extends(projected));
            } else {
                new_args.push(match self.project(arg, false) {
                    None => Type::Wildcard(WildcardBound::Unbounded),
                    Some(down) => Type::wildcard_super(down),
                });
            }
        }

        Some(if changed {
            Type::Class(ClassType {
                def: ct.def,
                args: new_args,
                enclosing: ct.enclosing.clone(),
            })
        } else {
            Type::Class(ct.clone())
        })
    }
}
