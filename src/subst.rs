//! Substitution of type variables.
//!
//! Substitution is a hot spot: most invocations touch nothing, so the entry
//! points return [`Cow`] and hand back the input untouched unless a variable
//! was actually replaced. The list form clones at most once, on the first
//! changed element.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::{ClassType, Type, TypeVarId, WildcardBound};

/// A mapping from substitution variables (declared type parameters and
/// capture variables) to type terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    map: HashMap<TypeVarId, Type>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Map each variable in `from` to the corresponding type in `to`.
    pub fn mapping(from: &[TypeVarId], to: &[Type]) -> Self {
        debug_assert_eq!(from.len(), to.len(), "mapping arity mismatch");
        Self {
            map: from.iter().copied().zip(to.iter().cloned()).collect(),
        }
    }

    /// A variable renaming `from_i -> to_i`.
    pub fn rename(from: &[TypeVarId], to: &[TypeVarId]) -> Self {
        debug_assert_eq!(from.len(), to.len(), "renaming arity mismatch");
        Self {
            map: from
                .iter()
                .copied()
                .zip(to.iter().copied().map(Type::TypeVar))
                .collect(),
        }
    }

    pub fn insert(&mut self, var: TypeVarId, image: Type) {
        self.map.insert(var, image);
    }

    pub fn get(&self, var: TypeVarId) -> Option<&Type> {
        self.map.get(&var)
    }

    /// Compose with `next`: the result applies `self` first, then `next`.
    pub fn then(&self, next: &Substitution) -> Substitution {
        if self.is_empty() {
            return next.clone();
        }
        if next.is_empty() {
            return self.clone();
        }
        let mut map = HashMap::with_capacity(self.map.len() + next.map.len());
        for (var, image) in &self.map {
            map.insert(*var, subst(image, next).into_owned());
        }
        for (var, image) in &next.map {
            map.entry(*var).or_insert_with(|| image.clone());
        }
        Substitution { map }
    }
}

/// Replace substitution variables in `ty` by their image. Images are used
/// as-is; substitution is not applied recursively to them.
///
/// Returns `Cow::Borrowed` when no variable in `ty` was mapped.
pub fn subst<'a>(ty: &'a Type, s: &Substitution) -> Cow<'a, Type> {
    if s.is_empty() {
        return Cow::Borrowed(ty);
    }
    match ty {
        Type::TypeVar(var) => match s.get(*var) {
            Some(image) => Cow::Owned(image.clone()),
            None => Cow::Borrowed(ty),
        },
        Type::Class(ct) => match subst_class(ct, s) {
            Some(changed) => Cow::Owned(Type::Class(changed)),
            None => Cow::Borrowed(ty),
        },
        Type::Array(elem) => match subst(elem, s) {
            Cow::Owned(changed) => Cow::Owned(Type::Array(Box::new(changed))),
            Cow::Borrowed(_) => Cow::Borrowed(ty),
        },
        Type::Wildcard(WildcardBound::Extends(bound)) => match subst(bound, s) {
            Cow::Owned(changed) => Cow::Owned(Type::wildcard_extends(changed)),
            Cow::Borrowed(_) => Cow::Borrowed(ty),
        },
        Type::Wildcard(WildcardBound::Super(bound)) => match subst(bound, s) {
            Cow::Owned(changed) => Cow::Owned(Type::wildcard_super(changed)),
            Cow::Borrowed(_) => Cow::Borrowed(ty),
        },
        Type::Intersection(parts) => match subst_types(parts, s) {
            Cow::Owned(changed) => Cow::Owned(Type::Intersection(changed)),
            Cow::Borrowed(_) => Cow::Borrowed(ty),
        },
        _ => Cow::Borrowed(ty),
    }
}

/// Substitute a class instantiation, including its enclosing chain.
/// `None` means unchanged.
pub(crate) fn subst_class(ct: &ClassType, s: &Substitution) -> Option<ClassType> {
    let args = subst_types(&ct.args, s);
    let enclosing = ct.enclosing.as_deref().and_then(|e| subst_class(e, s));
    if matches!(args, Cow::Borrowed(_)) && enclosing.is_none() {
        return None;
    }
    Some(ClassType {
        def: ct.def,
        args: args.into_owned(),
        enclosing: match enclosing {
            Some(changed) => Some(Box::new(changed)),
            None => ct.enclosing.clone(),
        },
    })
}

/// Element-wise substitution over a list of types, cloning the list only on
/// the first change.
pub fn subst_types<'a>(ts: &'a [Type], s: &Substitution) -> Cow<'a, [Type]> {
    if s.is_empty() {
        return Cow::Borrowed(ts);
    }
    let mut out: Option<Vec<Type>> = None;
    for (i, ty) in ts.iter().enumerate() {
        if let Cow::Owned(changed) = subst(ty, s) {
            out.get_or_insert_with(|| ts.to_vec())[i] = changed;
        }
    }
    match out {
        Some(changed) => Cow::Owned(changed),
        None => Cow::Borrowed(ts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassId;

    fn tv(raw: u32) -> TypeVarId {
        TypeVarId::new(raw)
    }

    #[test]
    fn empty_substitution_is_identity() {
        let ty = Type::class(ClassId::new(3), vec![Type::TypeVar(tv(0))]);
        assert!(matches!(subst(&ty, &Substitution::empty()), Cow::Borrowed(_)));
    }

    #[test]
    fn unmapped_terms_are_returned_untouched() {
        let mut s = Substitution::empty();
        s.insert(tv(7), Type::Null);

        let ty = Type::class(ClassId::new(3), vec![Type::TypeVar(tv(0))]);
        assert!(matches!(subst(&ty, &s), Cow::Borrowed(_)));

        let list = vec![ty, Type::array(Type::TypeVar(tv(1)))];
        assert!(matches!(subst_types(&list, &s), Cow::Borrowed(_)));
    }

    #[test]
    fn substitutes_through_composite_terms() {
        let string = Type::class(ClassId::new(9), vec![]);
        let mut s = Substitution::empty();
        s.insert(tv(0), string.clone());

        let ty = Type::array(Type::wildcard_extends(Type::TypeVar(tv(0))));
        let out = subst(&ty, &s).into_owned();
        assert_eq!(out, Type::array(Type::wildcard_extends(string)));
    }

    #[test]
    fn images_are_not_resubstituted() {
        // T -> U, U -> X: substituting T must stop at U.
        let mut s = Substitution::empty();
        s.insert(tv(0), Type::TypeVar(tv(1)));
        s.insert(tv(1), Type::Null);

        let out = subst(&Type::TypeVar(tv(0)), &s).into_owned();
        assert_eq!(out, Type::TypeVar(tv(1)));
    }

    #[test]
    fn list_substitution_changes_only_mapped_elements() {
        let string = Type::class(ClassId::new(9), vec![]);
        let mut s = Substitution::empty();
        s.insert(tv(0), string.clone());

        let list = vec![Type::TypeVar(tv(0)), Type::TypeVar(tv(1))];
        let out = subst_types(&list, &s).into_owned();
        assert_eq!(out, vec![string, Type::TypeVar(tv(1))]);
    }

    #[test]
    fn composition_applies_left_then_right() {
        let mut first = Substitution::empty();
        first.insert(tv(0), Type::TypeVar(tv(1)));
        let mut second = Substitution::empty();
        second.insert(tv(1), Type::Null);

        let composed = first.then(&second);
        assert_eq!(subst(&Type::TypeVar(tv(0)), &composed).into_owned(), Type::Null);
        assert_eq!(subst(&Type::TypeVar(tv(1)), &composed).into_owned(), Type::Null);
    }
}
