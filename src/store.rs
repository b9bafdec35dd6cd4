//! Class, method, and type-parameter metadata behind the [`TypeEnv`] trait.
//!
//! The production implementation feeds class-file stubs from the user's
//! classpath into a [`TypeStore`]; tests build on the seeded
//! [`TypeStore::with_minimal_jdk`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ClassId, ClassType, PrimitiveType, Type, TypeVarId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    /// Annotation types are interfaces, but never functional interfaces.
    Annotation,
}

impl ClassKind {
    pub fn is_interface(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

/// JLS 6.6 access level of a member.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    /// Declared upper bound; an intersection for multiple bounds.
    pub upper_bound: Type,
    /// Capture conversion may introduce a lower bound (`? super T`).
    pub lower_bound: Option<Type>,
    /// Whether this variable was introduced by capture conversion.
    pub capture: bool,
}

impl TypeParamDef {
    pub fn declared(name: impl Into<String>, upper_bound: Type) -> Self {
        Self {
            name: name.into(),
            upper_bound,
            lower_bound: None,
            capture: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub visibility: Visibility,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub thrown: Vec<Type>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_default: bool,
    pub is_constructor: bool,
}

impl MethodDef {
    /// A public abstract instance method, the common shape for interface
    /// members in fixtures.
    pub fn abstract_method(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            type_params: vec![],
            params,
            return_type,
            thrown: vec![],
            is_static: false,
            is_abstract: true,
            is_default: false,
            is_constructor: false,
        }
    }

    /// A public concrete instance method.
    pub fn concrete_method(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            is_abstract: false,
            ..Self::abstract_method(name, params, return_type)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Binary name, e.g. `java.util.List`.
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<MethodDef>,
    pub enclosing: Option<ClassId>,
    /// Set when the symbol could not be resolved; such types silently
    /// satisfy subtype checks on the subtype side.
    pub is_unresolved: bool,
}

impl ClassDef {
    pub fn top_level(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
            methods: vec![],
            enclosing: None,
            is_unresolved: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub integer: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
}

/// Read-only surface over class and type-parameter metadata.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

/// The generic type declaration `C<T1, .., Tn>` of a class, with its formal
/// type parameters as arguments. Non-generic classes yield `C`.
pub fn declaration(env: &dyn TypeEnv, id: ClassId) -> Type {
    let args = env
        .class(id)
        .map(|def| def.type_params.iter().copied().map(Type::TypeVar).collect())
        .unwrap_or_default();
    Type::class(id, args)
}

/// The wrapper class for a primitive, if the environment defines one.
pub fn boxed_class(env: &dyn TypeEnv, prim: PrimitiveType) -> Option<ClassId> {
    env.lookup_class(prim.boxed_name())
}

#[derive(Debug, Default)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: Option<WellKnownTypes>,
}

impl TypeStore {
    /// A store seeded with the handful of `java.lang` / `java.util` types the
    /// algebra depends on (well-known classes, boxes, a few collection and
    /// functional interfaces).
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore::default();

        let object = store.add_class(ClassDef::top_level("java.lang.Object", ClassKind::Class));
        let obj = || Type::class(object, vec![]);

        let serializable =
            store.add_class(ClassDef::top_level("java.io.Serializable", ClassKind::Interface));
        let cloneable =
            store.add_class(ClassDef::top_level("java.lang.Cloneable", ClassKind::Interface));
        let char_sequence =
            store.add_class(ClassDef::top_level("java.lang.CharSequence", ClassKind::Interface));

        // java.lang.Comparable<T>
        let comparable_t = store.add_type_param("T", obj());
        let comparable = store.add_class(ClassDef {
            type_params: vec![comparable_t],
            methods: vec![MethodDef::abstract_method(
                "compareTo",
                vec![Type::TypeVar(comparable_t)],
                Type::Primitive(PrimitiveType::Int),
            )],
            ..ClassDef::top_level("java.lang.Comparable", ClassKind::Interface)
        });

        let number = store.add_class(ClassDef {
            super_class: Some(obj()),
            interfaces: vec![Type::class(serializable, vec![])],
            ..ClassDef::top_level("java.lang.Number", ClassKind::Class)
        });

        let string = store.add_class(ClassDef {
            super_class: Some(obj()),
            interfaces: vec![
                Type::class(char_sequence, vec![]),
                Type::class(comparable, vec![]),
                Type::class(serializable, vec![]),
            ],
            ..ClassDef::top_level("java.lang.String", ClassKind::Class)
        });
        // String implements Comparable<String>; patch in the argument now
        // that the id exists.
        store.classes[string.0 as usize].interfaces[1] =
            Type::class(comparable, vec![Type::class(string, vec![])]);

        // Object's public members, referenced when pruning abstract methods
        // that merely redeclare them (JLS 9.8).
        store.classes[object.0 as usize].methods = vec![
            MethodDef::concrete_method("equals", vec![obj()], Type::Primitive(PrimitiveType::Boolean)),
            MethodDef::concrete_method("hashCode", vec![], Type::Primitive(PrimitiveType::Int)),
            MethodDef::concrete_method("toString", vec![], Type::class(string, vec![])),
        ];

        // Wrapper classes.
        let mut integer = ClassId(0);
        for (name, prim) in [
            ("java.lang.Boolean", PrimitiveType::Boolean),
            ("java.lang.Character", PrimitiveType::Char),
            ("java.lang.Byte", PrimitiveType::Byte),
            ("java.lang.Short", PrimitiveType::Short),
            ("java.lang.Integer", PrimitiveType::Int),
            ("java.lang.Long", PrimitiveType::Long),
            ("java.lang.Float", PrimitiveType::Float),
            ("java.lang.Double", PrimitiveType::Double),
        ] {
            let super_class = if prim.is_numeric() && prim != PrimitiveType::Char {
                Type::class(number, vec![])
            } else {
                obj()
            };
            let id = store.add_class(ClassDef {
                super_class: Some(super_class),
                interfaces: vec![Type::class(serializable, vec![])],
                ..ClassDef::top_level(name, ClassKind::Class)
            });
            if prim == PrimitiveType::Int {
                integer = id;
            }
        }

        // java.lang.Iterable<T> / java.util.Collection<E> / java.util.List<E>
        let iterable_t = store.add_type_param("T", obj());
        let iterable = store.add_class(ClassDef {
            type_params: vec![iterable_t],
            ..ClassDef::top_level("java.lang.Iterable", ClassKind::Interface)
        });

        let collection_e = store.add_type_param("E", obj());
        let collection = store.add_class(ClassDef {
            type_params: vec![collection_e],
            interfaces: vec![Type::class(iterable, vec![Type::TypeVar(collection_e)])],
            ..ClassDef::top_level("java.util.Collection", ClassKind::Interface)
        });

        let list_e = store.add_type_param("E", obj());
        let list = store.add_class(ClassDef {
            type_params: vec![list_e],
            interfaces: vec![Type::class(collection, vec![Type::TypeVar(list_e)])],
            methods: vec![
                MethodDef::abstract_method(
                    "get",
                    vec![Type::Primitive(PrimitiveType::Int)],
                    Type::TypeVar(list_e),
                ),
                MethodDef::abstract_method(
                    "add",
                    vec![Type::TypeVar(list_e)],
                    Type::Primitive(PrimitiveType::Boolean),
                ),
            ],
            ..ClassDef::top_level("java.util.List", ClassKind::Interface)
        });

        let array_list_e = store.add_type_param("E", obj());
        store.add_class(ClassDef {
            type_params: vec![array_list_e],
            super_class: Some(obj()),
            interfaces: vec![Type::class(list, vec![Type::TypeVar(array_list_e)])],
            ..ClassDef::top_level("java.util.ArrayList", ClassKind::Class)
        });

        // java.util.function.Function<T, R>
        let function_t = store.add_type_param("T", obj());
        let function_r = store.add_type_param("R", obj());
        store.add_class(ClassDef {
            type_params: vec![function_t, function_r],
            methods: vec![MethodDef::abstract_method(
                "apply",
                vec![Type::TypeVar(function_t)],
                Type::TypeVar(function_r),
            )],
            ..ClassDef::top_level("java.util.function.Function", ClassKind::Interface)
        });

        // java.lang.Runnable
        store.add_class(ClassDef {
            methods: vec![MethodDef::abstract_method("run", vec![], Type::Void)],
            ..ClassDef::top_level("java.lang.Runnable", ClassKind::Interface)
        });

        store.well_known = Some(WellKnownTypes {
            object,
            string,
            number,
            integer,
            cloneable,
            serializable,
        });

        store
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        if self.class_by_name.contains_key(&def.name) {
            // Two ids for the same binary name would make structural type
            // equality diverge from name equality. Programmer error.
            panic!("duplicate class definition for {}", def.name);
        }
        self.class_by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    /// Reserve an id for a class whose definition needs the id itself
    /// (self-referential bounds). Pair with [`TypeStore::define_class`].
    pub fn intern_class_id(&mut self, name: impl Into<String>) -> ClassId {
        let name = name.into();
        if let Some(id) = self.class_by_name.get(&name).copied() {
            return id;
        }
        let mut def = ClassDef::top_level(name, ClassKind::Class);
        def.is_unresolved = true;
        self.add_class(def)
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let slot = &mut self.classes[id.0 as usize];
        assert_eq!(slot.name, def.name, "class id redefined under a new name");
        *slot = def;
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)
    }

    pub fn add_type_param(&mut self, name: impl Into<String>, upper_bound: Type) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef::declared(name, upper_bound));
        id
    }

    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        self.type_params[id.0 as usize] = def;
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.lookup_class(name)
    }

    /// The generic type declaration of `id`, see [`declaration`].
    pub fn declaration(&self, id: ClassId) -> Type {
        declaration(self, id)
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.class_by_name.get(name).copied() {
            return Some(id);
        }

        // Mirror the implicit `java.lang.*` universe scope so callers are
        // not forced to spell out fully-qualified names for common types.
        if !name.contains('.') {
            let jlang = format!("java.lang.{name}");
            return self.class_by_name.get(&jlang).copied();
        }

        None
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.well_known
            .as_ref()
            .expect("TypeStore::with_minimal_jdk must initialize well-known types")
    }
}

/// Whether `ct` is a raw instantiation of a generic class.
pub(crate) fn is_raw_class(env: &dyn TypeEnv, ct: &ClassType) -> bool {
    ct.args.is_empty()
        && env
            .class(ct.def)
            .is_some_and(|def| !def.type_params.is_empty())
}

/// The outermost class in the nest of `id` (JLS 8.1.3 nestmates).
pub(crate) fn nest_root(env: &dyn TypeEnv, id: ClassId) -> ClassId {
    let mut root = id;
    while let Some(enclosing) = env.class(root).and_then(|def| def.enclosing) {
        root = enclosing;
    }
    root
}

/// The package of `id`, derived from the binary name of its nest root.
pub(crate) fn package_name(env: &dyn TypeEnv, id: ClassId) -> String {
    let root = nest_root(env, id);
    env.class(root)
        .and_then(|def| def.name.rsplit_once('.').map(|(pkg, _)| pkg.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_jdk_resolves_simple_names() {
        let store = TypeStore::with_minimal_jdk();
        assert_eq!(store.class_id("String"), Some(store.well_known().string));
        assert_eq!(store.class_id("Object"), Some(store.well_known().object));
        // Only `java.lang` is implicitly in scope.
        assert!(store.class_id("java.util.List").is_some());
        assert_eq!(store.class_id("List"), None);
    }

    #[test]
    fn boxes_are_seeded() {
        let store = TypeStore::with_minimal_jdk();
        for prim in [
            PrimitiveType::Boolean,
            PrimitiveType::Byte,
            PrimitiveType::Short,
            PrimitiveType::Char,
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Float,
            PrimitiveType::Double,
        ] {
            assert!(boxed_class(&store, prim).is_some(), "no box for {prim}");
        }
        assert_eq!(
            boxed_class(&store, PrimitiveType::Int),
            Some(store.well_known().integer)
        );
    }

    #[test]
    #[should_panic(expected = "duplicate class definition")]
    fn duplicate_class_names_are_rejected() {
        let mut store = TypeStore::with_minimal_jdk();
        store.add_class(ClassDef::top_level("java.lang.Object", ClassKind::Class));
    }

    #[test]
    fn packages_follow_the_nest_root() {
        let mut store = TypeStore::with_minimal_jdk();
        let outer = store.add_class(ClassDef::top_level("com.example.Outer", ClassKind::Class));
        let inner = store.add_class(ClassDef {
            enclosing: Some(outer),
            ..ClassDef::top_level("com.example.Outer$Inner", ClassKind::Class)
        });
        assert_eq!(nest_root(&store, inner), outer);
        assert_eq!(package_name(&store, inner), "com.example");
    }
}
