use javelin_types::{
    ClassDef, ClassKind, PrimitiveType, TyContext, Type, TypeEnv, TypeStore, WildcardBound,
};

use pretty_assertions::assert_eq;

fn string_ty(store: &TypeStore) -> Type {
    Type::class(store.well_known().string, vec![])
}

fn object_ty(store: &TypeStore) -> Type {
    Type::class(store.well_known().object, vec![])
}

#[test]
fn subtyping_is_reflexive() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let list = store.class_id("java.util.List").unwrap();
    let samples = [
        object_ty(&store),
        string_ty(&store),
        Type::Primitive(PrimitiveType::Int),
        Type::array(string_ty(&store)),
        Type::class(list, vec![string_ty(&store)]),
        Type::class(list, vec![Type::Wildcard(WildcardBound::Unbounded)]),
        Type::Null,
        Type::Void,
    ];
    for ty in &samples {
        assert!(types.is_subtype(ty, ty, false), "{ty:?} should be a subtype of itself");
        assert!(types.is_same_type(ty, ty, false), "{ty:?} should equal itself");
    }
}

#[test]
fn simple_class_inheritance() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;

    let animal = store.add_class(ClassDef {
        super_class: Some(Type::class(object, vec![])),
        ..ClassDef::top_level("com.example.Animal", ClassKind::Class)
    });
    let dog = store.add_class(ClassDef {
        super_class: Some(Type::class(animal, vec![])),
        ..ClassDef::top_level("com.example.Dog", ClassKind::Class)
    });

    let mut types = TyContext::new(&store);
    assert!(types.is_subtype(&Type::class(dog, vec![]), &Type::class(animal, vec![]), false));
    assert!(types.is_subtype(&Type::class(dog, vec![]), &Type::class(object, vec![]), false));
    assert!(!types.is_subtype(&Type::class(animal, vec![]), &Type::class(dog, vec![]), false));
}

#[test]
fn wildcard_containment_governs_generic_subtyping() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let list = store.class_id("java.util.List").unwrap();
    let list_string = Type::class(list, vec![string_ty(&store)]);
    let list_object = Type::class(list, vec![object_ty(&store)]);
    let list_ext_object = Type::class(
        list,
        vec![Type::wildcard_extends(object_ty(&store))],
    );

    assert!(types.is_subtype(&list_string, &list_ext_object, false));
    assert!(!types.is_subtype(&list_string, &list_object, false));
}

#[test]
fn raw_types_absorb_on_the_supertype_side_only() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let list = store.class_id("java.util.List").unwrap();
    let raw_list = Type::class(list, vec![]);
    let list_object = Type::class(list, vec![object_ty(&store)]);

    // Any parameterization is a subtype of the raw form.
    assert!(types.is_subtype(&list_object, &raw_list, false));

    // Raw to parameterized needs unchecked conversion.
    assert!(types.is_subtype(&raw_list, &list_object, true));
    assert!(!types.is_subtype(&raw_list, &list_object, false));

    // Raw to all-unbounded-wildcards is the provably safe case.
    let list_wild = Type::class(list, vec![Type::Wildcard(WildcardBound::Unbounded)]);
    assert!(types.is_subtype(&raw_list, &list_wild, true));
    assert!(!types.is_subtype(&raw_list, &list_wild, false));
}

#[test]
fn generic_inheritance_substitutes_type_arguments() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let list = store.class_id("java.util.List").unwrap();
    let collection = store.class_id("java.util.Collection").unwrap();

    let al_string = Type::class(array_list, vec![string_ty(&store)]);
    let list_string = Type::class(list, vec![string_ty(&store)]);
    let coll_string = Type::class(collection, vec![string_ty(&store)]);
    let list_object = Type::class(list, vec![object_ty(&store)]);

    assert!(types.is_subtype(&al_string, &list_string, false));
    assert!(types.is_subtype(&list_string, &coll_string, false));
    // Transitivity along the interface chain.
    assert!(types.is_subtype(&al_string, &coll_string, false));
    assert!(!types.is_subtype(&al_string, &list_object, false));
}

#[test]
fn null_type_is_the_bottom_of_reference_types() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    assert!(types.is_subtype(&Type::Null, &string_ty(&store), false));
    assert!(types.is_subtype(&Type::Null, &Type::array(string_ty(&store)), false));
    assert!(!types.is_subtype(&Type::Null, &Type::Primitive(PrimitiveType::Int), false));
    assert!(!types.is_subtype(&string_ty(&store), &Type::Null, false));
}

#[test]
fn primitive_subtyping_follows_the_widening_lattice() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    use PrimitiveType::*;
    let prim = |p| Type::Primitive(p);

    assert!(types.is_subtype(&prim(Int), &prim(Long), false));
    assert!(types.is_subtype(&prim(Byte), &prim(Double), false));
    assert!(types.is_subtype(&prim(Char), &prim(Int), false));
    assert!(!types.is_subtype(&prim(Long), &prim(Int), false));
    assert!(!types.is_subtype(&prim(Boolean), &prim(Int), false));
    // Primitives are not reference types, not even under Object.
    assert!(!types.is_subtype(&prim(Int), &object_ty(&store), false));
}

#[test]
fn array_covariance_and_primitive_arrays() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let string_arr = Type::array(string_ty(&store));
    let object_arr = Type::array(object_ty(&store));
    let int_arr = Type::array(Type::Primitive(PrimitiveType::Int));
    let long_arr = Type::array(Type::Primitive(PrimitiveType::Long));

    assert!(types.is_subtype(&string_arr, &object_arr, false));
    assert!(!types.is_subtype(&object_arr, &string_arr, false));

    // Arrays of primitives only relate to themselves.
    assert!(types.is_subtype(&int_arr, &int_arr, false));
    assert!(!types.is_subtype(&int_arr, &long_arr, false));
    assert!(!types.is_subtype(&int_arr, &object_arr, false));

    // Every array is an Object, a Cloneable, and a Serializable.
    let cloneable = Type::class(store.well_known().cloneable, vec![]);
    let serializable = Type::class(store.well_known().serializable, vec![]);
    for arr in [&string_arr, &int_arr] {
        assert!(types.is_subtype(arr, &object_ty(&store), false));
        assert!(types.is_subtype(arr, &cloneable, false));
        assert!(types.is_subtype(arr, &serializable, false));
    }
}

#[test]
fn unresolved_types_satisfy_checks_on_the_subtype_side_only() {
    let mut store = TypeStore::with_minimal_jdk();
    let missing = store.add_class(ClassDef {
        is_unresolved: true,
        ..ClassDef::top_level("com.example.Missing", ClassKind::Class)
    });

    let mut types = TyContext::new(&store);
    let missing_ty = Type::class(missing, vec![]);
    let string = string_ty(&store);

    assert!(types.is_subtype(&missing_ty, &string, false));
    assert!(types.is_subtype(&Type::Unknown, &string, false));
    assert!(types.is_subtype(&Type::Error, &string, false));

    // Never on the supertype side.
    assert!(!types.is_subtype(&string, &missing_ty, false));
    assert!(!types.is_subtype(&string, &Type::Unknown, false));
}

#[test]
fn intersection_subtyping() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let number = Type::class(store.well_known().number, vec![]);
    let serializable = Type::class(store.well_known().serializable, vec![]);
    let char_sequence = Type::class(store.class_id("java.lang.CharSequence").unwrap(), vec![]);
    let cloneable = Type::class(store.well_known().cloneable, vec![]);

    // One component suffices on the subtype side.
    let num_and_cloneable = Type::Intersection(vec![number.clone(), cloneable.clone()]);
    assert!(types.is_subtype(&num_and_cloneable, &number, false));
    assert!(types.is_subtype(&num_and_cloneable, &cloneable, false));

    // Every component is needed on the supertype side.
    let string = string_ty(&store);
    let cs_and_ser = Type::Intersection(vec![char_sequence.clone(), serializable.clone()]);
    assert!(types.is_subtype(&string, &cs_and_ser, false));
    let cs_and_cloneable = Type::Intersection(vec![char_sequence, cloneable]);
    assert!(!types.is_subtype(&string, &cs_and_cloneable, false));
}

#[test]
fn type_variables_compare_through_their_bounds() {
    let mut store = TypeStore::with_minimal_jdk();
    let number = store.well_known().number;
    let t = store.add_type_param("T", Type::class(number, vec![]));

    let mut types = TyContext::new(&store);
    let t_var = Type::TypeVar(t);

    assert!(types.is_subtype(&t_var, &Type::class(number, vec![]), false));
    assert!(types.is_subtype(&t_var, &Type::class(store.well_known().object, vec![]), false));
    assert!(!types.is_subtype(&t_var, &string_ty(&store), false));
    // The declared variable has no lower bound, so nothing proper is below
    // it.
    assert!(!types.is_subtype(&string_ty(&store), &t_var, false));
}

#[test]
fn type_argument_containment_ranges() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let number = Type::class(store.well_known().number, vec![]);
    let integer = Type::class(store.well_known().integer, vec![]);
    let ext_number = Type::wildcard_extends(number.clone());
    let sup_number = Type::wildcard_super(number.clone());
    let sup_integer = Type::wildcard_super(integer.clone());
    let unbounded = Type::Wildcard(WildcardBound::Unbounded);

    assert!(types.type_arg_contains(&ext_number, &integer));
    assert!(!types.type_arg_contains(&ext_number, &Type::class(store.well_known().object, vec![])));
    assert!(types.type_arg_contains(&sup_integer, &number));
    assert!(!types.type_arg_contains(&sup_number, &integer));
    assert!(types.type_arg_contains(&unbounded, &integer));
    assert!(types.type_arg_contains(&unbounded, &ext_number));
    // A non-wildcard argument contains only itself.
    assert!(!types.type_arg_contains(&integer, &number));
}

#[test]
fn most_specific_drops_strict_supertypes() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    let object = object_ty(&store);
    let number = Type::class(store.well_known().number, vec![]);
    let integer = Type::class(store.well_known().integer, vec![]);
    let string = string_ty(&store);

    let reduced = types.most_specific(&[object, number, integer.clone(), string.clone()]);
    assert_eq!(reduced, vec![integer, string]);
}

#[test]
fn void_compares_only_by_identity_in_equality() {
    let store = TypeStore::with_minimal_jdk();
    let mut types = TyContext::new(&store);

    assert!(types.is_same_type(&Type::Void, &Type::Void, false));
    assert!(!types.is_same_type(&Type::Void, &object_ty(&store), false));
}
