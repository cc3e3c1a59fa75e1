use expect_test::expect;
use tyfix_types::{
    AtomId, Constraint, ConstraintKind, ConstraintPosition, Ty, TyVid, TypeVariable, TypeVariableOrigin,
};

#[test]
fn prints_function_and_named_types() {
    let ty = Ty::function(
        vec![Ty::int(), Ty::named("List", vec![Ty::Var(TyVid(4))])],
        Ty::function(vec![], Ty::unit()),
    );
    expect![["(Int, List<?4>) -> () -> Unit"]].assert_eq(&ty.to_string());
}

#[test]
fn prints_error_placeholder_and_tuples() {
    let ty = Ty::Tuple(vec![Ty::Error, Ty::nothing(), Ty::any()]);
    expect![["(<error>, Nothing, Any)"]].assert_eq(&ty.to_string());
}

#[test]
fn prints_constraints_with_their_position() {
    let constraint = Constraint::new(
        Ty::function(vec![Ty::string()], Ty::unit()),
        ConstraintKind::Upper,
        ConstraintPosition::Argument { atom: AtomId(2), index: 0 },
    );
    expect![["<: (String) -> Unit (from argument 0 of #2)"]].assert_eq(&constraint.to_string());
}

#[test]
fn prints_type_variables_with_origin() {
    let param = TypeVariable::new(
        TyVid(0),
        TypeVariableOrigin::TypeParameter { callee: "baz".into(), name: "T".into() },
    );
    expect![["T of baz (?0)"]].assert_eq(&param.to_string());

    let lambda_param = TypeVariable::new(TyVid(7), TypeVariableOrigin::LambdaParameter { atom: AtomId(3), index: 1 });
    expect![["parameter 1 of lambda #3 (?7)"]].assert_eq(&lambda_param.to_string());
    assert_eq!(lambda_param.default_type(), Ty::Var(TyVid(7)));
}
