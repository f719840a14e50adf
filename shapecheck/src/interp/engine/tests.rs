use super::*;
use crate::diagnostics::CollectedWarnings;
use crate::interp::AcyclicPreprocessor;
use crate::ir::{Block, Function, Operator, OperatorDef, Register, TerminatorDef, Type, TypeEnvironment};
use crate::loc::SourceLocation;
use pretty_assertions::assert_eq;

const ASSERT_SYMBOL: &str = "$ss6assert__4file4lineySbyXK_SSyXKs12StaticStringVSutF";
const SHAPE_GETTER: &str = "$s10TensorFlow0A0V5shapeAA0A5ShapeVvg";
const SHAPE_SUBSCRIPT: &str = "$s10TensorFlow0A5ShapeVyS2icir";
const RANK_GETTER: &str = "$s10TensorFlow0A0V4rankSivg";
const SHAPE_CTOR: &str = "$s10TensorFlow0A5ShapeV12arrayLiteralACSid_tcfC";

fn int_ty() -> Type {
    Type::named("Int")
}

fn bool_ty() -> Type {
    Type::named("Bool")
}

fn shape_ty() -> Type {
    Type::named("TensorShape")
}

fn tensor_ty() -> Type {
    Type::Specialized {
        base: Box::new(Type::named("Tensor")),
        params: vec![Type::named("Float")],
    }
}

fn unit_ty() -> Type {
    Type::Tuple(vec![])
}

fn fn_ty() -> Type {
    Type::Function {
        params: vec![],
        result: Box::new(unit_ty()),
    }
}

fn reg(name: &str) -> Register {
    Register::new(name)
}

fn def1(result: &str, ty: Type, operator: Operator) -> OperatorDef {
    OperatorDef::new(vec![(reg(result), ty)], operator)
}

fn summarize_ok(function: &Function, types: &TypeEnvironment) -> FunctionSummary {
    let mut sink = CollectedWarnings::new();
    let summary = summarize(function, types, &AcyclicPreprocessor, &mut sink);
    assert!(sink.is_empty(), "unexpected warnings: {:?}", sink.take());
    summary.expect("function should abstract cleanly")
}

fn implied(expr: BoolExpr, assuming: BoolExpr) -> RawConstraint {
    RawConstraint::Expr {
        expr,
        assuming,
        origin: ConstraintOrigin::Implied,
        location: None,
    }
}

#[test]
fn test_integer_literal_flows_to_return() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("0") });
    block.push(def1(
        "0",
        int_ty(),
        Operator::IntegerLiteral {
            ty: Type::Builtin("IntLiteral".to_string()),
            value: 5,
        },
    ));
    let function = Function::new("five", int_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    assert_eq!(summary.arg_exprs, vec![]);
    assert_eq!(
        summary.ret_expr,
        Some(Expr::Int(IntExpr::Var(crate::constraints::IntVar(0))))
    );
    assert_eq!(
        summary.constraints,
        vec![implied(
            BoolExpr::int_eq(
                IntExpr::Var(crate::constraints::IntVar(0)),
                IntExpr::Literal(5)
            ),
            BoolExpr::True,
        )]
    );
}

#[test]
fn test_ownership_noop_shares_the_operand_value() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("1") })
        .with_argument(reg("0"), int_ty());
    block.push(def1(
        "1",
        int_ty(),
        Operator::CopyValue { operand: reg("0") },
    ));
    let function = Function::new("id", int_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let arg = IntExpr::Var(crate::constraints::IntVar(0));
    let ret = IntExpr::Var(crate::constraints::IntVar(1));
    assert_eq!(summary.arg_exprs, vec![Some(Expr::Int(arg.clone()))]);
    // The copy shares the argument's value: the return equation mentions the
    // argument variable, not a fresh one.
    assert_eq!(
        summary.constraints,
        vec![implied(BoolExpr::int_eq(ret, arg), BoolExpr::True)]
    );
}

#[test]
fn test_cond_branch_forks_and_rejoins_path_conditions() {
    let entry = {
        let block = Block::new(
            "bb0",
            TerminatorDef::CondBranch {
                condition: reg("c"),
                true_target: "bb1".to_string(),
                true_operands: vec![],
                false_target: "bb2".to_string(),
                false_operands: vec![],
            },
        )
        .with_argument(reg("c"), bool_ty())
        .with_argument(reg("x"), int_ty())
        .with_argument(reg("y"), int_ty());
        block
    };
    let bb1 = Block::new(
        "bb1",
        TerminatorDef::Branch {
            target: "bb3".to_string(),
            operands: vec![reg("x")],
        },
    );
    let bb2 = Block::new(
        "bb2",
        TerminatorDef::Branch {
            target: "bb3".to_string(),
            operands: vec![reg("y")],
        },
    );
    let bb3 = Block::new("bb3", TerminatorDef::Return { operand: reg("z") })
        .with_argument(reg("z"), int_ty());
    let function = Function::new("select", int_ty(), vec![entry, bb1, bb2, bb3]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());

    let c = BoolExpr::Var(crate::constraints::BoolVar(0));
    let x = IntExpr::Var(crate::constraints::IntVar(1));
    let y = IntExpr::Var(crate::constraints::IntVar(2));
    let z = IntExpr::Var(crate::constraints::IntVar(3));
    let ret = IntExpr::Var(crate::constraints::IntVar(4));
    // The rejoin block's path condition is the disjunction of both edges,
    // sorted by textual form ("!(b0)" sorts before "b0").
    let rejoined = BoolExpr::Or(vec![c.clone().negated(), c.clone()]);
    assert_eq!(
        summary.constraints,
        vec![
            implied(BoolExpr::int_eq(z.clone(), x), c.clone()),
            implied(BoolExpr::int_eq(z.clone(), y), c.negated()),
            implied(BoolExpr::int_eq(ret, z), rejoined),
        ]
    );
}

#[test]
fn test_shape_and_rank_getters() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("3") })
        .with_argument(reg("t"), tensor_ty());
    block.push(def1(
        "1",
        fn_ty(),
        Operator::FunctionRef {
            name: RANK_GETTER.to_string(),
        },
    ));
    block.push(def1(
        "3",
        int_ty(),
        Operator::Apply {
            callee: reg("1"),
            args: vec![reg("t")],
        },
    ));
    let function = Function::new("rankOf", int_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let shape = ListExpr::Var(crate::constraints::ListVar(0));
    let ret = IntExpr::Var(crate::constraints::IntVar(1));
    assert_eq!(summary.arg_exprs, vec![Some(Expr::List(shape.clone()))]);
    assert_eq!(
        summary.constraints,
        vec![implied(
            BoolExpr::int_eq(ret, IntExpr::length(shape)),
            BoolExpr::True
        )]
    );
}

#[test]
fn test_shape_subscript_with_a_literal_index() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("d") })
        .with_argument(reg("t"), tensor_ty());
    block.push(def1(
        "f",
        fn_ty(),
        Operator::FunctionRef {
            name: SHAPE_GETTER.to_string(),
        },
    ));
    block.push(def1(
        "s",
        shape_ty(),
        Operator::Apply {
            callee: reg("f"),
            args: vec![reg("t")],
        },
    ));
    block.push(def1(
        "g",
        fn_ty(),
        Operator::FunctionRef {
            name: SHAPE_SUBSCRIPT.to_string(),
        },
    ));
    block.push(def1(
        "k",
        int_ty(),
        Operator::IntegerLiteral {
            ty: int_ty(),
            value: 0,
        },
    ));
    // The subscript getter receives the index before the shape.
    block.push(def1(
        "d",
        int_ty(),
        Operator::Apply {
            callee: reg("g"),
            args: vec![reg("k"), reg("s")],
        },
    ));
    let function = Function::new("leadingDim", int_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let shape = ListExpr::Var(crate::constraints::ListVar(0));
    let ret = IntExpr::Var(crate::constraints::IntVar(1));
    assert_eq!(
        summary.constraints,
        vec![implied(
            BoolExpr::int_eq(ret, IntExpr::element(0, shape)),
            BoolExpr::True
        )]
    );
}

#[test]
fn test_array_literal_feeds_the_shape_constructor() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("s") });
    block.push(def1(
        "0",
        int_ty(),
        Operator::IntegerLiteral {
            ty: int_ty(),
            value: 2,
        },
    ));
    block.push(def1(
        "1",
        int_ty(),
        Operator::IntegerLiteral {
            ty: int_ty(),
            value: 3,
        },
    ));
    block.push(def1(
        "arr",
        Type::Specialized {
            base: Box::new(Type::named("Array")),
            params: vec![int_ty()],
        },
        Operator::ArrayLiteral {
            element: int_ty(),
            elements: vec![reg("0"), reg("1")],
        },
    ));
    block.push(def1(
        "f",
        fn_ty(),
        Operator::FunctionRef {
            name: SHAPE_CTOR.to_string(),
        },
    ));
    block.push(def1(
        "s",
        shape_ty(),
        Operator::Apply {
            callee: reg("f"),
            args: vec![reg("arr")],
        },
    ));
    let function = Function::new("literalShape", shape_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let ret = ListExpr::Var(crate::constraints::ListVar(0));
    assert_eq!(
        summary.constraints,
        vec![implied(
            BoolExpr::list_eq(ret, ListExpr::known([2, 3])),
            BoolExpr::True
        )]
    );
}

#[test]
fn test_assert_emits_the_call_and_asserted_pair() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("r") })
        .with_argument(reg("x"), int_ty());
    block.push(def1(
        "f",
        fn_ty(),
        Operator::FunctionRef {
            name: "positiveCheck".to_string(),
        },
    ));
    block.push(def1(
        "pa",
        fn_ty(),
        Operator::PartialApply {
            callee: reg("f"),
            args: vec![reg("x")],
            arg_types: vec![int_ty()],
        },
    ));
    block.push(def1(
        "a",
        fn_ty(),
        Operator::FunctionRef {
            name: ASSERT_SYMBOL.to_string(),
        },
    ));
    block.push(
        def1(
            "r",
            unit_ty(),
            Operator::Apply {
                callee: reg("a"),
                args: vec![reg("pa"), reg("msg")],
            },
        )
        .with_source(SourceLocation::new("main.swift", 9)),
    );
    let function = Function::new("checked", unit_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let x = Expr::Int(IntExpr::Var(crate::constraints::IntVar(0)));
    let flag = BoolExpr::Var(crate::constraints::BoolVar(1));
    assert_eq!(
        summary.constraints,
        vec![
            RawConstraint::Call {
                callee: "positiveCheck".to_string(),
                args: vec![Some(x)],
                result: Some(Expr::Bool(flag.clone())),
                assuming: BoolExpr::True,
                location: Some(SourceLocation::new("main.swift", 9)),
            },
            RawConstraint::Expr {
                expr: flag,
                assuming: BoolExpr::True,
                origin: ConstraintOrigin::Asserted,
                location: Some(SourceLocation::new("main.swift", 9)),
            },
        ]
    );
}

#[test]
fn test_opaque_call_leaves_a_call_constraint() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("r") })
        .with_argument(reg("t"), tensor_ty());
    block.push(def1(
        "f",
        fn_ty(),
        Operator::FunctionRef {
            name: "myLayer".to_string(),
        },
    ));
    block.push(def1(
        "r",
        tensor_ty(),
        Operator::Apply {
            callee: reg("f"),
            args: vec![reg("t")],
        },
    ));
    let function = Function::new("forward", tensor_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let arg_shape = ListExpr::Var(crate::constraints::ListVar(0));
    let ret_shape = ListExpr::Var(crate::constraints::ListVar(1));
    let call_shape = ListExpr::Var(crate::constraints::ListVar(2));
    assert_eq!(
        summary.constraints,
        vec![
            RawConstraint::Call {
                callee: "myLayer".to_string(),
                args: vec![Some(Expr::List(arg_shape))],
                result: Some(Expr::List(call_shape.clone())),
                assuming: BoolExpr::True,
                location: None,
            },
            implied(BoolExpr::list_eq(ret_shape, call_shape), BoolExpr::True),
        ]
    );
}

#[test]
fn test_struct_extract_resolves_declared_field_order() {
    let mut types = TypeEnvironment::new();
    types.declare(
        "Model",
        vec![
            ("weight".to_string(), tensor_ty()),
            ("count".to_string(), int_ty()),
        ],
    );

    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("n") })
        .with_argument(reg("m"), Type::named("Model"));
    block.push(def1(
        "n",
        int_ty(),
        Operator::StructExtract {
            operand: reg("m"),
            ty: "Model".to_string(),
            field: "count".to_string(),
        },
    ));
    let function = Function::new("countOf", int_ty(), vec![block]);

    let summary = summarize_ok(&function, &types);
    // The model is a tuple of fresh field values: shape s0, count d1.
    let count = IntExpr::Var(crate::constraints::IntVar(1));
    let ret = IntExpr::Var(crate::constraints::IntVar(2));
    assert_eq!(
        summary.constraints,
        vec![implied(BoolExpr::int_eq(ret, count), BoolExpr::True)]
    );
}

#[test]
fn test_int_global_load_becomes_a_location_keyed_hole() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("v") });
    block.push(def1(
        "a",
        Type::Address(Box::new(int_ty())),
        Operator::GlobalAddr {
            name: "$s4main4sizeSivp".to_string(),
        },
    ));
    block.push(
        def1("v", int_ty(), Operator::Load { operand: reg("a") })
            .with_source(SourceLocation::new("main.swift", 4)),
    );
    let function = Function::new("globalSize", int_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let ret = IntExpr::Var(crate::constraints::IntVar(0));
    assert_eq!(
        summary.constraints,
        vec![implied(
            BoolExpr::int_eq(ret, IntExpr::Hole(SourceLocation::new("main.swift", 4))),
            BoolExpr::True
        )]
    );
}

#[test]
fn test_broadcast_builtin_builds_a_broadcast_shape() {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("r") })
        .with_argument(reg("a"), tensor_ty())
        .with_argument(reg("b"), tensor_ty());
    block.push(def1(
        "f",
        fn_ty(),
        Operator::FunctionRef {
            name: "broadcast".to_string(),
        },
    ));
    block.push(def1(
        "r",
        tensor_ty(),
        Operator::Apply {
            callee: reg("f"),
            args: vec![reg("a"), reg("b")],
        },
    ));
    let function = Function::new("sum", tensor_ty(), vec![block]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    let a = ListExpr::Var(crate::constraints::ListVar(0));
    let b = ListExpr::Var(crate::constraints::ListVar(1));
    let ret = ListExpr::Var(crate::constraints::ListVar(2));
    assert_eq!(
        summary.constraints,
        vec![implied(
            BoolExpr::list_eq(ret, ListExpr::broadcast(a, b)),
            BoolExpr::True
        )]
    );
}

#[test]
fn test_unknown_terminator_skips_the_function() {
    let block = Block::new(
        "bb0",
        TerminatorDef::Unknown {
            name: "throw".to_string(),
        },
    );
    let function = Function::new("thrower", unit_ty(), vec![block]);

    let mut sink = CollectedWarnings::new();
    let summary = summarize(
        &function,
        &TypeEnvironment::new(),
        &AcyclicPreprocessor,
        &mut sink,
    );
    assert!(summary.is_none());
    let warnings = sink.take();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("unsupported terminator throw"));
}

#[test]
fn test_cyclic_cfg_is_rejected_as_non_reducible() {
    let bb0 = Block::new(
        "bb0",
        TerminatorDef::Branch {
            target: "bb1".to_string(),
            operands: vec![],
        },
    );
    let bb1 = Block::new(
        "bb1",
        TerminatorDef::Branch {
            target: "bb0".to_string(),
            operands: vec![],
        },
    );
    let function = Function::new("spin", unit_ty(), vec![bb0, bb1]);

    let mut sink = CollectedWarnings::new();
    let summary = summarize(
        &function,
        &TypeEnvironment::new(),
        &AcyclicPreprocessor,
        &mut sink,
    );
    assert!(summary.is_none());
    let warnings = sink.take();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("not reducible"));
}

#[test]
fn test_switch_enum_guards_targets_with_fresh_booleans() {
    let entry = Block::new(
        "bb0",
        TerminatorDef::SwitchEnum {
            operand: reg("e"),
            targets: vec![("some".to_string(), "bb1".to_string())],
            default: Some("bb2".to_string()),
        },
    );
    let mut bb1 = Block::new("bb1", TerminatorDef::Return { operand: reg("0") });
    bb1.push(def1(
        "0",
        int_ty(),
        Operator::IntegerLiteral {
            ty: int_ty(),
            value: 1,
        },
    ));
    let mut bb2 = Block::new("bb2", TerminatorDef::Return { operand: reg("1") });
    bb2.push(def1(
        "1",
        int_ty(),
        Operator::IntegerLiteral {
            ty: int_ty(),
            value: 2,
        },
    ));
    let function = Function::new("pick", int_ty(), vec![entry, bb1, bb2]);

    let summary = summarize_ok(&function, &TypeEnvironment::new());
    // ret is d0; the two case guards are fresh b1 and b2.
    let ret = IntExpr::Var(crate::constraints::IntVar(0));
    assert_eq!(
        summary.constraints,
        vec![
            implied(
                BoolExpr::int_eq(ret.clone(), IntExpr::Literal(1)),
                BoolExpr::Var(crate::constraints::BoolVar(1)),
            ),
            implied(
                BoolExpr::int_eq(ret, IntExpr::Literal(2)),
                BoolExpr::Var(crate::constraints::BoolVar(2)),
            ),
        ]
    );
}

#[test]
fn test_summaries_are_deterministic() {
    let entry = Block::new(
        "bb0",
        TerminatorDef::CondBranch {
            condition: reg("c"),
            true_target: "bb1".to_string(),
            true_operands: vec![],
            false_target: "bb2".to_string(),
            false_operands: vec![],
        },
    )
    .with_argument(reg("c"), bool_ty())
    .with_argument(reg("x"), int_ty());
    let bb1 = Block::new(
        "bb1",
        TerminatorDef::Branch {
            target: "bb3".to_string(),
            operands: vec![reg("x")],
        },
    );
    let bb2 = Block::new(
        "bb2",
        TerminatorDef::Branch {
            target: "bb3".to_string(),
            operands: vec![reg("x")],
        },
    );
    let bb3 = Block::new("bb3", TerminatorDef::Return { operand: reg("z") })
        .with_argument(reg("z"), int_ty());
    let function = Function::new("diamond", int_ty(), vec![entry, bb1, bb2, bb3]);

    let types = TypeEnvironment::new();
    let first = summarize_ok(&function, &types);
    let second = summarize_ok(&function, &types);
    assert_eq!(first, second);
}
