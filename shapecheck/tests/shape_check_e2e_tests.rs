//! End-to-end checks: IR functions through summarization, call inlining,
//! and the transform pipeline.

use shapecheck::constraints::{
    BoolExpr, CallStack, Constraint, ConstraintOrigin, IntExpr, ListExpr, ListVar,
};
use shapecheck::ir::{
    Block, Function, Operator, OperatorDef, Register, TerminatorDef, Type, TypeEnvironment,
};
use shapecheck::{check_module, AcyclicPreprocessor, CollectedWarnings, SourceLocation};

const ASSERT_SYMBOL: &str = "$ss6assert__4file4lineySbyXK_SSyXKs12StaticStringVSutF";
const SHAPE_GETTER: &str = "$s10TensorFlow0A0V5shapeAA0A5ShapeVvg";
const SHAPE_EQUAL: &str = "$s10TensorFlow0A5ShapeV2eeoiySbAC_ACtFZ";
const SHAPE_CTOR: &str = "$s10TensorFlow0A5ShapeV12arrayLiteralACSid_tcfC";

fn reg(name: &str) -> Register {
    Register::new(name)
}

fn tensor_ty() -> Type {
    Type::Specialized {
        base: Box::new(Type::named("Tensor")),
        params: vec![Type::named("Float")],
    }
}

fn fn_ty() -> Type {
    Type::Function {
        params: vec![],
        result: Box::new(Type::Tuple(vec![])),
    }
}

fn def1(result: &str, ty: Type, operator: Operator) -> OperatorDef {
    OperatorDef::new(vec![(reg(result), ty)], operator)
}

fn function_ref(result: &str, name: &str) -> OperatorDef {
    def1(
        result,
        fn_ty(),
        Operator::FunctionRef {
            name: name.to_string(),
        },
    )
}

/// `sameShape(a, b) = a.shape == b.shape`
fn same_shape_function() -> Function {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("e") })
        .with_argument(reg("a"), tensor_ty())
        .with_argument(reg("b"), tensor_ty());
    block.push(function_ref("f", SHAPE_GETTER));
    block.push(def1(
        "sa",
        Type::named("TensorShape"),
        Operator::Apply {
            callee: reg("f"),
            args: vec![reg("a")],
        },
    ));
    block.push(def1(
        "sb",
        Type::named("TensorShape"),
        Operator::Apply {
            callee: reg("f"),
            args: vec![reg("b")],
        },
    ));
    block.push(function_ref("eq", SHAPE_EQUAL));
    block.push(def1(
        "e",
        Type::named("Bool"),
        Operator::Apply {
            callee: reg("eq"),
            args: vec![reg("sa"), reg("sb")],
        },
    ));
    Function::new("sameShape", Type::named("Bool"), vec![block])
}

/// `addBias(t, bias) = broadcast(t, bias)`
fn add_bias_function() -> Function {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("r") })
        .with_argument(reg("t"), tensor_ty())
        .with_argument(reg("bias"), tensor_ty());
    block.push(function_ref("f", "broadcast"));
    block.push(
        def1(
            "r",
            tensor_ty(),
            Operator::Apply {
                callee: reg("f"),
                args: vec![reg("t"), reg("bias")],
            },
        )
        .with_source(SourceLocation::new("model.swift", 7)),
    );
    Function::new("addBias", tensor_ty(), vec![block])
}

/// `main(x, y) = { assert(sameShape(x, y)); return addBias(x, y) }`
fn main_function() -> Function {
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("r") })
        .with_argument(reg("x"), tensor_ty())
        .with_argument(reg("y"), tensor_ty());
    block.push(function_ref("f1", "sameShape"));
    block.push(def1(
        "pa",
        fn_ty(),
        Operator::PartialApply {
            callee: reg("f1"),
            args: vec![reg("x"), reg("y")],
            arg_types: vec![tensor_ty(), tensor_ty()],
        },
    ));
    block.push(function_ref("fa", ASSERT_SYMBOL));
    block.push(
        def1(
            "r0",
            Type::Tuple(vec![]),
            Operator::Apply {
                callee: reg("fa"),
                args: vec![reg("pa")],
            },
        )
        .with_source(SourceLocation::new("model.swift", 3)),
    );
    block.push(function_ref("f2", "addBias"));
    block.push(
        def1(
            "r",
            tensor_ty(),
            Operator::Apply {
                callee: reg("f2"),
                args: vec![reg("x"), reg("y")],
            },
        )
        .with_source(SourceLocation::new("model.swift", 4)),
    );
    Function::new("main", tensor_ty(), vec![block])
}

#[test]
fn test_assert_survives_inlining_and_the_pipeline() {
    let functions = vec![same_shape_function(), add_bias_function(), main_function()];
    let mut sink = CollectedWarnings::new();
    let checked = check_module(
        &functions,
        &TypeEnvironment::new(),
        &AcyclicPreprocessor,
        &mut sink,
    );
    assert!(sink.is_empty(), "unexpected warnings: {:?}", sink.take());
    assert_eq!(checked.len(), 3);

    let main = checked
        .iter()
        .find(|c| c.function == "main")
        .expect("main checked");
    assert!(main.unsatisfiable.is_empty());

    // The user's assert collapses to a shape equality between the two
    // argument shapes and keeps the assert's source position.
    let x = ListExpr::Var(ListVar(0));
    let y = ListExpr::Var(ListVar(1));
    let ret = ListExpr::Var(ListVar(2));
    assert_eq!(
        main.constraints,
        vec![
            Constraint {
                expr: BoolExpr::list_eq(x.clone(), y.clone()),
                assuming: BoolExpr::True,
                origin: ConstraintOrigin::Asserted,
                stack: CallStack::root(Some(SourceLocation::new("model.swift", 3))),
            },
            Constraint {
                expr: BoolExpr::list_eq(ret, ListExpr::broadcast(x, y)),
                assuming: BoolExpr::True,
                origin: ConstraintOrigin::Implied,
                stack: CallStack::root(None)
                    .pushed(Some(SourceLocation::new("model.swift", 4))),
            },
        ]
    );
}

#[test]
fn test_check_module_is_deterministic() {
    let functions = vec![same_shape_function(), add_bias_function(), main_function()];
    let mut sink = CollectedWarnings::new();
    let first = check_module(
        &functions,
        &TypeEnvironment::new(),
        &AcyclicPreprocessor,
        &mut sink,
    );
    let second = check_module(
        &functions,
        &TypeEnvironment::new(),
        &AcyclicPreprocessor,
        &mut sink,
    );
    assert_eq!(first, second);
}

#[test]
fn test_incompatible_broadcast_is_surfaced() {
    // badStack() broadcasts [4, 5] against [4, 3].
    let mut block = Block::new("bb0", TerminatorDef::Return { operand: reg("r") });
    for (name, value) in [("c4", 4), ("c5", 5), ("d4", 4), ("d3", 3)] {
        block.push(def1(
            name,
            Type::named("Int"),
            Operator::IntegerLiteral {
                ty: Type::named("Int"),
                value,
            },
        ));
    }
    block.push(def1(
        "a1",
        Type::named("Array"),
        Operator::ArrayLiteral {
            element: Type::named("Int"),
            elements: vec![reg("c4"), reg("c5")],
        },
    ));
    block.push(def1(
        "a2",
        Type::named("Array"),
        Operator::ArrayLiteral {
            element: Type::named("Int"),
            elements: vec![reg("d4"), reg("d3")],
        },
    ));
    block.push(function_ref("ctor", SHAPE_CTOR));
    block.push(def1(
        "s1",
        Type::named("TensorShape"),
        Operator::Apply {
            callee: reg("ctor"),
            args: vec![reg("a1")],
        },
    ));
    block.push(def1(
        "s2",
        Type::named("TensorShape"),
        Operator::Apply {
            callee: reg("ctor"),
            args: vec![reg("a2")],
        },
    ));
    block.push(function_ref("bc", "broadcast"));
    block.push(
        def1(
            "r",
            tensor_ty(),
            Operator::Apply {
                callee: reg("bc"),
                args: vec![reg("s1"), reg("s2")],
            },
        )
        .with_source(SourceLocation::new("model.swift", 12)),
    );
    let function = Function::new("badStack", tensor_ty(), vec![block]);

    let mut sink = CollectedWarnings::new();
    let checked = check_module(
        &[function],
        &TypeEnvironment::new(),
        &AcyclicPreprocessor,
        &mut sink,
    );
    assert!(sink.is_empty());
    assert_eq!(checked.len(), 1);
    assert_eq!(checked[0].unsatisfiable.len(), 1);
    assert_eq!(
        checked[0].unsatisfiable[0].expr,
        BoolExpr::list_eq(
            ListExpr::Var(ListVar(0)),
            ListExpr::broadcast(
                ListExpr::Literal(vec![
                    Some(IntExpr::Literal(4)),
                    Some(IntExpr::Literal(5))
                ]),
                ListExpr::Literal(vec![
                    Some(IntExpr::Literal(4)),
                    Some(IntExpr::Literal(3))
                ]),
            ),
        )
    );
}
