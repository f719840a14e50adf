//! Abstract interpretation engine.
//!
//! Walks one function's unlooped CFG in topological order, tracking a
//! symbolic value per register and a path-condition set per block, and emits
//! the function's constraint summary.
//!
//! Structural inconsistencies in the input IR (arity mismatches on operators
//! the engine claims to understand, sort-confused equations) are programmer
//! errors and panic; everything recoverable goes through the warning sink
//! and aborts only the current function.

use super::builtins::{self, Builtin, INT_GLOBAL_SUFFIX};
use super::cfg::{topological_order, CfgPreprocessor};
use super::value::AbstractValue;
use crate::constraints::{
    BoolExpr, ConstraintOrigin, Expr, FunctionSummary, IntExpr, ListExpr, RawConstraint, VarSupply,
};
use crate::diagnostics::{Warning, WarningSink};
use crate::ir::{
    Block, Function, Operator, OperatorDef, Register, TerminatorDef, Type, TypeEnvironment,
};
use crate::loc::SourceLocation;
use std::collections::{HashMap, HashSet};

#[cfg(test)]
mod tests;

/// Abstract a function into its constraint summary.
///
/// Returns `None` (after reporting through `sink`) when the function cannot
/// be abstracted: non-reducible CFG, unknown terminator, or an `assert`
/// whose condition does not resolve to a function reference.
pub fn summarize(
    function: &Function,
    types: &TypeEnvironment,
    preprocessor: &dyn CfgPreprocessor,
    sink: &mut dyn WarningSink,
) -> Option<FunctionSummary> {
    if !preprocessor.induces_reducible_cfg(&function.blocks) {
        sink.warn(Warning::new(format!(
            "cannot analyze {}: control flow is not reducible",
            function.name
        )));
        return None;
    }
    let blocks = preprocessor.unloop(&function.blocks);
    let Some(order) = topological_order(&blocks) else {
        sink.warn(Warning::new(format!(
            "cannot analyze {}: unlooped control flow still has a cycle",
            function.name
        )));
        return None;
    };
    if blocks.is_empty() {
        sink.warn(Warning::new(format!(
            "cannot analyze {}: function has no blocks",
            function.name
        )));
        return None;
    }

    let interpreter = Interpreter::new(function, types);
    match interpreter.run(&blocks, &order) {
        Ok(summary) => Some(summary),
        Err(abort) => {
            sink.warn(abort.into_warning(&function.name));
            None
        }
    }
}

/// Recoverable per-function failure.
#[derive(Debug)]
struct Abort {
    message: String,
    location: Option<SourceLocation>,
}

impl Abort {
    fn new(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    fn into_warning(self, function: &str) -> Warning {
        let warning = Warning::new(format!("cannot analyze {}: {}", function, self.message));
        match self.location {
            Some(loc) => warning.with_location(loc),
            None => warning,
        }
    }
}

struct Interpreter<'a> {
    function_name: &'a str,
    types: &'a TypeEnvironment,
    return_type: &'a Type,
    supply: VarSupply,
    valuation: HashMap<Register, AbstractValue>,
    register_types: HashMap<Register, Type>,
    constraints: Vec<RawConstraint>,
    path_conditions: HashMap<String, HashSet<BoolExpr>>,
    ret_expr: Option<Expr>,
}

impl<'a> Interpreter<'a> {
    fn new(function: &'a Function, types: &'a TypeEnvironment) -> Self {
        Self {
            function_name: &function.name,
            types,
            return_type: &function.return_type,
            supply: VarSupply::new(),
            valuation: HashMap::new(),
            register_types: HashMap::new(),
            constraints: Vec::new(),
            path_conditions: HashMap::new(),
            ret_expr: None,
        }
    }

    fn run(mut self, blocks: &[Block], order: &[usize]) -> Result<FunctionSummary, Abort> {
        // Fresh values for every block argument (entry arguments are the
        // function arguments), then for the return slot.
        for block in blocks {
            for (register, ty) in &block.arguments {
                self.register_types.insert(register.clone(), ty.clone());
                if let Some(value) = AbstractValue::fresh(ty, self.types, &mut self.supply) {
                    self.valuation.insert(register.clone(), value);
                }
            }
        }
        let entry = &blocks[0];
        let arg_exprs: Vec<Option<Expr>> = entry
            .arguments
            .iter()
            .map(|(register, _)| {
                self.valuation
                    .get(register)
                    .and_then(AbstractValue::to_expr)
            })
            .collect();
        self.ret_expr = AbstractValue::fresh(self.return_type, self.types, &mut self.supply)
            .and_then(|value| value.to_expr());

        let by_label: HashMap<&str, &Block> = blocks
            .iter()
            .map(|block| (block.label.as_str(), block))
            .collect();
        self.path_conditions
            .entry(entry.label.clone())
            .or_default()
            .insert(BoolExpr::True);

        for &index in order {
            let block = &blocks[index];
            if !self.path_conditions.contains_key(&block.label) {
                // Not reachable from the entry block.
                continue;
            }
            let pc = self.effective_path_condition(&block.label);
            for def in &block.operators {
                self.record_result_types(def);
                self.interpret_operator(def, &pc)?;
            }
            self.interpret_terminator(block, &pc, &by_label)?;
        }

        Ok(FunctionSummary {
            arg_exprs,
            ret_expr: self.ret_expr,
            constraints: self.constraints,
        })
    }

    /// Deterministic disjunction of a block's recorded path conditions:
    /// disjuncts are sorted by textual form before folding.
    fn effective_path_condition(&self, label: &str) -> BoolExpr {
        let mut disjuncts: Vec<BoolExpr> = self.path_conditions[label].iter().cloned().collect();
        disjuncts.sort_by_cached_key(|condition| condition.to_string());
        BoolExpr::disjunction(disjuncts)
    }

    fn add_path_condition(&mut self, label: &str, condition: BoolExpr) {
        self.path_conditions
            .entry(label.to_string())
            .or_default()
            .insert(condition);
    }

    fn record_result_types(&mut self, def: &OperatorDef) {
        for (register, ty) in &def.results {
            self.register_types.insert(register.clone(), ty.clone());
        }
    }

    fn value(&self, register: &Register) -> Option<&AbstractValue> {
        self.valuation.get(register)
    }

    /// Get-or-fresh: an untracked register with a declared type is
    /// materialized as a fresh value on first use.
    fn value_or_fresh(&mut self, register: &Register) -> Option<AbstractValue> {
        if let Some(value) = self.valuation.get(register) {
            return Some(value.clone());
        }
        let ty = self.register_types.get(register)?.clone();
        let fresh = AbstractValue::fresh(&ty, self.types, &mut self.supply)?;
        self.valuation.insert(register.clone(), fresh.clone());
        Some(fresh)
    }

    fn int_operand(&mut self, register: &Register) -> Option<IntExpr> {
        self.value_or_fresh(register)?.as_int().cloned()
    }

    fn bind_single(&mut self, def: &OperatorDef, value: AbstractValue) {
        match def.results.as_slice() {
            [(register, _)] => {
                self.valuation.insert(register.clone(), value);
            }
            results => panic!(
                "{}: operator {:?} must have exactly one result, has {}",
                self.function_name,
                def.operator,
                results.len()
            ),
        }
    }

    fn push_implied(&mut self, expr: BoolExpr, assuming: &BoolExpr) {
        self.constraints.push(RawConstraint::Expr {
            expr,
            assuming: assuming.clone(),
            origin: ConstraintOrigin::Implied,
            location: None,
        });
    }

    /// Equate two boundary expressions under `assuming`.
    ///
    /// # Panics
    ///
    /// Panics on sort mismatches and tuple-arity mismatches; both indicate
    /// an inconsistent input IR.
    fn equate(&mut self, a: &Expr, b: &Expr, assuming: &BoolExpr) {
        match (a, b) {
            (Expr::Int(x), Expr::Int(y)) => {
                self.push_implied(BoolExpr::int_eq(x.clone(), y.clone()), assuming);
            }
            (Expr::List(x), Expr::List(y)) => {
                self.push_implied(BoolExpr::list_eq(x.clone(), y.clone()), assuming);
            }
            (Expr::Bool(x), Expr::Bool(y)) => {
                self.push_implied(BoolExpr::bool_eq(x.clone(), y.clone()), assuming);
            }
            (Expr::Tuple(xs), Expr::Tuple(ys)) => {
                if xs.len() != ys.len() {
                    panic!(
                        "{}: cannot equate tuples of different arity: {} vs {}",
                        self.function_name, a, b
                    );
                }
                for (x, y) in xs.iter().zip(ys) {
                    if let (Some(x), Some(y)) = (x, y) {
                        self.equate(x, y, assuming);
                    }
                }
            }
            _ => panic!(
                "{}: cannot equate expressions of different sorts: {} vs {}",
                self.function_name, a, b
            ),
        }
    }

    fn interpret_operator(&mut self, def: &OperatorDef, pc: &BoolExpr) -> Result<(), Abort> {
        match &def.operator {
            // Ownership no-ops: the result shares the operand's value, so
            // later constraints about the copy hit the original.
            Operator::BeginBorrow { operand }
            | Operator::CopyValue { operand }
            | Operator::ConvertFunction { operand }
            | Operator::ConvertEscapeToNoescape { operand }
            | Operator::ThinToThickFunction { operand }
            | Operator::MarkDependence { operand, .. } => {
                if let Some(value) = self.value_or_fresh(operand) {
                    self.bind_single(def, value);
                }
            }
            Operator::IntegerLiteral { value, .. } => {
                self.bind_single(def, AbstractValue::Int(IntExpr::Literal(*value)));
            }
            Operator::ArrayLiteral { element, elements } => {
                if matches!(element.simplified(), Type::Named(name) if name == "Int") {
                    let dims: Vec<Option<IntExpr>> = elements
                        .iter()
                        .map(|register| self.int_operand(register))
                        .collect();
                    self.bind_single(def, AbstractValue::List(ListExpr::Literal(dims)));
                }
            }
            Operator::LiteralEqual { lhs, rhs } => {
                if let (Some(a), Some(b)) = (self.int_operand(lhs), self.int_operand(rhs)) {
                    self.bind_single(def, AbstractValue::Bool(BoolExpr::int_eq(a, b)));
                }
            }
            Operator::FunctionRef { name } => {
                self.bind_single(def, AbstractValue::Function { name: name.clone() });
            }
            Operator::PartialApply {
                callee,
                args,
                arg_types,
            } => {
                let arg_values: Vec<Option<AbstractValue>> =
                    args.iter().map(|r| self.value_or_fresh(r)).collect();
                if let Some(callee_value) = self.value(callee).cloned() {
                    self.bind_single(
                        def,
                        AbstractValue::PartialApplication {
                            callee: Box::new(callee_value),
                            args: arg_values,
                            arg_types: arg_types.clone(),
                        },
                    );
                }
            }
            Operator::Struct { operands, .. } | Operator::Tuple { operands } => {
                let items: Vec<Option<AbstractValue>> =
                    operands.iter().map(|r| self.value_or_fresh(r)).collect();
                self.bind_single(def, AbstractValue::Tuple(items));
            }
            Operator::DestructureTuple { operand } => match self.value_or_fresh(operand) {
                Some(AbstractValue::Tuple(items)) => {
                    if items.len() != def.results.len() {
                        panic!(
                            "{}: destructureTuple yields {} results for {} elements",
                            self.function_name,
                            def.results.len(),
                            items.len()
                        );
                    }
                    for ((register, _), item) in def.results.iter().zip(items) {
                        if let Some(value) = item {
                            self.valuation.insert(register.clone(), value);
                        }
                    }
                }
                Some(other) => panic!(
                    "{}: destructureTuple of a non-tuple value {:?}",
                    self.function_name, other
                ),
                None => {}
            },
            Operator::StructExtract { operand, ty, field } => {
                if let Some(index) = self.types.field_index(ty, field) {
                    self.extract_element(def, operand, index, "structExtract");
                }
            }
            Operator::TupleExtract { operand, index } => {
                self.extract_element(def, operand, *index, "tupleExtract");
            }
            Operator::GlobalAddr { name } => {
                self.bind_single(
                    def,
                    AbstractValue::GlobalAddress {
                        symbol: name.clone(),
                    },
                );
            }
            Operator::Load { operand } => {
                // A load from an `Int` global is an opaque integer keyed by
                // the load site; without debug info there is no key and the
                // result stays untracked.
                let int_global = matches!(
                    self.value(operand),
                    Some(AbstractValue::GlobalAddress { symbol }) if symbol.ends_with(INT_GLOBAL_SUFFIX)
                );
                if int_global {
                    if let Some(location) = def.source.clone() {
                        self.bind_single(def, AbstractValue::Int(IntExpr::Hole(location)));
                    }
                }
            }
            Operator::Apply { callee, args } | Operator::BeginApply { callee, args } => {
                self.interpret_call(def, callee, args, pc)?;
            }
            Operator::EndApply { .. } => {}
            Operator::Unknown { .. } => {}
        }
        Ok(())
    }

    fn extract_element(&mut self, def: &OperatorDef, operand: &Register, index: usize, what: &str) {
        match self.value_or_fresh(operand) {
            Some(AbstractValue::Tuple(items)) => {
                if index >= items.len() {
                    panic!(
                        "{}: {} index {} out of bounds for {} elements",
                        self.function_name,
                        what,
                        index,
                        items.len()
                    );
                }
                if let Some(value) = items.into_iter().nth(index).flatten() {
                    self.bind_single(def, value);
                }
            }
            Some(other) => panic!(
                "{}: {} of a non-aggregate value {:?}",
                self.function_name, what, other
            ),
            None => {}
        }
    }

    fn interpret_call(
        &mut self,
        def: &OperatorDef,
        callee: &Register,
        args: &[Register],
        pc: &BoolExpr,
    ) -> Result<(), Abort> {
        let arg_values: Vec<Option<AbstractValue>> =
            args.iter().map(|r| self.value_or_fresh(r)).collect();
        let Some(callee_value) = self.value(callee).cloned() else {
            return Ok(());
        };
        let Some((name, full_args)) = resolve_callee(&callee_value, arg_values) else {
            return Ok(());
        };

        if let Some(builtin) = builtins::lookup(&name) {
            return self.interpret_builtin(def, builtin, &full_args, pc);
        }

        // Opaque call: bind a fresh result and leave a call-form constraint
        // for summary inlining to expand.
        let result = self.fresh_call_result(def);
        self.constraints.push(RawConstraint::Call {
            callee: name,
            args: full_args
                .iter()
                .map(|arg| arg.as_ref().and_then(AbstractValue::to_expr))
                .collect(),
            result,
            assuming: pc.clone(),
            location: def.source.clone(),
        });
        Ok(())
    }

    /// Fresh values for a call's result registers; coroutine yields become a
    /// tuple at the call boundary.
    fn fresh_call_result(&mut self, def: &OperatorDef) -> Option<Expr> {
        match def.results.as_slice() {
            [] => None,
            [(register, ty)] => {
                let value = AbstractValue::fresh(ty, self.types, &mut self.supply)?;
                let expr = value.to_expr();
                self.valuation.insert(register.clone(), value);
                expr
            }
            results => {
                let results = results.to_vec();
                let mut exprs = Vec::with_capacity(results.len());
                for (register, ty) in results {
                    match AbstractValue::fresh(&ty, self.types, &mut self.supply) {
                        Some(value) => {
                            exprs.push(value.to_expr());
                            self.valuation.insert(register, value);
                        }
                        None => exprs.push(None),
                    }
                }
                Some(Expr::Tuple(exprs))
            }
        }
    }

    fn interpret_builtin(
        &mut self,
        def: &OperatorDef,
        builtin: Builtin,
        args: &[Option<AbstractValue>],
        pc: &BoolExpr,
    ) -> Result<(), Abort> {
        match builtin {
            Builtin::IntEqual
            | Builtin::IntGreater
            | Builtin::IntGreaterEqual
            | Builtin::IntLess
            | Builtin::IntLessEqual => {
                if let Some((a, b)) = two_int_args(args) {
                    let expr = match builtin {
                        Builtin::IntEqual => BoolExpr::int_eq(a, b),
                        Builtin::IntGreater => BoolExpr::int_gt(a, b),
                        Builtin::IntGreaterEqual => BoolExpr::int_ge(a, b),
                        Builtin::IntLess => BoolExpr::int_lt(a, b),
                        _ => BoolExpr::int_le(a, b),
                    };
                    self.bind_single(def, AbstractValue::Bool(expr));
                }
            }
            Builtin::IntAdd | Builtin::IntSub | Builtin::IntMul | Builtin::IntDiv => {
                if let Some((a, b)) = two_int_args(args) {
                    let expr = match builtin {
                        Builtin::IntAdd => IntExpr::add(a, b),
                        Builtin::IntSub => IntExpr::sub(a, b),
                        Builtin::IntMul => IntExpr::mul(a, b),
                        _ => IntExpr::div(a, b),
                    };
                    self.bind_single(def, AbstractValue::Int(expr));
                }
            }
            Builtin::IntLiteralInit => {
                if let Some(value) = int_arg(args, 0) {
                    self.bind_single(def, AbstractValue::Int(value));
                }
            }
            Builtin::Assert => return self.interpret_assert(def, args, pc),
            Builtin::ShapeFromArray | Builtin::TensorShapeGetter => {
                if let Some(shape) = shape_arg(args, 0) {
                    self.bind_single(def, AbstractValue::List(shape));
                }
            }
            Builtin::ShapeSubscript => {
                // The subscript getter receives the index before the shape.
                if let (Some(IntExpr::Literal(k)), Some(shape)) =
                    (int_arg(args, 0), shape_arg(args, 1))
                {
                    self.bind_single(def, AbstractValue::Int(IntExpr::element(k, shape)));
                }
            }
            Builtin::TensorRankGetter => {
                if let Some(shape) = shape_arg(args, 0) {
                    self.bind_single(def, AbstractValue::Int(IntExpr::length(shape)));
                }
            }
            Builtin::ShapeEqual => {
                if let (Some(a), Some(b)) = (shape_arg(args, 0), shape_arg(args, 1)) {
                    self.bind_single(def, AbstractValue::Bool(BoolExpr::list_eq(a, b)));
                }
            }
            Builtin::Broadcast => {
                if let (Some(a), Some(b)) = (shape_arg(args, 0), shape_arg(args, 1)) {
                    self.bind_single(
                        def,
                        AbstractValue::Tensor {
                            shape: ListExpr::broadcast(a, b),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// `assert(cond, ...)`: `cond` must resolve to a function reference. We
    /// bind a fresh boolean to that function's result through a call-form
    /// constraint and assert the boolean under the current path condition.
    fn interpret_assert(
        &mut self,
        def: &OperatorDef,
        args: &[Option<AbstractValue>],
        pc: &BoolExpr,
    ) -> Result<(), Abort> {
        let condition = args.first().and_then(Option::as_ref);
        let resolved = condition.and_then(|value| resolve_callee(value, Vec::new()));
        let Some((name, cond_args)) = resolved else {
            return Err(Abort::new(
                "assert condition does not resolve to a function reference",
                def.source.clone(),
            ));
        };

        let flag = BoolExpr::Var(self.supply.fresh_bool());
        self.constraints.push(RawConstraint::Call {
            callee: name,
            args: cond_args
                .iter()
                .map(|arg| arg.as_ref().and_then(AbstractValue::to_expr))
                .collect(),
            result: Some(Expr::Bool(flag.clone())),
            assuming: pc.clone(),
            location: def.source.clone(),
        });
        self.constraints.push(RawConstraint::Expr {
            expr: flag,
            assuming: pc.clone(),
            origin: ConstraintOrigin::Asserted,
            location: def.source.clone(),
        });
        Ok(())
    }

    fn interpret_terminator(
        &mut self,
        block: &Block,
        pc: &BoolExpr,
        by_label: &HashMap<&str, &Block>,
    ) -> Result<(), Abort> {
        match &block.terminator {
            TerminatorDef::Branch { target, operands } => {
                self.flow_into(by_label[target.as_str()], operands, pc.clone());
            }
            TerminatorDef::CondBranch {
                condition,
                true_target,
                true_operands,
                false_target,
                false_operands,
            } => {
                let cond = match self
                    .value_or_fresh(condition)
                    .as_ref()
                    .and_then(|value| value.as_bool().cloned())
                {
                    Some(cond) => cond,
                    None => BoolExpr::Var(self.supply.fresh_bool()),
                };
                let pc_true = BoolExpr::conjunction([pc.clone(), cond.clone()]);
                let pc_false = BoolExpr::conjunction([pc.clone(), cond.negated()]);
                self.flow_into(by_label[true_target.as_str()], true_operands, pc_true);
                self.flow_into(by_label[false_target.as_str()], false_operands, pc_false);
            }
            TerminatorDef::Return { operand } => {
                let operand_expr = self
                    .value_or_fresh(operand)
                    .and_then(|value| value.to_expr());
                if let (Some(ret), Some(operand_expr)) = (self.ret_expr.clone(), operand_expr) {
                    self.equate(&ret, &operand_expr, pc);
                }
            }
            TerminatorDef::SwitchEnum {
                targets, default, ..
            } => {
                // Each case is guarded by an otherwise unconstrained fresh
                // boolean; enum payloads carry no data flow.
                let labels = targets
                    .iter()
                    .map(|(_, label)| label.clone())
                    .chain(default.iter().cloned());
                for label in labels {
                    let guard = BoolExpr::conjunction([
                        pc.clone(),
                        BoolExpr::Var(self.supply.fresh_bool()),
                    ]);
                    self.add_path_condition(&label, guard);
                }
            }
            TerminatorDef::Unreachable => {}
            TerminatorDef::Unknown { name } => {
                return Err(Abort::new(format!("unsupported terminator {}", name), None));
            }
        }
        Ok(())
    }

    /// Propagate the path condition along one edge and equate the target's
    /// block arguments with the passed operands under it.
    fn flow_into(&mut self, target: &Block, operands: &[Register], pc: BoolExpr) {
        if target.arguments.len() != operands.len() {
            panic!(
                "{}: branch to {} passes {} operands for {} block arguments",
                self.function_name,
                target.label,
                operands.len(),
                target.arguments.len()
            );
        }
        for ((argument, _), operand) in target.arguments.iter().zip(operands) {
            let argument_expr = self
                .valuation
                .get(argument)
                .and_then(AbstractValue::to_expr);
            let operand_expr = self
                .value_or_fresh(operand)
                .and_then(|value| value.to_expr());
            if let (Some(a), Some(b)) = (argument_expr, operand_expr) {
                self.equate(&a, &b, &pc);
            }
        }
        self.add_path_condition(&target.label, pc);
    }
}

/// Chase partial-application chains down to a named function, accumulating
/// partially applied arguments after the call arguments.
fn resolve_callee(
    value: &AbstractValue,
    mut args: Vec<Option<AbstractValue>>,
) -> Option<(String, Vec<Option<AbstractValue>>)> {
    let mut current = value;
    loop {
        match current {
            AbstractValue::Function { name } => return Some((name.clone(), args)),
            AbstractValue::PartialApplication {
                callee,
                args: partial,
                ..
            } => {
                args.extend(partial.iter().cloned());
                current = callee;
            }
            _ => return None,
        }
    }
}

fn int_arg(args: &[Option<AbstractValue>], index: usize) -> Option<IntExpr> {
    args.get(index)?.as_ref()?.as_int().cloned()
}

fn shape_arg(args: &[Option<AbstractValue>], index: usize) -> Option<ListExpr> {
    args.get(index)?.as_ref()?.as_shape().cloned()
}

/// The first two integer arguments; the trailing metatype argument the
/// static operators receive is ignored.
fn two_int_args(args: &[Option<AbstractValue>]) -> Option<(IntExpr, IntExpr)> {
    Some((int_arg(args, 0)?, int_arg(args, 1)?))
}
