//! Builtin symbol table.
//!
//! Compatibility with the source language's standard library is by mangled
//! symbol name. Anything not in this table is treated as an opaque call.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Builtin operations the interpreter understands symbolically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    IntEqual,
    IntGreater,
    IntGreaterEqual,
    IntLess,
    IntLessEqual,
    IntAdd,
    IntSub,
    IntMul,
    IntDiv,
    /// `Int` constructor from a builtin integer literal.
    IntLiteralInit,
    Assert,
    /// `TensorShape` constructor from an `[Int]` array literal.
    ShapeFromArray,
    /// `.shape` getter on a tensor.
    TensorShapeGetter,
    /// `shape[k]` subscript getter.
    ShapeSubscript,
    /// `.rank` getter on a tensor.
    TensorRankGetter,
    ShapeEqual,
    Broadcast,
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    HashMap::from([
        ("$sSi2eeoiySbSi_SitFZ", Builtin::IntEqual),
        ("$sSi1goiySbSi_SitFZ", Builtin::IntGreater),
        ("$sSi2geoiySbSi_SitFZ", Builtin::IntGreaterEqual),
        ("$sSi1loiySbSi_SitFZ", Builtin::IntLess),
        ("$sSi2leoiySbSi_SitFZ", Builtin::IntLessEqual),
        ("$sSi1poiyS2i_SitFZ", Builtin::IntAdd),
        ("$sSi1soiyS2i_SitFZ", Builtin::IntSub),
        ("$sSi1moiyS2i_SitFZ", Builtin::IntMul),
        ("$sSi1doiyS2i_SitFZ", Builtin::IntDiv),
        (
            "$sSi22_builtinIntegerLiteralSiBI_tcfC",
            Builtin::IntLiteralInit,
        ),
        (
            "$ss6assert__4file4lineySbyXK_SSyXKs12StaticStringVSutF",
            Builtin::Assert,
        ),
        (
            "$s10TensorFlow0A5ShapeV12arrayLiteralACSid_tcfC",
            Builtin::ShapeFromArray,
        ),
        (
            "$s10TensorFlow0A0V5shapeAA0A5ShapeVvg",
            Builtin::TensorShapeGetter,
        ),
        ("$s10TensorFlow0A5ShapeVyS2icir", Builtin::ShapeSubscript),
        ("$s10TensorFlow0A0V4rankSivg", Builtin::TensorRankGetter),
        (
            "$s10TensorFlow0A5ShapeV2eeoiySbAC_ACtFZ",
            Builtin::ShapeEqual,
        ),
        ("broadcast", Builtin::Broadcast),
    ])
});

/// Look a callee symbol up in the builtin table.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

/// Mangling suffix of an `Int`-typed global property symbol. A `load` from
/// such an address produces an opaque integer keyed by the load site.
pub const INT_GLOBAL_SUFFIX: &str = "Sivp";
