//! Selector and sort expression compiler.
//!
//! CouchDB's `_find` endpoint takes a JSON selector in the Mango operator
//! language. Writing those objects by hand is noisy, so queries are written
//! as plain boolean expressions over document fields and compiled here:
//!
//! ```text
//! year >= 1989 && year <= 2006        {"$and":[{"year":{"$gte":1989}},
//!                                              {"year":{"$lte":2006}}]}
//! ```
//!
//! The pipeline is lex → parse → lower. Nothing is evaluated: identifiers
//! are field names, and the output is a `serde_json::Value`.
//!
//! # Operators
//!
//! | Expression | Mango |
//! |------------|-------|
//! | `f < v` `f <= v` `f == v` `f != v` `f >= v` `f > v` | `$lt` `$lte` `$eq` `$ne` `$gte` `$gt` |
//! | `a && b` / `a \|\| b` / `!a` | `$and` / `$or` / `$not` |
//! | `a.b.c` | the dotted field string `"a.b.c"` |
//! | `nil`, `true`, `false`, literals | JSON null/booleans/numbers/strings |
//! | `[]int{1, 2}` or `[1, 2]` | JSON array |
//!
//! # Meta functions
//!
//! `nor(exprs...)`, `all(field, array)`, `any(field, cond)`,
//! `exists(field, bool)`, `typeof(field, type)`, `in(field, array)`,
//! `nin(field, array)`, `size(field, n)`, `mod(field, divisor, remainder)`,
//! `regex(field, pattern)`; `asc(field)` / `desc(field)` in sort context.
//! Argument counts are checked and mismatches fail with a diagnostic.
//!
//! `any` compiles its condition as a standalone selector and then hoists the
//! field key out of every operand, so the field appears only once, on the
//! `$elemMatch` wrapper:
//!
//! ```
//! use couchdb_rs::selector::parse_selector;
//! use serde_json::json;
//!
//! let compiled = parse_selector(r#"any(genre, genre == "Horror" || genre == "Comedy")"#).unwrap();
//! assert_eq!(
//!     compiled,
//!     json!({"genre": {"$elemMatch": {"$or": [{"$eq": "Horror"}, {"$eq": "Comedy"}]}}})
//! );
//! ```
//!
//! # Injection safety
//!
//! The raw selector string must not contain `$`; compilation refuses such
//! input so user-supplied values cannot smuggle Mango operators in.

mod lexer;
mod parser;

use crate::error::{CouchError, Result};
use parser::{BinOp, Expr, Parser};
use serde_json::{json, Map, Value};

/// Compile a selector expression into its Mango JSON form.
pub fn parse_selector(selector: &str) -> Result<Value> {
    if selector.contains('$') {
        return Err(CouchError::Selector(format!(
            "no $s are allowed in selector: {selector}"
        )));
    }
    let expr = Parser::new(lexer::lex(selector)?).parse()?;
    lower(&expr)
}

/// Compile sort expressions into the Mango `sort` array, in input order.
///
/// Each entry is either a field chain (ascending by default) or an
/// `asc(field)` / `desc(field)` call.
pub fn parse_sort<S: AsRef<str>>(sorts: &[S]) -> Result<Value> {
    let mut entries = Vec::with_capacity(sorts.len());
    for sort in sorts {
        let expr = Parser::new(lexer::lex(sort.as_ref())?).parse()?;
        entries.push(lower(&expr)?);
    }
    Ok(Value::Array(entries))
}

fn lower(expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Nil => Ok(Value::Null),
        Expr::Bool(v) => Ok(Value::Bool(*v)),
        Expr::Int(v) => Ok(Value::from(*v)),
        Expr::Float(v) => Ok(Value::from(*v)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Field(path) => Ok(Value::String(path.clone())),
        Expr::Array(elements) => {
            let lowered: Result<Vec<Value>> = elements.iter().map(lower).collect();
            Ok(Value::Array(lowered?))
        }
        Expr::Not(operand) => Ok(json!({ "$not": lower(operand)? })),
        Expr::Binary { op, left, right } => lower_binary(*op, left, right),
        Expr::Call { name, args } => lower_call(name, args),
    }
}

fn lower_binary(op: BinOp, left: &Expr, right: &Expr) -> Result<Value> {
    match op {
        BinOp::And => Ok(json!({ "$and": [lower(left)?, lower(right)?] })),
        BinOp::Or => Ok(json!({ "$or": [lower(left)?, lower(right)?] })),
        BinOp::Lt | BinOp::Le | BinOp::Eq | BinOp::Ne | BinOp::Ge | BinOp::Gt => {
            let field = field_name(left)?;
            let operator = match op {
                BinOp::Lt => "$lt",
                BinOp::Le => "$lte",
                BinOp::Eq => "$eq",
                BinOp::Ne => "$ne",
                BinOp::Ge => "$gte",
                BinOp::Gt => "$gt",
                BinOp::And | BinOp::Or => unreachable!("handled above"),
            };
            Ok(json!({ field: { operator: lower(right)? } }))
        }
    }
}

fn lower_call(name: &str, args: &[Expr]) -> Result<Value> {
    match name {
        "nor" => {
            if args.is_empty() {
                return Err(CouchError::Selector(
                    "nor(exprs...) needs at least 1 argument, got 0".into(),
                ));
            }
            let lowered: Result<Vec<Value>> = args.iter().map(lower).collect();
            Ok(json!({ "$nor": lowered? }))
        }
        "all" => field_op_call("all", "$all", args),
        "in" => field_op_call("in", "$in", args),
        "nin" => field_op_call("nin", "$nin", args),
        "size" => field_op_call("size", "$size", args),
        "exists" => field_op_call("exists", "$exists", args),
        "typeof" => field_op_call("typeof", "$type", args),
        "regex" => field_op_call("regex", "$regex", args),
        "any" => {
            check_arity("any", "(field, condition)", 2, args)?;
            let field = field_name(&args[0])?;
            let condition = lower(&args[1])?;
            let hoisted = remove_field_key(&field, condition)?;
            Ok(json!({ field: { "$elemMatch": hoisted } }))
        }
        "mod" => {
            check_arity("mod", "(field, divisor, remainder)", 3, args)?;
            let field = field_name(&args[0])?;
            let divisor = integer_arg("mod", "divisor", &args[1])?;
            let remainder = integer_arg("mod", "remainder", &args[2])?;
            Ok(json!({ field: { "$mod": [divisor, remainder] } }))
        }
        "asc" => sort_call("asc", args),
        "desc" => sort_call("desc", args),
        other => Err(CouchError::Selector(format!(
            "function {other}() not supported"
        ))),
    }
}

/// The common `fn(field, value)` shape: `{field: {$op: value}}`.
fn field_op_call(name: &str, operator: &str, args: &[Expr]) -> Result<Value> {
    check_arity(name, "(field, value)", 2, args)?;
    let field = field_name(&args[0])?;
    Ok(json!({ field: { operator: lower(&args[1])? } }))
}

fn sort_call(direction: &str, args: &[Expr]) -> Result<Value> {
    if args.len() != 1 {
        return Err(CouchError::Selector(format!(
            "{direction}(field) needs 1 argument, got {}",
            args.len()
        )));
    }
    let field = field_name(&args[0])?;
    Ok(json!({ field: direction }))
}

fn check_arity(name: &str, signature: &str, want: usize, args: &[Expr]) -> Result<()> {
    if args.len() != want {
        return Err(CouchError::Selector(format!(
            "{name}{signature} needs {want} arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

fn field_name(expr: &Expr) -> Result<String> {
    match lower(expr)? {
        Value::String(name) => Ok(name),
        other => Err(CouchError::Selector(format!(
            "invalid field expression {other}"
        ))),
    }
}

fn integer_arg(name: &str, what: &str, expr: &Expr) -> Result<i64> {
    match lower(expr)? {
        Value::Number(n) if n.as_i64().is_some() => Ok(n.as_i64().unwrap_or_default()),
        other => Err(CouchError::Selector(format!(
            "{name}(): {what} must be an integer, got {other}"
        ))),
    }
}

/// Hoist `field` out of a compiled condition: every single-key object layer
/// `{field: X}` is replaced by `X` at the same depth, so `field` only names
/// the array once, on the outer `$elemMatch`. Non-object array elements
/// (e.g. the argument list of a nested `$in`) are kept as-is.
fn remove_field_key(field: &str, value: Value) -> Result<Value> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(CouchError::Selector(format!(
                "any(): condition on {field} must compile to an object, got {other}"
            )))
        }
    };
    let mut out = Map::new();
    for (key, val) in map {
        match val {
            Value::Array(items) => {
                let mut hoisted = Vec::with_capacity(items.len());
                for item in items {
                    if item.is_object() {
                        hoisted.push(remove_field_key(field, item)?);
                    } else {
                        hoisted.push(item);
                    }
                }
                out.insert(key, Value::Array(hoisted));
            }
            Value::Object(inner) => {
                if key == field {
                    if inner.len() != 1 {
                        return Err(CouchError::Selector(format!(
                            "any(): condition layer for {field} has {} operators, expected 1",
                            inner.len()
                        )));
                    }
                    for (inner_key, inner_val) in inner {
                        out.insert(inner_key, inner_val);
                    }
                } else {
                    out.insert(key, remove_field_key(field, Value::Object(inner))?);
                }
            }
            scalar => {
                out.insert(key, scalar);
            }
        }
    }
    Ok(Value::Object(out))
}
