//! Per-node compilation into closure thunks.

use crate::{CompileCtx, CompileError, EvalContext, EvalError, Thunk};
use mathex_builtins::{format_number, is_unit_name, Matrix, Unit, UserFunction, Value};
use mathex_parser::{ConstantKind, Node};
use mathex_runtime::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

fn thunk<F>(f: F) -> Thunk
where
    F: Fn(&mut EvalContext) -> Result<Value, EvalError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn compile_all(nodes: &[Node], cctx: &CompileCtx) -> Result<Vec<Thunk>, CompileError> {
    nodes.iter().map(|n| compile_node(n, cctx)).collect()
}

fn eval_all(thunks: &[Thunk], ctx: &mut EvalContext) -> Result<Vec<Value>, EvalError> {
    let mut vals = Vec::with_capacity(thunks.len());
    for t in thunks {
        vals.push(t(ctx)?);
    }
    Ok(vals)
}

pub(crate) fn compile_node(node: &Node, cctx: &CompileCtx) -> Result<Thunk, CompileError> {
    match node {
        Node::Constant { value, kind } => {
            // literals are materialized here, not in the parser
            let value = match kind {
                ConstantKind::Number => Value::from_literal(value).map_err(CompileError::new)?,
                ConstantKind::String => Value::Str(value.clone()),
                ConstantKind::Boolean => Value::Bool(value == "true"),
                ConstantKind::Null | ConstantKind::Undefined => Value::Null,
            };
            Ok(thunk(move |_| Ok(value.clone())))
        }

        Node::Symbol { name } => {
            if name == "end" && cctx.allow_end {
                return Ok(thunk(|ctx| {
                    let extent = ctx.end_stack.last().copied().ok_or_else(|| {
                        EvalError::Index(
                            "The end symbol may only be used inside an index".to_string(),
                        )
                    })?;
                    Ok(Value::Num(extent as f64))
                }));
            }
            let name = name.clone();
            Ok(thunk(move |ctx| resolve_symbol(ctx, &name)))
        }

        Node::Operator { func, args, .. } => {
            let arg_thunks = compile_all(args, cctx)?;
            let f = cctx
                .namespace
                .function(func)
                .ok_or_else(|| CompileError::new(format!("Undefined function {func}")))?;
            Ok(thunk(move |ctx| {
                let vals = eval_all(&arg_thunks, ctx)?;
                f.call(&vals).map_err(|e| EvalError::Function(e.to_string()))
            }))
        }

        Node::Function { callee, args } => compile_call(callee, args, cctx),

        Node::Assignment { object, index, value } => {
            let (root, mut path) = assignment_path(object, cctx)?;
            if let Some(ix) = index {
                path.push(path_segment(ix, cctx)?);
            }
            let value_t = compile_node(value, cctx)?;
            Ok(thunk(move |ctx| {
                let v = value_t(ctx)?;
                if path.is_empty() {
                    ctx.assign(&root, v.clone())?;
                    return Ok(v);
                }
                let current = ctx
                    .lookup_local(&root)
                    .ok_or_else(|| EvalError::UndefinedSymbol(root.clone()))?;
                let updated = set_path(ctx, current, &path, v.clone())?;
                ctx.assign(&root, updated)?;
                Ok(v)
            }))
        }

        Node::FunctionAssignment { name, params, body } => {
            // compile the body now so definition errors surface immediately;
            // calls recompile against the caller's namespace
            let body_ctx = CompileCtx {
                namespace: cctx.namespace.clone(),
                params: params.iter().cloned().collect(),
                allow_end: false,
            };
            compile_node(body, &body_ctx)?;
            let func = Arc::new(UserFunction {
                name: name.clone(),
                params: params.clone(),
                body: (**body).clone(),
            });
            Ok(thunk(move |ctx| {
                let v = Value::Function(func.clone());
                ctx.assign(&func.name, v.clone())?;
                Ok(v)
            }))
        }

        Node::Conditional { condition, if_true, if_false } => {
            let c = compile_node(condition, cctx)?;
            let t = compile_node(if_true, cctx)?;
            let f = compile_node(if_false, cctx)?;
            Ok(thunk(move |ctx| {
                if truthy(&c(ctx)?)? {
                    t(ctx)
                } else {
                    f(ctx)
                }
            }))
        }

        Node::Range { start, end, step } => {
            let start_t = compile_node(start, cctx)?;
            let end_t = compile_node(end, cctx)?;
            let step_t = match step {
                Some(s) => Some(compile_node(s, cctx)?),
                None => None,
            };
            Ok(thunk(move |ctx| {
                let start = range_bound(&start_t(ctx)?)?;
                let step = match &step_t {
                    Some(t) => range_bound(&t(ctx)?)?,
                    None => 1.0,
                };
                let end = range_bound(&end_t(ctx)?)?;
                if step == 0.0 {
                    return Err(EvalError::Type("Range step must not be zero".to_string()));
                }
                let mut data = Vec::new();
                let mut x = start;
                if step > 0.0 {
                    while x <= end {
                        data.push(Value::Num(x));
                        x += step;
                    }
                } else {
                    while x >= end {
                        data.push(Value::Num(x));
                        x += step;
                    }
                }
                let shape = vec![data.len()];
                Matrix::new(data, shape)
                    .map(Value::Matrix)
                    .map_err(EvalError::Index)
            }))
        }

        Node::Accessor { object, index } => {
            let obj_t = compile_node(object, cctx)?;
            match index.as_ref() {
                Node::Index { dimensions, dot_notation: true } => {
                    let key = dot_key(dimensions)?;
                    Ok(thunk(move |ctx| get_property(&obj_t(ctx)?, &key)))
                }
                Node::Index { dimensions, dot_notation: false } => {
                    let dim_ctx = CompileCtx { allow_end: true, ..cctx.clone() };
                    let dims = compile_all(dimensions, &dim_ctx)?;
                    Ok(thunk(move |ctx| {
                        let obj = obj_t(ctx)?;
                        apply_index(ctx, obj, &dims)
                    }))
                }
                _ => Err(CompileError::new("Expected an index node")),
            }
        }

        Node::Index { .. } => Err(CompileError::new("Unexpected index")),

        Node::Array { items } => {
            let is_rows = !items.is_empty()
                && items.iter().all(|i| matches!(i, Node::Array { .. }));
            if is_rows {
                let mut rows = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Node::Array { items: row } => rows.push(compile_all(row, cctx)?),
                        _ => unreachable!(),
                    }
                }
                Ok(thunk(move |ctx| {
                    let mut out = Vec::with_capacity(rows.len());
                    for row in &rows {
                        out.push(eval_all(row, ctx)?);
                    }
                    Matrix::from_rows(out)
                        .map(Value::Matrix)
                        .map_err(EvalError::Index)
                }))
            } else {
                let item_thunks = compile_all(items, cctx)?;
                Ok(thunk(move |ctx| {
                    let vals = eval_all(&item_thunks, ctx)?;
                    let shape = vec![vals.len()];
                    Matrix::new(vals, shape)
                        .map(Value::Matrix)
                        .map_err(EvalError::Index)
                }))
            }
        }

        Node::Object { properties } => {
            let mut props = Vec::with_capacity(properties.len());
            for (key, value) in properties {
                props.push((key.clone(), compile_node(value, cctx)?));
            }
            Ok(thunk(move |ctx| {
                let mut map = BTreeMap::new();
                for (key, t) in &props {
                    map.insert(key.clone(), t(ctx)?);
                }
                Ok(Value::Object(map))
            }))
        }

        Node::Block { blocks } => {
            let mut items = Vec::with_capacity(blocks.len());
            for b in blocks {
                items.push((compile_node(&b.node, cctx)?, b.visible));
            }
            Ok(thunk(move |ctx| {
                let mut results = Vec::new();
                for (t, visible) in &items {
                    let v = t(ctx)?;
                    if *visible {
                        results.push(v);
                    }
                }
                Ok(Value::ResultSet(results))
            }))
        }

        Node::Parenthesis { inner } => compile_node(inner, cctx),
    }
}

/// Resolution order for a free symbol: call frames, the caller's scope,
/// namespace constants, then a bare unit name.
fn resolve_symbol(ctx: &EvalContext, name: &str) -> Result<Value, EvalError> {
    if let Some(v) = ctx.lookup_local(name) {
        return Ok(v);
    }
    match ctx.namespace.get(name) {
        Some(Entry::Constant(v)) => return Ok(v.clone()),
        Some(Entry::Function(_)) | Some(Entry::Raw(_)) => {
            return Err(EvalError::Type(format!(
                "Cannot use the function {name} as a value"
            )));
        }
        None => {}
    }
    if is_unit_name(name) {
        return Unit::new(1.0, name).map(Value::Unit).map_err(EvalError::Type);
    }
    Err(EvalError::UndefinedSymbol(name.to_string()))
}

fn compile_call(callee: &Node, args: &[Node], cctx: &CompileCtx) -> Result<Thunk, CompileError> {
    if let Node::Symbol { name } = callee {
        if !cctx.params.contains(name) {
            match cctx.namespace.get(name) {
                // raw functions receive unevaluated argument expressions
                Some(Entry::Raw(f)) => {
                    let f = *f;
                    let nodes: Vec<Node> = args.to_vec();
                    return Ok(thunk(move |ctx| {
                        f(&nodes, ctx.scope).map_err(EvalError::Function)
                    }));
                }
                Some(Entry::Function(tf)) => {
                    let tf = tf.clone();
                    let name = name.clone();
                    let arg_thunks = compile_all(args, cctx)?;
                    return Ok(thunk(move |ctx| {
                        let vals = eval_all(&arg_thunks, ctx)?;
                        // a function bound in scope shadows the builtin
                        match ctx.lookup_local(&name) {
                            Some(Value::Function(uf)) => call_user(ctx, &uf, vals),
                            Some(_) => {
                                Err(EvalError::Type(format!("{name} is not a function")))
                            }
                            None => tf
                                .call(&vals)
                                .map_err(|e| EvalError::Function(e.to_string())),
                        }
                    }));
                }
                Some(Entry::Constant(_)) | None => {}
            }
        }
        // parameter or scope-bound function, resolved at call time
        let name = name.clone();
        let arg_thunks = compile_all(args, cctx)?;
        return Ok(thunk(move |ctx| {
            let vals = eval_all(&arg_thunks, ctx)?;
            match ctx.lookup_local(&name) {
                Some(Value::Function(uf)) => call_user(ctx, &uf, vals),
                Some(_) => Err(EvalError::Type(format!("{name} is not a function"))),
                None => Err(EvalError::Function(format!("Undefined function {name}"))),
            }
        }));
    }
    // computed callee, e.g. obj.f(x)
    let callee_t = compile_node(callee, cctx)?;
    let arg_thunks = compile_all(args, cctx)?;
    Ok(thunk(move |ctx| {
        let f = callee_t(ctx)?;
        let vals = eval_all(&arg_thunks, ctx)?;
        match f {
            Value::Function(uf) => call_user(ctx, &uf, vals),
            other => Err(EvalError::Type(format!(
                "Cannot call a value of type {}",
                other.type_name()
            ))),
        }
    }))
}

/// Call a user-defined function: the body is compiled against the caller's
/// namespace and evaluated with the arguments bound in a fresh frame.
fn call_user(
    ctx: &mut EvalContext,
    func: &Arc<UserFunction>,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    if args.len() < func.params.len() {
        return Err(EvalError::Function(format!(
            "Too few arguments in function {} (expected: {}, actual: {})",
            func.name,
            func.params.len(),
            args.len()
        )));
    }
    if args.len() > func.params.len() {
        return Err(EvalError::Function(format!(
            "Too many arguments in function {} (expected: {}, actual: {})",
            func.name,
            func.params.len(),
            args.len()
        )));
    }
    let body_ctx = CompileCtx {
        namespace: ctx.namespace.clone(),
        params: func.params.iter().cloned().collect(),
        allow_end: false,
    };
    let body = compile_node(&func.body, &body_ctx).map_err(|e| EvalError::Function(e.message))?;
    let mut frame = HashMap::new();
    for (p, v) in func.params.iter().zip(args) {
        frame.insert(p.clone(), v);
    }
    ctx.frames.push(frame);
    let result = body(ctx);
    ctx.frames.pop();
    result
}

fn truthy(v: &Value) -> Result<bool, EvalError> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Num(n) => Ok(*n != 0.0),
        _ => Err(EvalError::Type(
            "Expected a boolean or number as condition".to_string(),
        )),
    }
}

fn range_bound(v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Num(n) => Ok(*n),
        other => Err(EvalError::Type(format!(
            "Expected a number as range bound, got {}",
            other.type_name()
        ))),
    }
}

fn dot_key(dimensions: &[Node]) -> Result<String, CompileError> {
    match dimensions.first() {
        Some(Node::Constant { value, .. }) => Ok(value.clone()),
        _ => Err(CompileError::new("Expected a property name")),
    }
}

fn get_property(obj: &Value, key: &str) -> Result<Value, EvalError> {
    match obj {
        Value::Object(map) => map
            .get(key)
            .cloned()
            .ok_or_else(|| EvalError::Index(format!("Property \"{key}\" is not defined"))),
        other => Err(EvalError::Type(format!(
            "Cannot access property \"{key}\" of {}",
            other.type_name()
        ))),
    }
}

/// Subscript a value with the given dimension thunks.
fn apply_index(ctx: &mut EvalContext, obj: Value, dims: &[Thunk]) -> Result<Value, EvalError> {
    match obj {
        Value::Matrix(m) => {
            let sel = eval_selection(ctx, dims, &m.shape)?;
            if sel.iter().all(|s| s.len() == 1) {
                let idx: Vec<usize> = sel.iter().map(|s| s[0]).collect();
                m.get(&idx).cloned().map_err(EvalError::Index)
            } else {
                m.submatrix(&sel).map(Value::Matrix).map_err(EvalError::Index)
            }
        }
        Value::Str(s) => {
            if dims.len() != 1 {
                return Err(EvalError::Index(format!(
                    "Dimension mismatch ({} != 1)",
                    dims.len()
                )));
            }
            let chars: Vec<char> = s.chars().collect();
            let shape = [chars.len()];
            let sel = eval_selection(ctx, dims, &shape)?;
            let mut out = String::new();
            for &i in &sel[0] {
                let c = chars.get(i).ok_or_else(|| {
                    EvalError::Index(format!(
                        "Index out of range ({} > {})",
                        i + 1,
                        chars.len()
                    ))
                })?;
                out.push(*c);
            }
            Ok(Value::Str(out))
        }
        other => Err(EvalError::Type(format!(
            "Cannot apply index to {}",
            other.type_name()
        ))),
    }
}

/// Evaluate one indices list per dimension; each dimension's extent is on
/// the `end` stack while its expression runs. Indices are 1-based at the
/// surface and 0-based in the result.
fn eval_selection(
    ctx: &mut EvalContext,
    dims: &[Thunk],
    shape: &[usize],
) -> Result<Vec<Vec<usize>>, EvalError> {
    if dims.len() != shape.len() {
        return Err(EvalError::Index(format!(
            "Dimension mismatch ({} != {})",
            dims.len(),
            shape.len()
        )));
    }
    let mut sel = Vec::with_capacity(dims.len());
    for (dim, extent) in dims.iter().zip(shape.iter()) {
        ctx.end_stack.push(*extent);
        let v = dim(ctx);
        ctx.end_stack.pop();
        sel.push(to_indices(&v?)?);
    }
    Ok(sel)
}

fn to_indices(v: &Value) -> Result<Vec<usize>, EvalError> {
    match v {
        Value::Num(n) => Ok(vec![to_index(*n)?]),
        Value::Matrix(m) => {
            let mut out = Vec::with_capacity(m.len());
            for el in &m.data {
                match el {
                    Value::Num(n) => out.push(to_index(*n)?),
                    other => {
                        return Err(EvalError::Index(format!(
                            "Expected a number as index, got {}",
                            other.type_name()
                        )))
                    }
                }
            }
            Ok(out)
        }
        other => Err(EvalError::Index(format!(
            "Expected a number as index, got {}",
            other.type_name()
        ))),
    }
}

fn to_index(n: f64) -> Result<usize, EvalError> {
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(EvalError::Index(format!(
            "Index must be an integer (value: {})",
            format_number(n)
        )));
    }
    if n < 1.0 {
        return Err(EvalError::Index(format!(
            "Index out of range ({} < 1)",
            format_number(n)
        )));
    }
    Ok(n as usize - 1)
}

/// One step of an assignment target path.
enum PathSeg {
    Prop(String),
    Subset(Vec<Thunk>),
}

fn assignment_path(node: &Node, cctx: &CompileCtx) -> Result<(String, Vec<PathSeg>), CompileError> {
    match node {
        Node::Symbol { name } => Ok((name.clone(), Vec::new())),
        Node::Accessor { object, index } => {
            let (root, mut path) = assignment_path(object, cctx)?;
            path.push(path_segment(index, cctx)?);
            Ok((root, path))
        }
        _ => Err(CompileError::new(
            "Invalid left hand side of assignment operator =",
        )),
    }
}

fn path_segment(index: &Node, cctx: &CompileCtx) -> Result<PathSeg, CompileError> {
    match index {
        Node::Index { dimensions, dot_notation: true } => Ok(PathSeg::Prop(dot_key(dimensions)?)),
        Node::Index { dimensions, dot_notation: false } => {
            let dim_ctx = CompileCtx { allow_end: true, ..cctx.clone() };
            Ok(PathSeg::Subset(compile_all(dimensions, &dim_ctx)?))
        }
        _ => Err(CompileError::new("Expected an index node")),
    }
}

/// Rebuild `current` with the value at `path` replaced by `new`. Matrices
/// grow when a leaf index lies beyond the current extent.
fn set_path(
    ctx: &mut EvalContext,
    current: Value,
    path: &[PathSeg],
    new: Value,
) -> Result<Value, EvalError> {
    let (seg, rest) = match path.split_first() {
        Some(parts) => parts,
        None => return Ok(new),
    };
    match seg {
        PathSeg::Prop(key) => {
            let mut map = match current {
                Value::Object(map) => map,
                other => {
                    return Err(EvalError::Type(format!(
                        "Cannot access property \"{key}\" of {}",
                        other.type_name()
                    )))
                }
            };
            if rest.is_empty() {
                map.insert(key.clone(), new);
            } else {
                let child = map.get(key).cloned().ok_or_else(|| {
                    EvalError::Index(format!("Property \"{key}\" is not defined"))
                })?;
                let updated = set_path(ctx, child, rest, new)?;
                map.insert(key.clone(), updated);
            }
            Ok(Value::Object(map))
        }
        PathSeg::Subset(dims) => {
            let mut m = match current {
                Value::Matrix(m) => m,
                other => {
                    return Err(EvalError::Type(format!(
                        "Cannot apply index to {}",
                        other.type_name()
                    )))
                }
            };
            let sel = eval_selection(ctx, dims, &m.shape)?;
            if rest.is_empty() {
                let replacement = match new {
                    Value::Matrix(r) => r,
                    other => Matrix::new(vec![other], vec![1]).map_err(EvalError::Index)?,
                };
                m.set_submatrix(&sel, &replacement).map_err(EvalError::Index)?;
            } else {
                let mut idx = Vec::with_capacity(sel.len());
                for s in &sel {
                    if s.len() != 1 {
                        return Err(EvalError::Index(
                            "One index per dimension expected in nested assignment".to_string(),
                        ));
                    }
                    idx.push(s[0]);
                }
                let child = m.get(&idx).cloned().map_err(EvalError::Index)?;
                let updated = set_path(ctx, child, rest, new)?;
                m.set(&idx, updated).map_err(EvalError::Index)?;
            }
            Ok(Value::Matrix(m))
        }
    }
}
