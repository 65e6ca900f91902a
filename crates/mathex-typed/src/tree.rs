//! The dispatch decision tree: built once per typed function, immutable,
//! walked on every call.

use crate::signature::{ExpandedSig, Impl, VariadicMatch, CONVERSIONS};
use mathex_builtins::Value;

#[derive(Default)]
pub struct TreeNode {
    /// One branch per distinct (type, conversion) at this argument
    /// position, in precedence order.
    branches: Vec<Branch>,
    /// A signature that ends exactly at this depth.
    leaf: Option<Impl>,
    /// A signature whose variadic tail starts at this depth.
    variadic: Option<VariadicLeaf>,
}

struct Branch {
    type_name: String,
    conversion: Option<usize>,
    next: TreeNode,
}

struct VariadicLeaf {
    spec: VariadicMatch,
    implementation: Impl,
}

/// Build a tree from signatures already sorted by the global precedence
/// comparator; the first signature reaching a slot wins.
pub fn build(sigs: &[ExpandedSig]) -> TreeNode {
    build_at(&sigs.iter().collect::<Vec<_>>(), 0)
}

fn build_at(sigs: &[&ExpandedSig], depth: usize) -> TreeNode {
    let mut node = TreeNode::default();
    for sig in sigs {
        if sig.params.len() == depth {
            match &sig.variadic {
                None => {
                    if node.leaf.is_none() {
                        node.leaf = Some(sig.implementation);
                    }
                }
                Some(v) => {
                    if node.variadic.is_none() {
                        node.variadic = Some(VariadicLeaf {
                            spec: v.clone(),
                            implementation: sig.implementation,
                        });
                    }
                }
            }
        }
    }

    // group deeper signatures by the (type, conversion) they need here,
    // preserving precedence order
    let mut groups: Vec<((String, Option<usize>), Vec<&ExpandedSig>)> = Vec::new();
    for sig in sigs {
        if sig.params.len() > depth {
            let key = (
                sig.params[depth].type_name.clone(),
                sig.params[depth].conversion,
            );
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(sig),
                None => groups.push((key, vec![sig])),
            }
        }
    }
    for ((type_name, conversion), members) in groups {
        node.branches.push(Branch {
            type_name,
            conversion,
            next: build_at(&members, depth + 1),
        });
    }
    node
}

impl TreeNode {
    /// Walk the tree against the runtime argument types, converting as
    /// branch edges demand. Backtracks across sibling branches, so a
    /// specific branch that dead-ends deeper down falls through to `any`
    /// alternatives. `None` means no signature matched.
    pub fn dispatch(&self, args: &[Value]) -> Option<Result<Value, String>> {
        let mut converted = Vec::with_capacity(args.len());
        self.walk(args, 0, &mut converted)
    }

    fn walk(
        &self,
        args: &[Value],
        depth: usize,
        converted: &mut Vec<Value>,
    ) -> Option<Result<Value, String>> {
        if depth == args.len() {
            if let Some(imp) = self.leaf {
                return Some(imp(converted));
            }
        }
        if depth < args.len() {
            let actual = args[depth].type_name();
            for branch in &self.branches {
                if branch.type_name != actual && branch.type_name != "any" {
                    continue;
                }
                let value = match branch.conversion {
                    None => args[depth].clone(),
                    Some(ci) => match (CONVERSIONS[ci].convert)(&args[depth]) {
                        Ok(v) => v,
                        Err(e) => return Some(Err(e)),
                    },
                };
                converted.push(value);
                if let Some(result) = branch.next.walk(args, depth + 1, converted) {
                    return Some(result);
                }
                converted.pop();
            }
        }
        if let Some(var) = &self.variadic {
            if args.len() > depth {
                if let Some(tail) = match_variadic(&var.spec, &args[depth..]) {
                    converted.extend(tail);
                    let result = (var.implementation)(converted);
                    converted.truncate(depth);
                    return Some(result);
                }
            }
        }
        None
    }
}

fn match_variadic(spec: &VariadicMatch, rest: &[Value]) -> Option<Vec<Value>> {
    let mut out = Vec::with_capacity(rest.len());
    for arg in rest {
        let actual = arg.type_name();
        if spec.types.iter().any(|t| t == actual || t == "any") {
            out.push(arg.clone());
        } else if let Some((_, ci)) = spec.conversions.iter().find(|(from, _)| from == actual) {
            match (CONVERSIONS[*ci].convert)(arg) {
                Ok(v) => out.push(v),
                Err(_) => return None,
            }
        } else {
            return None;
        }
    }
    Some(out)
}
