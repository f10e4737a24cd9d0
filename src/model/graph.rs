// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Type hierarchy graph and candidate resolution.
//!
//! Built once from the [`ObjectModel`], the graph links every type to its
//! direct subtypes and answers the central resolution question: given a
//! requested (possibly parameterized) type, which registered concrete
//! types can a value of that type actually be? Generic arguments flow
//! down the hierarchy by symbolic substitution, and a candidate whose
//! inferred arguments violate a declared parameter bound is pruned rather
//! than reported as an error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::model::descriptor::{TypeDescriptor, TypeExpr};
use crate::model::schema::{ObjectModel, TypeDef, TypeKind};
use crate::types::raw;

pub struct TypeGraph {
    model: Arc<ObjectModel>,
    children: HashMap<String, Vec<String>>,
}

impl TypeGraph {
    /// Links every known type to its direct subtypes and rejects cyclic
    /// hierarchies.
    pub fn build(model: Arc<ObjectModel>) -> Result<TypeGraph, Error> {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut names: Vec<String> = Vec::new();
        for name in model.all_types() {
            names.push(name.to_owned());
        }
        for name in &names {
            let def = match model.get(name) {
                Some(def) => def.clone(),
                None => continue,
            };
            for parent in def.parents() {
                if let Some(parent_name) = parent.raw_name() {
                    children
                        .entry(parent_name.to_owned())
                        .or_default()
                        .push(name.clone());
                }
            }
        }
        for kids in children.values_mut() {
            kids.sort();
            kids.dedup();
        }

        let graph = TypeGraph { model, children };
        for name in &names {
            graph.check_acyclic(name, &mut Vec::new())?;
        }
        Ok(graph)
    }

    fn check_acyclic(&self, name: &str, stack: &mut Vec<String>) -> Result<(), Error> {
        if stack.iter().any(|n| n == name) {
            return Err(Error::configuration(format!(
                "cyclic type hierarchy through '{name}'"
            )));
        }
        let def = match self.model.get(name) {
            Some(def) => def.clone(),
            None => return Ok(()),
        };
        stack.push(name.to_owned());
        for parent in def.parents() {
            if let Some(parent_name) = parent.raw_name() {
                self.check_acyclic(parent_name, stack)?;
            }
        }
        stack.pop();
        Ok(())
    }

    pub fn model(&self) -> &Arc<ObjectModel> {
        &self.model
    }

    /// All registered concrete types assignable to the requested type, in
    /// deterministic (root-first, name-sorted) order. A declare-only
    /// request is substituted with its nearest registered ancestor,
    /// re-deriving the generic arguments along the supertype chain. Empty
    /// when the raw name is unknown to the model.
    pub fn candidate_types(&self, requested: &TypeDescriptor) -> Result<Vec<TypeDescriptor>, Error> {
        let mut out = Vec::new();
        let Some(def) = self.model.get(requested.raw()).cloned() else {
            return Ok(out);
        };
        if !self.model.is_registered(&def.name) {
            if let Some(ancestor) = self.registered_ancestor(&def, requested)? {
                self.collect(ancestor.raw(), &ancestor, &mut out)?;
                return Ok(out);
            }
        }
        self.collect(requested.raw(), requested, &mut out)?;
        Ok(out)
    }

    /// Nearest registered type up the supertype chain, resolved through
    /// the request's own bindings at every hop.
    fn registered_ancestor(
        &self,
        def: &TypeDef,
        requested: &TypeDescriptor,
    ) -> Result<Option<TypeDescriptor>, Error> {
        let mut bindings = self.model.bindings_for(def, requested.args())?;
        let mut sup = def.supertype.clone();
        while let Some(expr) = sup {
            let desc = expr.resolve(&bindings)?;
            let Some(parent) = self.model.get(desc.raw()).cloned() else {
                return Ok(None);
            };
            if self.model.is_registered(&parent.name) {
                return Ok(Some(desc));
            }
            bindings = self.model.bindings_for(&parent, desc.args())?;
            sup = parent.supertype.clone();
        }
        Ok(None)
    }

    fn collect(
        &self,
        name: &str,
        filter: &TypeDescriptor,
        out: &mut Vec<TypeDescriptor>,
    ) -> Result<(), Error> {
        let def = match self.model.get(name) {
            Some(def) => def.clone(),
            None => return Ok(()),
        };
        let matched = match self.match_node(&def, filter)? {
            Some(desc) => desc,
            None => return Ok(()),
        };
        if def.kind == TypeKind::Concrete && self.model.is_registered(&def.name) {
            out.push(matched.clone());
        }
        if let Some(kids) = self.children.get(name) {
            for child in kids {
                self.collect(child, &matched, out)?;
            }
        }
        Ok(())
    }

    /// Matches one type against the requested filter, inferring its own
    /// type arguments. `None` means the type is not assignable under the
    /// filter (including a bound violation, which prunes silently).
    fn match_node(
        &self,
        def: &TypeDef,
        filter: &TypeDescriptor,
    ) -> Result<Option<TypeDescriptor>, Error> {
        let mut bindings: HashMap<String, TypeDescriptor> = HashMap::new();

        if def.name == filter.raw() {
            if !filter.args().is_empty() {
                if filter.args().len() != def.params.len() {
                    return Ok(None);
                }
                for (param, arg) in def.params.iter().zip(filter.args()) {
                    bindings.insert(param.name.clone(), arg.clone());
                }
            }
        } else {
            let view = match self.view_as(def, filter.raw()) {
                Some(view) => view,
                None => return Ok(None),
            };
            if !filter.args().is_empty() {
                if view.len() != filter.args().len() {
                    return Ok(None);
                }
                for (expr, arg) in view.iter().zip(filter.args()) {
                    if !unify(expr, arg, &mut bindings) {
                        return Ok(None);
                    }
                }
            }
        }

        for param in &def.params {
            if !bindings.contains_key(&param.name) {
                bindings.insert(param.name.clone(), self.model.default_binding(param));
            }
        }
        for param in &def.params {
            if let Some(bound) = &param.bound {
                let sup = bound.resolve(&bindings)?;
                let arg = &bindings[&param.name];
                if !self.assignable(arg, &sup) {
                    return Ok(None);
                }
            }
        }

        if def.params.is_empty() {
            Ok(Some(TypeDescriptor::new(def.name.clone())))
        } else {
            let args = def.params.iter().map(|p| bindings[&p.name].clone());
            Ok(Some(TypeDescriptor::parameterized(def.name.clone(), args)))
        }
    }

    /// The argument expressions of ancestor `ancestor_raw` as seen from
    /// `def`, written in terms of `def`'s own type parameters. `None` when
    /// `def` does not descend from the ancestor.
    fn view_as(&self, def: &TypeDef, ancestor_raw: &str) -> Option<Vec<TypeExpr>> {
        if def.name == ancestor_raw {
            return Some(
                def.params
                    .iter()
                    .map(|p| TypeExpr::var(&p.name))
                    .collect(),
            );
        }
        for parent in def.parents() {
            let TypeExpr::Apply { raw: parent_raw, args: parent_args } = parent else {
                continue;
            };
            let Some(parent_def) = self.model.get(parent_raw).cloned() else {
                continue;
            };
            let Some(ancestor_view) = self.view_as(&parent_def, ancestor_raw) else {
                continue;
            };
            // Rewrite the ancestor view from the parent's parameters into
            // this type's parameters via the extends-clause arguments.
            let mut map: HashMap<String, TypeExpr> = HashMap::new();
            for (i, param) in parent_def.params.iter().enumerate() {
                let expr = parent_args.get(i).cloned().unwrap_or_else(TypeExpr::object);
                map.insert(param.name.clone(), expr);
            }
            return Some(ancestor_view.iter().map(|e| e.substitute(&map)).collect());
        }
        None
    }

    /// Nominal assignability between resolved descriptors. The wildcard
    /// top type accepts everything; a matching raw requires exact argument
    /// equality (or an unconstrained supertype).
    fn assignable(&self, sub: &TypeDescriptor, sup: &TypeDescriptor) -> bool {
        if sup.raw() == raw::OBJECT {
            return true;
        }
        if sub.raw() == sup.raw() {
            return sup.args().is_empty() || sub.args() == sup.args();
        }
        let Some(def) = self.model.get(sub.raw()).cloned() else {
            return false;
        };
        let Ok(bindings) = self.model.bindings_for(&def, sub.args()) else {
            return false;
        };
        for parent in def.parents() {
            if let Ok(parent_desc) = parent.resolve(&bindings) {
                if self.assignable(&parent_desc, sup) {
                    return true;
                }
            }
        }
        false
    }

    /// Whether a request resolving to these candidates needs hierarchy-aware
    /// (discriminated) handling. A single candidate still does when its type
    /// opts in explicitly or shares a hierarchy with another registered
    /// concrete type.
    pub fn is_polymorphic(&self, candidates: &[TypeDescriptor]) -> bool {
        match candidates {
            [] => false,
            [sole] => {
                let Some(def) = self.model.get(sole.raw()).cloned() else {
                    return false;
                };
                if def.polymorphic || def.discriminator.enabled {
                    return true;
                }
                let mut current = def;
                while let Some(sup) = &current.supertype {
                    let Some(name) = sup.raw_name() else { break };
                    let Some(parent) = self.model.get(name).cloned() else {
                        break;
                    };
                    if parent.kind == TypeKind::Concrete && self.model.is_registered(&parent.name)
                    {
                        return true;
                    }
                    current = parent;
                }
                false
            }
            _ => true,
        }
    }
}

/// Structural unification of a symbolic argument expression against a
/// resolved target. Variables bind on first sight and must agree on
/// repetition; the wildcard top type and a target with no arguments leave
/// the expression unconstrained.
fn unify(
    expr: &TypeExpr,
    target: &TypeDescriptor,
    bindings: &mut HashMap<String, TypeDescriptor>,
) -> bool {
    match expr {
        TypeExpr::Var(name) => match bindings.get(name) {
            Some(existing) => existing == target,
            None => {
                bindings.insert(name.clone(), target.clone());
                true
            }
        },
        TypeExpr::Apply { raw, args } => {
            if target.raw() == crate::types::raw::OBJECT && target.args().is_empty() {
                return true;
            }
            if raw != target.raw() {
                return false;
            }
            if target.args().is_empty() {
                return true;
            }
            if args.len() != target.args().len() {
                return false;
            }
            args.iter()
                .zip(target.args())
                .all(|(e, t)| unify(e, t, bindings))
        }
    }
}
