// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declarative policy set.
//!
//! ```json
//! {
//!   "rules": [
//!     { "role": "user",  "resource": "/v1/users/me", "methods": ["GET"] },
//!     { "role": "admin", "resource": "/v1/admin/*",  "methods": ["*"] }
//!   ],
//!   "inherits": { "sudo": ["admin"], "admin": ["user"] }
//! }
//! ```
//!
//! A rule granting `GET` also grants `HEAD`.
//!
//! A role receives its own rules plus, transitively, the rules of every role
//! it inherits from. The whole document is validated before a set is built.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pattern::PathPattern;
use super::PolicyError;
use crate::auth::Role;

const HTTP_METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Policy file contents as written by operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// role -> roles whose rules it also receives
    #[serde(default)]
    pub inherits: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub role: String,
    pub resource: String,
    /// Upper-case HTTP methods, or `*` for any. `GET` also grants `HEAD`.
    pub methods: Vec<String>,
}

#[derive(Debug, Clone)]
enum Methods {
    Any,
    Only(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: PathPattern,
    methods: Methods,
}

impl Rule {
    fn permits(&self, path: &str, method: &str) -> bool {
        let method_ok = match &self.methods {
            Methods::Any => true,
            // axum serves HEAD from GET routes.
            Methods::Only(allowed) => {
                allowed.contains(method) || (method == "HEAD" && allowed.contains("GET"))
            }
        };
        method_ok && self.pattern.matches(path)
    }
}

/// Validated, inheritance-resolved policy. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    effective: HashMap<Role, Vec<Rule>>,
    document: PolicyDocument,
}

impl PolicySet {
    /// A set that denies everything.
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let document: PolicyDocument =
            serde_json::from_str(json).map_err(|e| PolicyError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    pub fn from_document(document: PolicyDocument) -> Result<Self, PolicyError> {
        let mut own: HashMap<Role, Vec<Rule>> = HashMap::new();
        for rule_spec in &document.rules {
            let role = parse_role(&rule_spec.role)?;
            let rule = Rule {
                pattern: PathPattern::parse(&rule_spec.resource)?,
                methods: parse_methods(&rule_spec.resource, &rule_spec.methods)?,
            };
            own.entry(role).or_default().push(rule);
        }

        let mut parents: HashMap<Role, Vec<Role>> = HashMap::new();
        for (child, inherited) in &document.inherits {
            let child = parse_role(child)?;
            let inherited = inherited
                .iter()
                .map(|r| parse_role(r))
                .collect::<Result<Vec<_>, _>>()?;
            parents.entry(child).or_default().extend(inherited);
        }

        let mut effective = HashMap::new();
        for role in [Role::User, Role::Admin, Role::Sudo] {
            let mut rules = Vec::new();
            for source in ancestry(role, &parents)? {
                if let Some(source_rules) = own.get(&source) {
                    rules.extend(source_rules.iter().cloned());
                }
            }
            if !rules.is_empty() {
                effective.insert(role, rules);
            }
        }

        Ok(Self {
            effective,
            document,
        })
    }

    /// Whether any rule for `role` covers `(path, method)`.
    pub fn allows(&self, role: Role, path: &str, method: &str) -> bool {
        self.effective
            .get(&role)
            .is_some_and(|rules| rules.iter().any(|rule| rule.permits(path, method)))
    }

    /// Number of rules as declared, before inheritance expansion.
    pub fn rule_count(&self) -> usize {
        self.document.rules.len()
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }
}

fn parse_role(raw: &str) -> Result<Role, PolicyError> {
    Role::parse(raw).ok_or_else(|| PolicyError::UnknownRole(raw.to_string()))
}

fn parse_methods(resource: &str, methods: &[String]) -> Result<Methods, PolicyError> {
    if methods.is_empty() {
        return Err(PolicyError::InvalidMethod {
            resource: resource.to_string(),
            method: String::new(),
        });
    }
    if methods.iter().any(|m| m == "*") {
        return Ok(Methods::Any);
    }
    let mut allowed = HashSet::new();
    for method in methods {
        if !HTTP_METHODS.contains(&method.as_str()) {
            return Err(PolicyError::InvalidMethod {
                resource: resource.to_string(),
                method: method.clone(),
            });
        }
        allowed.insert(method.clone());
    }
    Ok(Methods::Only(allowed))
}

/// `role` followed by every role it transitively inherits from.
fn ancestry(role: Role, parents: &HashMap<Role, Vec<Role>>) -> Result<Vec<Role>, PolicyError> {
    fn visit(
        role: Role,
        parents: &HashMap<Role, Vec<Role>>,
        path: &mut Vec<Role>,
        seen: &mut Vec<Role>,
    ) -> Result<(), PolicyError> {
        if path.contains(&role) {
            return Err(PolicyError::InheritanceCycle(role.to_string()));
        }
        if seen.contains(&role) {
            return Ok(());
        }
        seen.push(role);
        path.push(role);
        for parent in parents.get(&role).into_iter().flatten() {
            visit(*parent, parents, path, seen)?;
        }
        path.pop();
        Ok(())
    }

    let mut seen = Vec::new();
    visit(role, parents, &mut Vec::new(), &mut seen)?;
    Ok(seen)
}
