//! EXISTS over paths.
//!
//! `EXISTS(paintings.price > 1000)` on Artist becomes
//!
//! ```text
//! EXISTS (SELECT t1.PAINTING_ID FROM PAINTING t1
//!         WHERE t1.ARTIST_ID = t0.ARTIST_ID AND t1.PRICE > ?)
//! ```
//!
//! The condition is re-rooted at the relationship target: paths through the
//! relationship lose their first segment and every other path is evaluated
//! against the enclosing query.

use std::collections::BTreeSet;

use crate::entity_catalog::{DbEntity, DbRelationship, EntityCatalog};
use crate::expression::{CompareOp, Expression, Path, Rewrite, Value};
use crate::query::SelectQuery;

use super::context::TranslatorContext;
use super::errors::{TranslatorError, TranslatorResult};

/// Expands `Exists(condition)` or `NotExists(condition)` into plain
/// conditions and correlated subqueries.
pub(crate) fn expand(
    ctx: &TranslatorContext<'_>,
    expression: &Expression,
) -> TranslatorResult<Expression> {
    let (inner, negated) = match expression {
        Expression::Exists(inner) => (inner.as_ref(), false),
        Expression::NotExists(inner) => (inner.as_ref(), true),
        other => {
            return Err(TranslatorError::Invariant(format!(
                "`{}` is not an EXISTS expression",
                other
            )))
        }
    };

    let condition = match ctx.root_obj {
        Some(entity) => ctx.catalog.translate_to_db_expression(entity, inner)?,
        None => inner.clone(),
    };

    let expander = ExistsExpander {
        catalog: ctx.catalog,
        root: ctx.root_db,
    };
    let expanded = match &condition {
        Expression::DbPath(path) => expander.bare_path(path)?,
        other => expander.expand(other)?,
    };

    Ok(if negated { negate(expanded) } else { expanded })
}

fn negate(expression: Expression) -> Expression {
    match expression {
        Expression::Exists(inner) => Expression::NotExists(inner),
        Expression::True => Expression::False,
        Expression::False => Expression::True,
        Expression::Compare {
            op: CompareOp::NotEqual,
            left,
            right,
        } if matches!(right.as_ref(), Expression::Scalar(Value::Null)) => Expression::Compare {
            op: CompareOp::Equal,
            left,
            right,
        },
        other => other.not(),
    }
}

struct ExistsExpander<'a> {
    catalog: &'a EntityCatalog,
    root: &'a DbEntity,
}

impl ExistsExpander<'_> {
    /// EXISTS over a bare path: the path's relationship must have a row, or
    /// the attribute must not be NULL.
    fn bare_path(&self, path: &Path) -> TranslatorResult<Expression> {
        let Some(first) = path.first() else {
            return Ok(Expression::True);
        };

        match self.root.relationship(&first.name) {
            Some(relationship) => {
                let rest = path.tail();
                let condition = if rest.is_empty() {
                    None
                } else {
                    Some(Expression::exists(Expression::DbPath(rest)))
                };
                self.subquery(relationship, condition)
            }
            None => {
                Ok(Expression::DbPath(path.clone()).not_equal_to(Expression::Scalar(Value::Null)))
            }
        }
    }

    fn expand(&self, expression: &Expression) -> TranslatorResult<Expression> {
        match expression {
            Expression::And(children) | Expression::Or(children) => {
                if let Some(relationship) = self.shared_relationship(children) {
                    let rerooted = reroot(expression, &relationship.name)?;
                    return self.subquery(relationship, Some(rerooted));
                }
                let expanded = children
                    .iter()
                    .map(|c| self.expand(c))
                    .collect::<TranslatorResult<Vec<_>>>()?;
                Ok(match expression {
                    Expression::And(_) => Expression::And(expanded),
                    _ => Expression::Or(expanded),
                })
            }
            other => {
                let relationships = self.relationships_in(other);
                let mut names = relationships.iter();
                match (names.next(), names.next()) {
                    (None, _) => Ok(other.clone()),
                    (Some(name), None) => {
                        let relationship = self.relationship(name)?;
                        self.subquery(relationship, Some(reroot(other, name)?))
                    }
                    (Some(_), Some(_)) => {
                        Err(TranslatorError::AmbiguousExistsRoot(other.to_string()))
                    }
                }
            }
        }
    }

    /// The one root relationship every child goes through, if there is one.
    fn shared_relationship(&self, children: &[Expression]) -> Option<&DbRelationship> {
        let mut shared: Option<String> = None;
        for child in children {
            let relationships = self.relationships_in(child);
            if relationships.len() != 1 {
                return None;
            }
            let name = relationships.into_iter().next()?;
            match &shared {
                Some(existing) if *existing != name => return None,
                _ => shared = Some(name),
            }
        }
        self.root.relationship(&shared?)
    }

    /// Names of root relationships `expression` walks through. Paths of
    /// enclosing queries and nested subqueries don't count.
    fn relationships_in(&self, expression: &Expression) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.collect_relationships(expression, &mut found);
        found
    }

    fn collect_relationships(&self, expression: &Expression, found: &mut BTreeSet<String>) {
        match expression {
            Expression::DbPath(path) => {
                if let Some(first) = path.first() {
                    if self.root.relationship(&first.name).is_some() {
                        found.insert(first.name.clone());
                    }
                }
            }
            Expression::EnclosingObject(_) | Expression::Subquery(_) => {}
            other => {
                for child in other.children() {
                    self.collect_relationships(child, found);
                }
            }
        }
    }

    fn relationship(&self, name: &str) -> TranslatorResult<&DbRelationship> {
        self.root.relationship(name).ok_or_else(|| {
            TranslatorError::Invariant(format!("{} lost relationship `{}`", self.root.name, name))
        })
    }

    /// `EXISTS (SELECT .. FROM target WHERE <join correlation> AND condition)`.
    fn subquery(
        &self,
        relationship: &DbRelationship,
        condition: Option<Expression>,
    ) -> TranslatorResult<Expression> {
        let target = self.catalog.target_of(relationship)?;
        let mut parts: Vec<Expression> = relationship
            .joins
            .iter()
            .map(|join| {
                Expression::DbPath(Path::parse(&join.target_name)).equal_to(Expression::enclosing(
                    Expression::DbPath(Path::parse(&join.source_name)),
                ))
            })
            .collect();
        parts.extend(condition);

        let query = SelectQuery::db(&target.name).where_(Expression::and(parts));
        Ok(Expression::exists(Expression::subquery(query)))
    }
}

/// Rewrites `expression` to be evaluated from the target of `relationship`.
fn reroot(expression: &Expression, relationship: &str) -> TranslatorResult<Expression> {
    expression.rewrite(&mut |e| -> TranslatorResult<Rewrite> {
        Ok(match e {
            Expression::DbPath(path) if path.first().is_some_and(|s| s.name == relationship) => {
                Rewrite::Replaced(if path.len() == 1 {
                    Expression::FullObject(None)
                } else {
                    Expression::DbPath(path.tail())
                })
            }
            Expression::DbPath(_) | Expression::DbIdPath(_) | Expression::EnclosingObject(_) => {
                Rewrite::Replaced(Expression::enclosing(e.clone()))
            }
            _ => Rewrite::Descend,
        })
    })
}
