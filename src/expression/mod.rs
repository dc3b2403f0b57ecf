//! Filter-expression AST consumed by the translator.
//!
//! Expressions describe qualifiers, orderings, having clauses and selected
//! columns in terms of object paths (`ObjPath`), db paths (`DbPath`) and
//! db identifier paths (`DbIdPath`). The translator lowers them into
//! [`SqlNode`](crate::sql_tree::SqlNode) trees.

pub mod path;
pub mod value;

use std::fmt;

use crate::query::SelectQuery;

pub use path::{Path, PathMarker, PathSegment};
pub use value::{EmbeddedValue, ObjectId, PersistentRef, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "<>",
            CompareOp::LessThan => "<",
            CompareOp::LessOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterOrEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
}

impl ArithmeticOp {
    pub fn sql(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::BitwiseAnd => "&",
            ArithmeticOp::BitwiseOr => "|",
            ArithmeticOp::BitwiseXor => "^",
            ArithmeticOp::ShiftLeft => "<<",
            ArithmeticOp::ShiftRight => ">>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
    Compare {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Like {
        operand: Box<Expression>,
        pattern: Box<Expression>,
        ignore_case: bool,
        not: bool,
        escape: Option<char>,
    },
    In {
        operand: Box<Expression>,
        values: Box<Expression>,
        not: bool,
    },
    Between {
        operand: Box<Expression>,
        lower: Box<Expression>,
        upper: Box<Expression>,
        not: bool,
    },
    Arithmetic {
        op: ArithmeticOp,
        operands: Vec<Expression>,
    },
    Negate(Box<Expression>),
    BitwiseNot(Box<Expression>),
    ObjPath(Path),
    DbPath(Path),
    DbIdPath(Path),
    Scalar(Value),
    List(Vec<Expression>),
    Function {
        name: String,
        args: Vec<Expression>,
        aggregate: bool,
    },
    Exists(Box<Expression>),
    NotExists(Box<Expression>),
    All(Box<Expression>),
    Any(Box<Expression>),
    Subquery(Box<SelectQuery>),
    /// Evaluates the wrapped path against the enclosing query's tables.
    EnclosingObject(Box<Expression>),
    /// Identity of the current root object, or of the object the operand
    /// points to.
    FullObject(Option<Box<Expression>>),
    Case {
        whens: Vec<(Expression, Expression)>,
        otherwise: Option<Box<Expression>>,
    },
    True,
    False,
    Asterisk,
}

/// Outcome of a rewrite callback. `Replaced` subtrees are not descended.
#[derive(Debug)]
pub enum Rewrite {
    Descend,
    Replaced(Expression),
}

impl Expression {
    pub fn obj_path(path: &str) -> Self {
        Expression::ObjPath(Path::parse(path))
    }

    pub fn db_path(path: &str) -> Self {
        Expression::DbPath(Path::parse(path))
    }

    pub fn db_id_path(path: &str) -> Self {
        Expression::DbIdPath(Path::parse(path))
    }

    pub fn scalar(value: impl Into<Value>) -> Self {
        Expression::Scalar(value.into())
    }

    pub fn function(name: &str, args: Vec<Expression>) -> Self {
        Expression::Function {
            name: name.to_uppercase(),
            args,
            aggregate: false,
        }
    }

    pub fn aggregate(name: &str, args: Vec<Expression>) -> Self {
        Expression::Function {
            name: name.to_uppercase(),
            args,
            aggregate: true,
        }
    }

    pub fn count_all() -> Self {
        Expression::aggregate("COUNT", vec![Expression::Asterisk])
    }

    pub fn and(children: Vec<Expression>) -> Self {
        Expression::And(children)
    }

    pub fn or(children: Vec<Expression>) -> Self {
        Expression::Or(children)
    }

    pub fn exists(inner: Expression) -> Self {
        Expression::Exists(Box::new(inner))
    }

    pub fn not_exists(inner: Expression) -> Self {
        Expression::NotExists(Box::new(inner))
    }

    pub fn subquery(query: SelectQuery) -> Self {
        Expression::Subquery(Box::new(query))
    }

    pub fn enclosing(inner: Expression) -> Self {
        Expression::EnclosingObject(Box::new(inner))
    }

    fn compare(self, op: CompareOp, other: Expression) -> Self {
        Expression::Compare {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn equal_to(self, other: Expression) -> Self {
        self.compare(CompareOp::Equal, other)
    }

    pub fn not_equal_to(self, other: Expression) -> Self {
        self.compare(CompareOp::NotEqual, other)
    }

    pub fn less_than(self, other: Expression) -> Self {
        self.compare(CompareOp::LessThan, other)
    }

    pub fn less_or_equal(self, other: Expression) -> Self {
        self.compare(CompareOp::LessOrEqual, other)
    }

    pub fn greater_than(self, other: Expression) -> Self {
        self.compare(CompareOp::GreaterThan, other)
    }

    pub fn greater_or_equal(self, other: Expression) -> Self {
        self.compare(CompareOp::GreaterOrEqual, other)
    }

    pub fn like(self, pattern: &str) -> Self {
        Expression::Like {
            operand: Box::new(self),
            pattern: Box::new(Expression::scalar(pattern)),
            ignore_case: false,
            not: false,
            escape: None,
        }
    }

    pub fn like_ignore_case(self, pattern: &str) -> Self {
        Expression::Like {
            operand: Box::new(self),
            pattern: Box::new(Expression::scalar(pattern)),
            ignore_case: true,
            not: false,
            escape: None,
        }
    }

    pub fn in_values(self, values: Vec<Value>) -> Self {
        Expression::In {
            operand: Box::new(self),
            values: Box::new(Expression::List(
                values.into_iter().map(Expression::Scalar).collect(),
            )),
            not: false,
        }
    }

    pub fn not_in_values(self, values: Vec<Value>) -> Self {
        match self.in_values(values) {
            Expression::In { operand, values, .. } => Expression::In {
                operand,
                values,
                not: true,
            },
            other => other,
        }
    }

    pub fn between(self, lower: Expression, upper: Expression) -> Self {
        Expression::Between {
            operand: Box::new(self),
            lower: Box::new(lower),
            upper: Box::new(upper),
            not: false,
        }
    }

    pub fn arithmetic(op: ArithmeticOp, operands: Vec<Expression>) -> Self {
        Expression::Arithmetic { op, operands }
    }

    pub fn negate(self) -> Self {
        Expression::Negate(Box::new(self))
    }

    pub fn not(self) -> Self {
        Expression::Not(Box::new(self))
    }

    pub fn is_path(&self) -> bool {
        matches!(
            self,
            Expression::ObjPath(_) | Expression::DbPath(_) | Expression::DbIdPath(_)
        )
    }

    /// True if an aggregate function call appears anywhere outside nested
    /// subqueries.
    pub fn is_aggregate(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if let Expression::Function {
                aggregate: true, ..
            } = e
            {
                found = true;
            }
        });
        found
    }

    /// Direct children in evaluation order. Subqueries are opaque.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::And(c) | Expression::Or(c) | Expression::List(c) => c.iter().collect(),
            Expression::Arithmetic { operands, .. } => operands.iter().collect(),
            Expression::Function { args, .. } => args.iter().collect(),
            Expression::Not(e)
            | Expression::Negate(e)
            | Expression::BitwiseNot(e)
            | Expression::Exists(e)
            | Expression::NotExists(e)
            | Expression::All(e)
            | Expression::Any(e)
            | Expression::EnclosingObject(e) => vec![e.as_ref()],
            Expression::FullObject(Some(e)) => vec![e.as_ref()],
            Expression::Compare { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::Like {
                operand, pattern, ..
            } => vec![operand.as_ref(), pattern.as_ref()],
            Expression::In {
                operand, values, ..
            } => vec![operand.as_ref(), values.as_ref()],
            Expression::Between {
                operand,
                lower,
                upper,
                ..
            } => vec![operand.as_ref(), lower.as_ref(), upper.as_ref()],
            Expression::Case { whens, otherwise } => {
                let mut out = Vec::new();
                for (when, then) in whens {
                    out.push(when);
                    out.push(then);
                }
                if let Some(e) = otherwise {
                    out.push(e.as_ref());
                }
                out
            }
            _ => Vec::new(),
        }
    }

    /// Pre-order visit of this node and its descendants.
    pub fn walk<F: FnMut(&Expression)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Rebuilds the tree top-down. The callback sees every node before its
    /// children; a `Replaced` result is used as-is and not descended.
    pub fn rewrite<E, F>(&self, f: &mut F) -> Result<Expression, E>
    where
        F: FnMut(&Expression) -> Result<Rewrite, E>,
    {
        if let Rewrite::Replaced(replacement) = f(self)? {
            return Ok(replacement);
        }

        let boxed = |e: &Expression, f: &mut F| -> Result<Box<Expression>, E> {
            Ok(Box::new(e.rewrite(f)?))
        };
        let all = |v: &[Expression], f: &mut F| -> Result<Vec<Expression>, E> {
            v.iter().map(|e| e.rewrite(f)).collect()
        };

        Ok(match self {
            Expression::And(c) => Expression::And(all(c, f)?),
            Expression::Or(c) => Expression::Or(all(c, f)?),
            Expression::List(c) => Expression::List(all(c, f)?),
            Expression::Not(e) => Expression::Not(boxed(e, f)?),
            Expression::Negate(e) => Expression::Negate(boxed(e, f)?),
            Expression::BitwiseNot(e) => Expression::BitwiseNot(boxed(e, f)?),
            Expression::Exists(e) => Expression::Exists(boxed(e, f)?),
            Expression::NotExists(e) => Expression::NotExists(boxed(e, f)?),
            Expression::All(e) => Expression::All(boxed(e, f)?),
            Expression::Any(e) => Expression::Any(boxed(e, f)?),
            Expression::EnclosingObject(e) => Expression::EnclosingObject(boxed(e, f)?),
            Expression::FullObject(Some(e)) => Expression::FullObject(Some(boxed(e, f)?)),
            Expression::Compare { op, left, right } => Expression::Compare {
                op: *op,
                left: boxed(left, f)?,
                right: boxed(right, f)?,
            },
            Expression::Like {
                operand,
                pattern,
                ignore_case,
                not,
                escape,
            } => Expression::Like {
                operand: boxed(operand, f)?,
                pattern: boxed(pattern, f)?,
                ignore_case: *ignore_case,
                not: *not,
                escape: *escape,
            },
            Expression::In {
                operand,
                values,
                not,
            } => Expression::In {
                operand: boxed(operand, f)?,
                values: boxed(values, f)?,
                not: *not,
            },
            Expression::Between {
                operand,
                lower,
                upper,
                not,
            } => Expression::Between {
                operand: boxed(operand, f)?,
                lower: boxed(lower, f)?,
                upper: boxed(upper, f)?,
                not: *not,
            },
            Expression::Arithmetic { op, operands } => Expression::Arithmetic {
                op: *op,
                operands: all(operands, f)?,
            },
            Expression::Function {
                name,
                args,
                aggregate,
            } => Expression::Function {
                name: name.clone(),
                args: all(args, f)?,
                aggregate: *aggregate,
            },
            Expression::Case { whens, otherwise } => {
                let mut rebuilt = Vec::with_capacity(whens.len());
                for (when, then) in whens {
                    rebuilt.push((when.rewrite(f)?, then.rewrite(f)?));
                }
                Expression::Case {
                    whens: rebuilt,
                    otherwise: match otherwise {
                        Some(e) => Some(boxed(e, f)?),
                        None => None,
                    },
                }
            }
            leaf => leaf.clone(),
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: &[Expression], sep: &str| -> String {
            items
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(sep)
        };

        match self {
            Expression::And(c) => write!(f, "({})", join(c, " and ")),
            Expression::Or(c) => write!(f, "({})", join(c, " or ")),
            Expression::Not(e) => write!(f, "not {}", e),
            Expression::Compare { op, left, right } => write!(f, "{} {} {}", left, op.sql(), right),
            Expression::Like {
                operand,
                pattern,
                ignore_case,
                not,
                ..
            } => {
                let keyword = if *ignore_case { "likeIgnoreCase" } else { "like" };
                let not = if *not { "not " } else { "" };
                write!(f, "{} {}{} {}", operand, not, keyword, pattern)
            }
            Expression::In {
                operand,
                values,
                not,
            } => write!(f, "{} {}in {}", operand, if *not { "not " } else { "" }, values),
            Expression::Between {
                operand,
                lower,
                upper,
                not,
            } => write!(
                f,
                "{} {}between {} and {}",
                operand,
                if *not { "not " } else { "" },
                lower,
                upper
            ),
            Expression::Arithmetic { op, operands } => {
                write!(f, "{}", join(operands, &format!(" {} ", op.sql())))
            }
            Expression::Negate(e) => write!(f, "-{}", e),
            Expression::BitwiseNot(e) => write!(f, "~{}", e),
            Expression::ObjPath(p) => write!(f, "{}", p),
            Expression::DbPath(p) => write!(f, "db:{}", p),
            Expression::DbIdPath(p) => write!(f, "dbid:{}", p),
            Expression::Scalar(v) => write!(f, "{}", v),
            Expression::List(c) => write!(f, "({})", join(c, ", ")),
            Expression::Function { name, args, .. } => write!(f, "{}({})", name, join(args, ", ")),
            Expression::Exists(e) => write!(f, "exists {}", e),
            Expression::NotExists(e) => write!(f, "not exists {}", e),
            Expression::All(e) => write!(f, "all {}", e),
            Expression::Any(e) => write!(f, "any {}", e),
            Expression::Subquery(q) => write!(f, "(select {})", q.root),
            Expression::EnclosingObject(e) => write!(f, "$parent.{}", e),
            Expression::FullObject(None) => write!(f, "$object"),
            Expression::FullObject(Some(e)) => write!(f, "$object({})", e),
            Expression::Case { whens, otherwise } => {
                write!(f, "case")?;
                for (when, then) in whens {
                    write!(f, " when {} then {}", when, then)?;
                }
                if let Some(e) = otherwise {
                    write!(f, " else {}", e)?;
                }
                write!(f, " end")
            }
            Expression::True => write!(f, "true"),
            Expression::False => write!(f, "false"),
            Expression::Asterisk => write!(f, "*"),
        }
    }
}
