use crate::sql_tree::builder::function;
use crate::sql_tree::OrderByItem;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorResult};

use super::TranslationStage;

/// Lowers the orderings into ORDER BY items.
///
/// Once the query groups or is DISTINCT, an ordered expression must also be
/// selected; such expressions get a column outside the data row unless an
/// equal one is selected already.
pub struct OrderingStage;

impl TranslationStage for OrderingStage {
    fn stage(&self) -> Stage {
        Stage::Ordering
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let query = ctx.query;
        for ordering in &query.orderings {
            let mut expression = ctx.translate_expression(&ordering.expression)?;
            if ordering.case_insensitive {
                expression = function(&ctx.config.case_insensitive_function, vec![expression]);
            }

            if query.distinct || ctx.needs_group_by() {
                ctx.ensure_result_column(&expression);
            }
            ctx.select.order_by.push(OrderByItem {
                expression,
                order: ordering.order,
            });
        }
        Ok(())
    }
}

/// DISTINCT may also be switched on by a to-many join; every ORDER BY item
/// is then required in the SELECT list as well.
pub struct OrderingDistinctStage;

impl TranslationStage for OrderingDistinctStage {
    fn stage(&self) -> Stage {
        Stage::OrderingDistinct
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        if !ctx.select.distinct {
            return Ok(());
        }
        let expressions: Vec<_> = ctx
            .select
            .order_by
            .iter()
            .map(|item| item.expression.clone())
            .collect();
        for expression in &expressions {
            ctx.ensure_result_column(expression);
        }
        Ok(())
    }
}
