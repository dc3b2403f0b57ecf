use crate::expression::Expression;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslationWarning, TranslatorResult};

use super::TranslationStage;

/// WHERE: the query qualifier ANDed with the root entity's inheritance
/// qualifier.
pub struct QualifierStage;

impl TranslationStage for QualifierStage {
    fn stage(&self) -> Stage {
        Stage::Qualifier
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let inheritance = ctx.root_obj.and_then(|entity| entity.qualifier.clone());
        let qualifier = match (ctx.query.qualifier.clone(), inheritance) {
            (Some(query), Some(inheritance)) => Expression::and(vec![query, inheritance]),
            (Some(q), None) | (None, Some(q)) => q,
            (None, None) => return Ok(()),
        };

        let node = ctx.translate_expression(&qualifier)?;
        ctx.append_qualifier(node);
        Ok(())
    }
}

pub struct HavingStage;

impl TranslationStage for HavingStage {
    fn stage(&self) -> Stage {
        Stage::Having
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let query = ctx.query;
        let Some(having) = &query.having else {
            return Ok(());
        };

        let has_aggregates = ctx.result_nodes.iter().any(|r| r.aggregate)
            || having.is_aggregate()
            || query.orderings.iter().any(|o| o.expression.is_aggregate());
        if !has_aggregates {
            ctx.warn(TranslationWarning::HavingIgnored);
            return Ok(());
        }

        let node = ctx.translate_expression(having)?;
        ctx.select.having = Some(node);
        Ok(())
    }
}
