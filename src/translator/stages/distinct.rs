use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslationWarning, TranslatorResult};

use super::TranslationStage;

/// Applies DISTINCT when asked for or when a to-many join can repeat root
/// rows. Columns of types the database can't compare switch it off again;
/// the caller sees `distinct_suppressed` and deduplicates itself.
pub struct DistinctStage;

impl TranslationStage for DistinctStage {
    fn stage(&self) -> Stage {
        Stage::Distinct
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        if ctx.query.suppress_distinct {
            return Ok(());
        }
        if !ctx.query.distinct && !ctx.table_tree.has_to_many_join() {
            return Ok(());
        }

        let config = ctx.config;
        let blocking = ctx
            .result_nodes
            .iter()
            .find(|r| config.is_distinct_unsupported(r.jdbc_type()))
            .map(|r| match &r.attribute {
                Some(attribute) => format!("{}.{}", attribute.entity, attribute.name),
                None => format!("{:?}", r.node),
            });

        match blocking {
            Some(column) => {
                ctx.distinct_suppressed = true;
                ctx.warn(TranslationWarning::DistinctSuppressed { column });
            }
            None => ctx.select.distinct = true,
        }
        Ok(())
    }
}
