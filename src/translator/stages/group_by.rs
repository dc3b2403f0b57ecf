use crate::sql_tree::SqlNode;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorResult};

use super::TranslationStage;

/// Groups by every non-aggregate result column once anything aggregates.
pub struct GroupByStage;

impl TranslationStage for GroupByStage {
    fn stage(&self) -> Stage {
        Stage::GroupBy
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        if !ctx.needs_group_by() {
            return Ok(());
        }

        let group_by: Vec<SqlNode> = ctx
            .result_nodes
            .iter()
            .filter(|r| !r.aggregate)
            .map(|r| match &r.node {
                SqlNode::Aliased { node, .. } => node.as_ref().clone(),
                other => other.clone(),
            })
            .collect();
        log::debug!("GroupByStage: {} grouping column(s)", group_by.len());
        ctx.select.group_by = group_by;
        Ok(())
    }
}
