use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorResult};

use super::TranslationStage;

pub struct LimitOffsetStage;

impl TranslationStage for LimitOffsetStage {
    fn stage(&self) -> Stage {
        Stage::LimitOffset
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let query = ctx.query;
        ctx.select.limit = (query.limit > 0).then_some(query.limit);
        ctx.select.offset = (query.offset > 0).then_some(query.offset);
        Ok(())
    }
}
