use crate::expression::Path;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorResult};
use crate::translator::extractors::{
    ColumnExtractor, CustomColumnExtractor, DbEntityColumnExtractor, DescriptorColumnExtractor,
    IdColumnExtractor,
};

use super::TranslationStage;

/// Picks the column extractor: explicit columns first, then ids for
/// paginated queries and subqueries, then full objects, then raw rows.
pub struct ColumnExtractionStage;

impl TranslationStage for ColumnExtractionStage {
    fn stage(&self) -> Stage {
        Stage::ColumnExtraction
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let query = ctx.query;
        let root = Path::root();

        if !query.columns.is_empty() {
            return CustomColumnExtractor {
                columns: &query.columns,
            }
            .extract(ctx, &root);
        }

        if query.is_paginated() || ctx.is_nested() {
            IdColumnExtractor {
                db_entity: ctx.root_db,
                obj_entity: ctx.root_obj,
            }
            .extract(ctx, &root)?;
            ctx.mark_root_segment_end();
            return Ok(());
        }

        match ctx.root_obj {
            Some(entity) => {
                DescriptorColumnExtractor { entity }.extract(ctx, &root)?;
                ctx.mark_root_segment_end();
                Ok(())
            }
            None => DbEntityColumnExtractor {
                entity: ctx.root_db,
            }
            .extract(ctx, &root),
        }
    }
}
