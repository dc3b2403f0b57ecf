use crate::sql_tree::render::render;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorResult};

use super::TranslationStage;

/// Renders the statement. Subqueries are rendered inline by their parent.
pub struct SqlGenerationStage;

impl TranslationStage for SqlGenerationStage {
    fn stage(&self) -> Stage {
        Stage::SqlGeneration
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        if ctx.is_nested() {
            return Ok(());
        }

        let mut select = std::mem::take(&mut ctx.select);
        if let Some(processors) = ctx.type_processors.filter(|p| !p.is_empty()) {
            select = processors.apply(select, ctx.catalog);
        }

        let (sql, bindings) = render(&select)?;
        log::debug!("SqlGenerationStage: {} ({} binding(s))", sql, bindings.len());
        ctx.select = select;
        ctx.sql = Some((sql, bindings));
        Ok(())
    }
}
