//! The translation pipeline.
//!
//! Stages run in a fixed order over one [`TranslatorContext`]. Later stages
//! depend on what earlier ones left behind: column extraction fills the
//! result nodes that grouping and DISTINCT inspect, and the table tree is
//! only rendered after every path has registered its joins.

mod column_descriptor;
mod columns;
mod distinct;
mod group_by;
mod limit_offset;
mod ordering;
mod prefetch;
mod qualifier;
mod sql_generation;
mod sql_result;
mod table_tree;

use super::context::TranslatorContext;
use super::errors::{Stage, TranslatorResult};

pub trait TranslationStage {
    fn stage(&self) -> Stage;

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()>;
}

const PIPELINE: [&dyn TranslationStage; 14] = [
    &columns::ColumnExtractionStage,
    &prefetch::PrefetchStage,
    &ordering::OrderingStage,
    &qualifier::QualifierStage,
    &qualifier::HavingStage,
    &group_by::GroupByStage,
    &distinct::DistinctStage,
    &ordering::OrderingDistinctStage,
    &limit_offset::LimitOffsetStage,
    &column_descriptor::ColumnDescriptorStage,
    &table_tree::TableTreeQualifierStage,
    &table_tree::TableTreeStage,
    &sql_result::SqlResultStage,
    &sql_generation::SqlGenerationStage,
];

/// Runs every stage in order. A failure is reported with the stage it
/// happened in.
pub fn run(ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
    for stage in PIPELINE {
        log::debug!(
            "TRANSLATOR: {} on {}{}",
            stage.stage(),
            ctx.query.root,
            if ctx.is_nested() { " (subquery)" } else { "" }
        );
        stage.perform(ctx).map_err(|e| e.in_stage(stage.stage()))?;
    }
    Ok(())
}
