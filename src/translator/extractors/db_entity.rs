use crate::entity_catalog::DbEntity;
use crate::expression::Path;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::TranslatorResult;

use super::{prefixed, ColumnExtractor, SeenColumns};

/// Every column of a db entity, in declaration order.
pub struct DbEntityColumnExtractor<'a> {
    pub entity: &'a DbEntity,
}

impl<'a> ColumnExtractor<'a> for DbEntityColumnExtractor<'a> {
    fn extract(&self, ctx: &mut TranslatorContext<'a>, prefix: &Path) -> TranslatorResult<()> {
        let alias = ctx.table_tree.alias_for(prefix)?;
        let mut seen = SeenColumns::default();
        for attribute in &self.entity.attributes {
            seen.add(ctx, &alias, attribute, prefixed(prefix, &attribute.name), None);
        }
        Ok(())
    }
}
