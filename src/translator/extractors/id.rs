use crate::entity_catalog::{DbAttribute, DbEntity, ObjEntity};
use crate::expression::Path;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{TranslatorError, TranslatorResult};
use crate::translator::result::ResultGroup;

use super::{prefixed, ColumnExtractor, SeenColumns};

/// Primary key columns only.
pub struct IdColumnExtractor<'a> {
    pub db_entity: &'a DbEntity,
    /// Registers an entity result group when set.
    pub obj_entity: Option<&'a ObjEntity>,
}

impl<'a> ColumnExtractor<'a> for IdColumnExtractor<'a> {
    fn extract(&self, ctx: &mut TranslatorContext<'a>, prefix: &Path) -> TranslatorResult<()> {
        let pks: Vec<&DbAttribute> = self.db_entity.primary_keys().collect();
        if pks.is_empty() {
            return Err(TranslatorError::PrimaryKeyMismatch {
                entity: self.db_entity.name.clone(),
                count: 0,
            });
        }

        let group = self.obj_entity.map(|entity| {
            ctx.add_result_group(ResultGroup::Entity {
                entity: entity.name.clone(),
            })
        });
        let alias = ctx.table_tree.alias_for(prefix)?;
        let mut seen = SeenColumns::default();
        for pk in pks {
            seen.add(ctx, &alias, pk, prefixed(prefix, &pk.name), group);
        }
        Ok(())
    }
}
