use crate::entity_catalog::{CatalogError, ObjEntity, PropertyDescriptor};
use crate::expression::{Path, PathSegment};
use crate::translator::context::TranslatorContext;
use crate::translator::errors::TranslatorResult;
use crate::translator::result::ResultGroup;

use super::{prefixed, ColumnExtractor, SeenColumns};

/// Columns needed to build a full object: every attribute, every embedded
/// property, the foreign keys of plain to-one relationships and the primary
/// key. To-many relationships contribute nothing.
pub struct DescriptorColumnExtractor<'a> {
    pub entity: &'a ObjEntity,
}

impl<'a> ColumnExtractor<'a> for DescriptorColumnExtractor<'a> {
    fn extract(&self, ctx: &mut TranslatorContext<'a>, prefix: &Path) -> TranslatorResult<()> {
        let catalog = ctx.catalog;
        let descriptor = catalog.class_descriptor(&self.entity.name)?;
        let db_entity = descriptor.db_entity;
        let group = Some(ctx.add_result_group(ResultGroup::Entity {
            entity: self.entity.name.clone(),
        }));
        let mut seen = SeenColumns::default();

        for property in &descriptor.properties {
            match property {
                PropertyDescriptor::Attribute(attribute) if attribute.is_flattened() => {
                    // flattened chains are outer joined and keep every column
                    // they touch, each keyed by its own sub-path
                    let path =
                        Path::from_segments(vec![PathSegment::outer(attribute.name.clone())]);
                    let result = ctx.translate_obj_path(self.entity, &path, prefix)?;
                    for (table_path, db_attribute) in result.all_columns() {
                        let alias = ctx.table_tree.alias_for(table_path)?;
                        let key = sub_path_key(prefix, table_path, &db_attribute.name);
                        seen.add(ctx, &alias, db_attribute, prefixed(prefix, &key), group);
                    }
                }
                PropertyDescriptor::Attribute(attribute) => {
                    let path = Path::parse(&attribute.name);
                    let result = ctx.translate_obj_path(self.entity, &path, prefix)?;
                    let key = attribute.db_attribute_name();
                    for (table_path, db_attribute) in result.columns() {
                        let alias = ctx.table_tree.alias_for(table_path)?;
                        seen.add(ctx, &alias, db_attribute, prefixed(prefix, key), group);
                    }
                }
                PropertyDescriptor::Embedded(embedded, _) => {
                    let result =
                        ctx.translate_obj_path(self.entity, &Path::parse(&embedded.name), prefix)?;
                    for (table_path, db_attribute) in result.columns() {
                        let alias = ctx.table_tree.alias_for(table_path)?;
                        seen.add(
                            ctx,
                            &alias,
                            db_attribute,
                            prefixed(prefix, &db_attribute.name),
                            group,
                        );
                    }
                }
                PropertyDescriptor::ToOne(relationship) => {
                    if relationship.is_flattened() {
                        continue;
                    }
                    let Some(db_relationship) =
                        db_entity.relationship(&relationship.db_relationship_path)
                    else {
                        continue;
                    };
                    let target = catalog.target_of(db_relationship)?;
                    if db_relationship.to_many || !db_relationship.is_exact_to_pk(target) {
                        continue;
                    }
                    let alias = ctx.table_tree.alias_for(prefix)?;
                    for join in &db_relationship.joins {
                        let fk = db_entity.attribute(&join.source_name).ok_or_else(|| {
                            CatalogError::attribute(&db_entity.name, &join.source_name)
                        })?;
                        seen.add(ctx, &alias, fk, prefixed(prefix, &fk.name), group);
                    }
                }
                PropertyDescriptor::ToMany(_) => {}
            }
        }

        let alias = ctx.table_tree.alias_for(prefix)?;
        for pk in db_entity.primary_keys() {
            seen.add(ctx, &alias, pk, prefixed(prefix, &pk.name), group);
        }
        Ok(())
    }
}

/// Column name under the relationship hops that lead to it from `prefix`.
fn sub_path_key(prefix: &Path, table_path: &Path, column: &str) -> String {
    let hops = table_path.segments().get(prefix.len()..).unwrap_or_default();
    let mut key: Vec<&str> = hops.iter().map(|s| s.name.as_str()).collect();
    key.push(column);
    key.join(".")
}
