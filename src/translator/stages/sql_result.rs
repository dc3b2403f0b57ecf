use std::collections::HashMap;

use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorError, TranslatorResult};
use crate::translator::result::{
    EmbeddedResult, EntityResult, FieldResult, ResultComponent, ResultGroup, SqlResultMapping,
};

use super::TranslationStage;

/// Builds the result mapping when the query asks for one: entity and
/// embedded groups collect their fields, every other column is a scalar.
pub struct SqlResultStage;

impl TranslationStage for SqlResultStage {
    fn stage(&self) -> Stage {
        Stage::SqlResult
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        if !ctx.query.result_set_mapping {
            return Ok(());
        }

        let mut mapping = SqlResultMapping::default();
        let mut positions: HashMap<usize, usize> = HashMap::new();
        let nodes = ctx.result_nodes.iter().filter(|r| r.in_data_row);

        for (node, column) in nodes.zip(ctx.column_descriptors.iter()) {
            let Some(group) = node.group else {
                mapping.components.push(ResultComponent::Scalar {
                    column: column.name.clone(),
                });
                continue;
            };

            let field = FieldResult {
                property: column.data_row_key.clone(),
                column: column.name.clone(),
            };
            if let Some(&i) = positions.get(&group) {
                match &mut mapping.components[i] {
                    ResultComponent::Entity(entity) => entity.fields.push(field),
                    ResultComponent::Embedded(embedded) => embedded.fields.push(field),
                    ResultComponent::Scalar { .. } => {}
                }
                continue;
            }

            let component = match ctx.result_groups.get(group) {
                Some(ResultGroup::Entity { entity }) => ResultComponent::Entity(EntityResult {
                    entity: entity.clone(),
                    fields: vec![field],
                }),
                Some(ResultGroup::Embedded { embeddable }) => {
                    ResultComponent::Embedded(EmbeddedResult {
                        embeddable: embeddable.clone(),
                        fields: vec![field],
                    })
                }
                None => {
                    return Err(TranslatorError::Invariant(format!(
                        "result column `{}` refers to unknown group {}",
                        column.name, group
                    )))
                }
            };
            positions.insert(group, mapping.components.len());
            mapping.components.push(component);
        }

        ctx.result_mapping = Some(mapping);
        Ok(())
    }
}
