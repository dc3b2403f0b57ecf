use crate::sql_tree::builder::aliased;
use crate::sql_tree::SqlNode;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorResult};
use crate::translator::result::ColumnDescriptor;

use super::TranslationStage;

/// Moves the result nodes into the SELECT list and describes the data row
/// columns. A column is named by its alias, else by its attribute, else by a
/// generated label that is also put on the SQL as `AS`.
pub struct ColumnDescriptorStage;

impl TranslationStage for ColumnDescriptorStage {
    fn stage(&self) -> Stage {
        Stage::ColumnDescriptors
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let prefix = &ctx.config.generated_column_prefix;
        let mut generated = 0;
        let mut columns = Vec::with_capacity(ctx.result_nodes.len());
        let mut descriptors = Vec::new();

        for descriptor in &ctx.result_nodes {
            if !descriptor.in_data_row {
                columns.push(descriptor.node.clone());
                continue;
            }

            let (name, node) = match (&descriptor.node, &descriptor.attribute) {
                (SqlNode::Aliased { alias, .. }, _) => (alias.clone(), descriptor.node.clone()),
                (SqlNode::Column { .. }, Some(attribute)) => {
                    (attribute.name.clone(), descriptor.node.clone())
                }
                (node, _) => {
                    let name = format!("{}{}", prefix, generated);
                    generated += 1;
                    (name.clone(), aliased(node.clone(), &name))
                }
            };
            columns.push(node);
            descriptors.push(ColumnDescriptor::new(name, descriptor));
        }

        log::debug!(
            "ColumnDescriptorStage: {} column(s), {} in the data row",
            columns.len(),
            descriptors.len()
        );
        ctx.select.columns = columns;
        ctx.column_descriptors = descriptors;
        Ok(())
    }
}
