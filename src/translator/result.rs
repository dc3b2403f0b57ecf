//! What the translator reports about the columns it selects.

use serde::Serialize;

use crate::entity_catalog::types_mapping::{host_type_for_jdbc, jdbc_type_for_host};
use crate::entity_catalog::{DbAttribute, JdbcType};
use crate::query::Property;
use crate::sql_tree::SqlNode;

/// One SELECT result column plus what it was extracted from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultNodeDescriptor {
    pub node: SqlNode,
    /// `false` for columns only added so that ORDER BY or GROUP BY stay
    /// valid; the caller never reads them.
    pub in_data_row: bool,
    pub property: Option<Property>,
    /// Key the value is stored under in a fetched row.
    pub data_row_key: Option<String>,
    pub attribute: Option<DbAttribute>,
    /// Host type override for expression columns.
    pub host_type: Option<String>,
    pub aggregate: bool,
    /// Index into the context's result groups.
    pub group: Option<usize>,
}

impl ResultNodeDescriptor {
    pub fn attribute(node: SqlNode, attribute: &DbAttribute, data_row_key: String) -> Self {
        ResultNodeDescriptor {
            node,
            in_data_row: true,
            property: None,
            data_row_key: Some(data_row_key),
            attribute: Some(attribute.clone()),
            host_type: None,
            aggregate: false,
            group: None,
        }
    }

    pub fn property(node: SqlNode, property: &Property) -> Self {
        ResultNodeDescriptor {
            aggregate: node.is_aggregate(),
            attribute: node.attribute().cloned(),
            node,
            in_data_row: true,
            property: Some(property.clone()),
            data_row_key: Some(property.name()),
            host_type: property.host_type.clone(),
            group: None,
        }
    }

    /// A column outside the data row.
    pub fn hidden(node: SqlNode) -> Self {
        ResultNodeDescriptor {
            aggregate: node.is_aggregate(),
            attribute: node.attribute().cloned(),
            node,
            in_data_row: false,
            property: None,
            data_row_key: None,
            host_type: None,
            group: None,
        }
    }

    pub fn in_group(mut self, group: Option<usize>) -> Self {
        self.group = group;
        self
    }

    pub fn jdbc_type(&self) -> JdbcType {
        match (&self.attribute, &self.host_type) {
            (_, Some(host_type)) => jdbc_type_for_host(host_type),
            (Some(attribute), None) => attribute.jdbc_type,
            (None, None) => JdbcType::Other,
        }
    }
}

/// What a caller needs to read one result column back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    /// Column label in the SELECT list.
    pub name: String,
    pub data_row_key: String,
    pub jdbc_type: JdbcType,
    pub host_type: String,
    /// Table alias for plain attribute columns.
    pub table_alias: Option<String>,
    pub attribute: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: String, descriptor: &ResultNodeDescriptor) -> Self {
        let jdbc_type = descriptor.jdbc_type();
        let table_alias = match &descriptor.node {
            SqlNode::Column { table, .. } => table.clone(),
            _ => None,
        };
        ColumnDescriptor {
            data_row_key: descriptor
                .data_row_key
                .clone()
                .unwrap_or_else(|| name.clone()),
            name,
            jdbc_type,
            host_type: descriptor
                .host_type
                .clone()
                .unwrap_or_else(|| host_type_for_jdbc(jdbc_type).to_string()),
            table_alias,
            attribute: descriptor.attribute.as_ref().map(|a| a.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResultGroup {
    Entity { entity: String },
    Embedded { embeddable: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResult {
    pub property: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResult {
    pub entity: String,
    pub fields: Vec<FieldResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedResult {
    pub embeddable: String,
    pub fields: Vec<FieldResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResultComponent {
    Entity(EntityResult),
    Embedded(EmbeddedResult),
    Scalar { column: String },
}

/// Maps the flat SELECT list back onto the shapes the caller asked for, in
/// the order the columns were requested.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SqlResultMapping {
    pub components: Vec<ResultComponent>,
}

impl SqlResultMapping {
    pub fn entity_results(&self) -> impl Iterator<Item = &EntityResult> {
        self.components.iter().filter_map(|c| match c {
            ResultComponent::Entity(e) => Some(e),
            _ => None,
        })
    }
}
