//! Explicit column lists: aggregates, GROUP BY and HAVING, generated column
//! labels and the result set mapping

#[cfg(test)]
mod result_column_tests {
    use selectgraph::entity_catalog::JdbcType;
    use selectgraph::query::Property;
    use selectgraph::translator::result::{EmbeddedResult, EntityResult, FieldResult};
    use selectgraph::translator::{
        ErrorCategory, ResultComponent, SqlResultMapping, TranslationWarning,
    };
    use selectgraph::{
        Expression, Ordering, SelectQuery, SelectTranslator, TranslatorConfig, Value,
    };

    use crate::fixtures::{gallery_catalog, translate};

    fn field(property: &str, column: &str) -> FieldResult {
        FieldResult {
            property: property.to_string(),
            column: column.to_string(),
        }
    }

    #[test]
    fn test_aggregate_column_groups_by_the_rest() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist").columns(vec![
            Property::scalar(Expression::obj_path("artistName")),
            Property::scalar(Expression::count_all()),
        ]);
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.ARTIST_NAME, COUNT(*) AS __c0 FROM ARTIST t0 GROUP BY t0.ARTIST_NAME"
        );

        let name = &translation.columns[0];
        assert_eq!(name.name, "ARTIST_NAME");
        assert_eq!(name.data_row_key, "artistName");
        assert_eq!(name.jdbc_type, JdbcType::VarChar);

        let count = &translation.columns[1];
        assert_eq!(count.name, "__c0");
        assert_eq!(count.data_row_key, "COUNT(*)");
        assert_eq!(count.jdbc_type, JdbcType::Other);
        assert_eq!(count.table_alias, None);
    }

    #[test]
    fn test_aggregate_ordering_alone_groups() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .columns(vec![Property::scalar(Expression::obj_path("artistName"))])
            .order_by(Ordering::desc(Expression::count_all()));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.ARTIST_NAME, COUNT(*) FROM ARTIST t0 GROUP BY t0.ARTIST_NAME \
             ORDER BY COUNT(*) DESC"
        );
        // the ordering column stays out of the data row
        assert_eq!(translation.columns.len(), 1);
    }

    #[test]
    fn test_declared_column_type_wins() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist").columns(vec![Property::scalar(
            Expression::count_all(),
        )
        .with_type("java.lang.Long")]);
        let translation = translate(&catalog, &query);

        assert_eq!(translation.sql, "SELECT COUNT(*) AS __c0 FROM ARTIST t0");
        assert_eq!(translation.columns[0].jdbc_type, JdbcType::BigInt);
        assert_eq!(translation.columns[0].host_type, "java.lang.Long");
    }

    #[test]
    fn test_generated_prefix_is_configurable() {
        let catalog = gallery_catalog();
        let config = TranslatorConfig {
            generated_column_prefix: "col_".to_string(),
            ..Default::default()
        };
        let query = SelectQuery::object("Artist").columns(vec![
            Property::scalar(Expression::count_all()),
            Property::scalar(Expression::aggregate(
                "max",
                vec![Expression::obj_path("dateOfBirth")],
            )),
        ]);
        let translation = SelectTranslator::new(&catalog, &config)
            .translate(&query)
            .unwrap();

        assert_eq!(
            translation.sql,
            "SELECT COUNT(*) AS col_0, MAX(t0.DATE_OF_BIRTH) AS col_1 FROM ARTIST t0"
        );
    }

    #[test]
    fn test_aliased_column_keeps_its_alias() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .columns(vec![Property::scalar(Expression::obj_path("artistName")).alias("name")]);
        let translation = translate(&catalog, &query);

        assert_eq!(translation.sql, "SELECT t0.ARTIST_NAME AS name FROM ARTIST t0");
        assert_eq!(translation.columns[0].name, "name");
        assert_eq!(translation.columns[0].data_row_key, "name");
    }

    #[test]
    fn test_having_with_aggregates() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .columns(vec![
                Property::scalar(Expression::obj_path("artistName")),
                Property::scalar(Expression::count_all()),
            ])
            .having(Expression::count_all().greater_than(Expression::scalar(1)));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.ARTIST_NAME, COUNT(*) AS __c0 FROM ARTIST t0 \
             GROUP BY t0.ARTIST_NAME HAVING COUNT(*) > ?"
        );
        assert_eq!(translation.bindings[0].value, Value::Int(1));
    }

    #[test]
    fn test_having_without_aggregates_is_ignored() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .columns(vec![Property::scalar(Expression::obj_path("artistName"))])
            .having(Expression::obj_path("artistName").like("A%"));
        let translation = translate(&catalog, &query);

        assert!(!translation.sql.contains("HAVING"));
        assert_eq!(translation.warnings, vec![TranslationWarning::HavingIgnored]);
    }

    #[test]
    fn test_related_full_object_column() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting")
            .columns(vec![Property::full_object(Expression::obj_path("toArtist"))]);
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t1.ARTIST_NAME, t1.DATE_OF_BIRTH, t1.ARTIST_ID FROM PAINTING t0 \
             LEFT JOIN ARTIST t1 ON t0.ARTIST_ID = t1.ARTIST_ID"
        );
        // related objects read their row without the path prefix
        assert_eq!(translation.columns[0].data_row_key, "ARTIST_NAME");
    }

    #[test]
    fn test_to_many_relationship_column_is_rejected() {
        let catalog = gallery_catalog();
        let config = TranslatorConfig::default();
        let query = SelectQuery::object("Artist")
            .columns(vec![Property::scalar(Expression::obj_path("paintingArray"))]);
        let err = SelectTranslator::new(&catalog, &config)
            .translate(&query)
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::InvalidQuery);
    }

    #[test]
    fn test_result_mapping_for_entity_and_scalar() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .columns(vec![
                Property::full_object(Expression::FullObject(None)),
                Property::scalar(Expression::count_all()),
            ])
            .with_result_set_mapping();
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID, COUNT(*) AS __c0 \
             FROM ARTIST t0 GROUP BY t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID"
        );
        assert_eq!(
            translation.result_mapping,
            Some(SqlResultMapping {
                components: vec![
                    ResultComponent::Entity(EntityResult {
                        entity: "Artist".to_string(),
                        fields: vec![
                            field("ARTIST_NAME", "ARTIST_NAME"),
                            field("DATE_OF_BIRTH", "DATE_OF_BIRTH"),
                            field("ARTIST_ID", "ARTIST_ID"),
                        ],
                    }),
                    ResultComponent::Scalar {
                        column: "__c0".to_string()
                    },
                ],
            })
        );
    }

    #[test]
    fn test_result_mapping_for_embedded_column() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Gallery")
            .columns(vec![
                Property::embedded(Expression::obj_path("address")),
                Property::scalar(Expression::obj_path("galleryName")),
            ])
            .with_result_set_mapping();
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.GALLERY_STREET, t0.GALLERY_CITY, t0.GALLERY_NAME FROM GALLERY t0"
        );
        let mapping = translation.result_mapping.unwrap();
        assert_eq!(
            mapping.components[0],
            ResultComponent::Embedded(EmbeddedResult {
                embeddable: "Address".to_string(),
                fields: vec![
                    field("address.street", "GALLERY_STREET"),
                    field("address.city", "GALLERY_CITY"),
                ],
            })
        );
        assert_eq!(
            mapping.components[1],
            ResultComponent::Scalar {
                column: "GALLERY_NAME".to_string()
            }
        );
    }

    #[test]
    fn test_no_mapping_unless_requested() {
        let catalog = gallery_catalog();
        let translation = translate(&catalog, &SelectQuery::object("Artist"));
        assert!(translation.result_mapping.is_none());
    }
}
