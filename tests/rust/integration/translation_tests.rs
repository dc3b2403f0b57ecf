//! Statement shape: FROM and JOIN layout, DISTINCT, ordering and paging

#[cfg(test)]
mod translation_tests {
    use selectgraph::entity_catalog::JdbcType;
    use selectgraph::translator::TranslationWarning;
    use selectgraph::{Expression, Ordering, SelectQuery, TranslatorConfig, Value};
    use test_case::test_case;

    use crate::fixtures::{gallery_catalog, translate, translate_with};

    #[test]
    fn test_object_query_selects_descriptor_columns() {
        let catalog = gallery_catalog();
        let translation = translate(&catalog, &SelectQuery::object("Artist"));

        assert_eq!(
            translation.sql,
            "SELECT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID FROM ARTIST t0"
        );
        assert!(translation.bindings.is_empty());
        assert!(!translation.has_joins);

        let keys: Vec<&str> = translation
            .columns
            .iter()
            .map(|c| c.data_row_key.as_str())
            .collect();
        assert_eq!(keys, vec!["ARTIST_NAME", "DATE_OF_BIRTH", "ARTIST_ID"]);
        assert_eq!(translation.columns[1].jdbc_type, JdbcType::Date);
        assert_eq!(translation.columns[0].table_alias.as_deref(), Some("t0"));
    }

    #[test]
    fn test_db_entity_query_selects_every_column() {
        let catalog = gallery_catalog();
        let translation = translate(&catalog, &SelectQuery::db("ARTIST"));

        assert_eq!(
            translation.sql,
            "SELECT t0.ARTIST_ID, t0.ARTIST_NAME, t0.DATE_OF_BIRTH FROM ARTIST t0"
        );
    }

    #[test]
    fn test_flattened_attribute_is_outer_joined() {
        let catalog = gallery_catalog();
        let translation = translate(&catalog, &SelectQuery::object("Painting"));

        assert_eq!(
            translation.sql,
            "SELECT t0.PAINTING_TITLE, t0.ESTIMATED_PRICE, t1.GALLERY_ID, t1.GALLERY_NAME, \
             t0.ARTIST_ID, t0.GALLERY_ID, t0.PAINTING_ID FROM PAINTING t0 \
             LEFT JOIN GALLERY t1 ON t0.GALLERY_ID = t1.GALLERY_ID"
        );
        assert!(translation.has_joins);
        assert_eq!(translation.columns[2].data_row_key, "toGallery.GALLERY_ID");
        assert_eq!(translation.columns[3].data_row_key, "toGallery.GALLERY_NAME");
        assert_eq!(translation.columns[3].table_alias.as_deref(), Some("t1"));
        assert_eq!(translation.columns[5].data_row_key, "GALLERY_ID");
        assert_eq!(translation.columns[5].table_alias.as_deref(), Some("t0"));
    }

    #[test]
    fn test_flattened_attribute_compares_one_column() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting")
            .where_(Expression::obj_path("galleryName").equal_to(Expression::scalar("Louvre")));
        let translation = translate(&catalog, &query);

        assert!(translation
            .sql
            .contains("JOIN GALLERY t2 ON t0.GALLERY_ID = t2.GALLERY_ID"));
        assert!(translation.sql.ends_with("WHERE t2.GALLERY_NAME = ?"));
        assert_eq!(translation.bindings.len(), 1);
        assert_eq!(translation.bindings[0].value, Value::from("Louvre"));
    }

    #[test]
    fn test_to_one_path_in_qualifier_adds_inner_join() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting").where_(
            Expression::obj_path("toArtist.artistName").equal_to(Expression::scalar("Picasso")),
        );
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.PAINTING_TITLE, t0.ESTIMATED_PRICE, t1.GALLERY_ID, t1.GALLERY_NAME, \
             t0.ARTIST_ID, t0.GALLERY_ID, t0.PAINTING_ID FROM PAINTING t0 \
             LEFT JOIN GALLERY t1 ON t0.GALLERY_ID = t1.GALLERY_ID \
             JOIN ARTIST t2 ON t0.ARTIST_ID = t2.ARTIST_ID \
             WHERE t2.ARTIST_NAME = ?"
        );
        assert_eq!(translation.bindings.len(), 1);
        assert_eq!(translation.bindings[0].value, Value::from("Picasso"));
        assert_eq!(translation.bindings[0].jdbc_type, JdbcType::VarChar);
    }

    #[test]
    fn test_same_path_twice_shares_one_join() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting")
            .where_(Expression::obj_path("toArtist.artistName").like("P%"))
            .where_(
                Expression::obj_path("toArtist.dateOfBirth")
                    .equal_to(Expression::Scalar(Value::Null))
                    .not(),
            );
        let translation = translate(&catalog, &query);

        assert_eq!(translation.sql.matches("JOIN ARTIST").count(), 1);
        assert!(translation
            .sql
            .ends_with("WHERE t2.ARTIST_NAME LIKE ? AND NOT t2.DATE_OF_BIRTH IS NULL"));
    }

    #[test]
    fn test_to_many_path_turns_on_distinct() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist").where_(
            Expression::obj_path("paintingArray.paintingTitle").equal_to(Expression::scalar("X")),
        );
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT DISTINCT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID FROM ARTIST t0 \
             JOIN PAINTING t1 ON t0.ARTIST_ID = t1.ARTIST_ID WHERE t1.PAINTING_TITLE = ?"
        );
    }

    #[test]
    fn test_suppress_distinct_keeps_duplicates() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .where_(
                Expression::obj_path("paintingArray.paintingTitle")
                    .equal_to(Expression::scalar("X")),
            )
            .suppress_distinct();
        let translation = translate(&catalog, &query);

        assert!(translation.sql.starts_with("SELECT t0.ARTIST_NAME"));
        assert!(!translation.distinct_suppressed);
    }

    #[test]
    fn test_distinct_is_suppressed_by_unsupported_column_type() {
        let catalog = gallery_catalog();
        let config = TranslatorConfig {
            distinct_unsupported_types: vec![JdbcType::Date],
            ..Default::default()
        };
        let translation =
            translate_with(&catalog, &config, &SelectQuery::object("Artist").distinct());

        assert!(!translation.sql.contains("DISTINCT"));
        assert!(translation.distinct_suppressed);
        assert_eq!(
            translation.warnings,
            vec![TranslationWarning::DistinctSuppressed {
                column: "ARTIST.DATE_OF_BIRTH".to_string()
            }]
        );
    }

    #[test]
    fn test_path_aliases_split_joins() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .alias_path("p1", "paintingArray")
            .alias_path("p2", "paintingArray")
            .where_(Expression::obj_path("p1.paintingTitle").equal_to(Expression::scalar("A")))
            .where_(Expression::obj_path("p2.paintingTitle").equal_to(Expression::scalar("B")));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT DISTINCT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID FROM ARTIST t0 \
             JOIN PAINTING t1 ON t0.ARTIST_ID = t1.ARTIST_ID \
             JOIN PAINTING t2 ON t0.ARTIST_ID = t2.ARTIST_ID \
             WHERE t1.PAINTING_TITLE = ? AND t2.PAINTING_TITLE = ?"
        );
    }

    #[test]
    fn test_paginated_query_selects_ids_only() {
        let catalog = gallery_catalog();
        let translation = translate(&catalog, &SelectQuery::object("Artist").page_size(20));

        assert_eq!(translation.sql, "SELECT t0.ARTIST_ID FROM ARTIST t0");
        assert_eq!(translation.columns.len(), 1);
    }

    #[test]
    fn test_limit_and_offset() {
        let catalog = gallery_catalog();
        let query = SelectQuery::db("ARTIST").limit(10).offset(20);
        let translation = translate(&catalog, &query);

        assert!(translation.sql.ends_with("FROM ARTIST t0 LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn test_zero_limit_is_no_limit() {
        let catalog = gallery_catalog();
        let translation = translate(&catalog, &SelectQuery::db("ARTIST").limit(0));
        assert!(!translation.sql.contains("LIMIT"));
    }

    #[test]
    fn test_descending_ordering() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .order_by(Ordering::desc(Expression::obj_path("artistName")))
            .order_by(Ordering::asc(Expression::obj_path("dateOfBirth")));
        let translation = translate(&catalog, &query);

        assert!(translation
            .sql
            .ends_with("FROM ARTIST t0 ORDER BY t0.ARTIST_NAME DESC, t0.DATE_OF_BIRTH"));
    }

    #[test]
    fn test_case_insensitive_ordering_under_distinct_adds_hidden_column() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .distinct()
            .order_by(Ordering::asc(Expression::obj_path("artistName")).ignore_case());
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT DISTINCT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID, \
             UPPER(t0.ARTIST_NAME) FROM ARTIST t0 ORDER BY UPPER(t0.ARTIST_NAME)"
        );
        // the hidden column is not part of the data row
        assert_eq!(translation.columns.len(), 3);
    }

    #[test]
    fn test_ordering_on_selected_column_adds_nothing() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .distinct()
            .order_by(Ordering::asc(Expression::obj_path("artistName")));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT DISTINCT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID FROM ARTIST t0 \
             ORDER BY t0.ARTIST_NAME"
        );
    }

    #[test]
    fn test_ordering_through_to_many_join_is_selected() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .order_by(Ordering::asc(Expression::obj_path("paintingArray.paintingTitle")));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT DISTINCT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID, t1.PAINTING_TITLE \
             FROM ARTIST t0 JOIN PAINTING t1 ON t0.ARTIST_ID = t1.ARTIST_ID \
             ORDER BY t1.PAINTING_TITLE"
        );
        assert_eq!(translation.columns.len(), 3);
    }

    #[test_case("UPPER", "UPPER(t0.ARTIST_NAME)" ; "default function")]
    #[test_case("LOWER", "LOWER(t0.ARTIST_NAME)" ; "configured function")]
    fn test_case_insensitive_function_is_configurable(function: &str, expected: &str) {
        let catalog = gallery_catalog();
        let config = TranslatorConfig {
            case_insensitive_function: function.to_string(),
            ..Default::default()
        };
        let query = SelectQuery::object("Artist")
            .order_by(Ordering::asc(Expression::obj_path("artistName")).ignore_case());
        let translation = translate_with(&catalog, &config, &query);

        assert!(translation.sql.ends_with(&format!("ORDER BY {}", expected)));
    }

    #[test]
    fn test_translation_is_repeatable() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting")
            .where_(Expression::obj_path("toArtist.artistName").like("A%"))
            .order_by(Ordering::asc(Expression::obj_path("paintingTitle")));

        assert_eq!(translate(&catalog, &query), translate(&catalog, &query));
    }

    #[test]
    fn test_json_summary() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .where_(Expression::obj_path("artistName").equal_to(Expression::scalar("Dali")));
        let translation = translate(&catalog, &query);
        let json = translation.to_json().unwrap();

        assert_eq!(json["sql"], translation.sql.as_str());
        assert_eq!(json["bindings"][0]["jdbc_type"], "VARCHAR");
        assert_eq!(json["columns"][0]["data_row_key"], "ARTIST_NAME");
        assert_eq!(json["has_joins"], false);
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }
}
