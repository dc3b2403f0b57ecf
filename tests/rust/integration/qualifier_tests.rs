//! WHERE clause translation: operators, parameter binding, multi-column
//! matches, EXISTS expansion and entity qualifiers

#[cfg(test)]
mod qualifier_tests {
    use std::collections::BTreeMap;

    use selectgraph::entity_catalog::JdbcType;
    use selectgraph::expression::{ArithmeticOp, EmbeddedValue, ObjectId};
    use selectgraph::query::Property;
    use selectgraph::translator::{ErrorCategory, TranslatorError};
    use selectgraph::{Expression, SelectQuery, SelectTranslator, TranslatorConfig, Value};
    use test_case::test_case;

    use crate::fixtures::{gallery_catalog, order_catalog, staff_catalog, translate};

    const ARTIST_COLUMNS: &str =
        "SELECT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID FROM ARTIST t0";

    fn where_clause(query: SelectQuery) -> String {
        let catalog = gallery_catalog();
        let sql = translate(&catalog, &query).sql;
        match sql.split_once(" WHERE ") {
            Some((_, clause)) => clause.to_string(),
            None => panic!("no WHERE clause in `{}`", sql),
        }
    }

    fn artist_name() -> Expression {
        Expression::obj_path("artistName")
    }

    fn translation_error(query: SelectQuery) -> TranslatorError {
        let catalog = gallery_catalog();
        let config = TranslatorConfig::default();
        SelectTranslator::new(&catalog, &config)
            .translate(&query)
            .expect_err("translation should fail")
    }

    #[test_case(artist_name().equal_to(Expression::scalar("X")), "t0.ARTIST_NAME = ?" ; "equal")]
    #[test_case(artist_name().not_equal_to(Expression::scalar("X")), "t0.ARTIST_NAME <> ?" ; "not equal")]
    #[test_case(artist_name().less_than(Expression::scalar("X")), "t0.ARTIST_NAME < ?" ; "less than")]
    #[test_case(artist_name().greater_or_equal(Expression::scalar("X")), "t0.ARTIST_NAME >= ?" ; "greater or equal")]
    #[test_case(artist_name().equal_to(Expression::Scalar(Value::Null)), "t0.ARTIST_NAME IS NULL" ; "equal null")]
    #[test_case(artist_name().not_equal_to(Expression::Scalar(Value::Null)), "t0.ARTIST_NAME IS NOT NULL" ; "not equal null")]
    #[test_case(artist_name().like("A%"), "t0.ARTIST_NAME LIKE ?" ; "like")]
    #[test_case(artist_name().like_ignore_case("a%"), "UPPER(t0.ARTIST_NAME) LIKE UPPER(?)" ; "like ignore case")]
    #[test_case(artist_name().in_values(vec![]), "1=0" ; "empty in")]
    #[test_case(artist_name().not_in_values(vec![]), "1=1" ; "empty not in")]
    #[test_case(artist_name().in_values(vec!["A".into(), "B".into()]), "t0.ARTIST_NAME IN (?, ?)" ; "in list")]
    fn test_operator_translation(qualifier: Expression, expected: &str) {
        assert_eq!(
            where_clause(SelectQuery::object("Artist").where_(qualifier)),
            expected
        );
    }

    #[test]
    fn test_values_are_bound_with_sibling_column_type() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .where_(artist_name().in_values(vec!["Monet".into(), "Manet".into()]));
        let translation = translate(&catalog, &query);

        let values: Vec<&Value> = translation.bindings.iter().map(|b| &b.value).collect();
        assert_eq!(values, vec![&Value::from("Monet"), &Value::from("Manet")]);
        for binding in &translation.bindings {
            assert_eq!(binding.jdbc_type, JdbcType::VarChar);
            assert_eq!(
                binding.attribute.as_ref().map(|a| a.name.as_str()),
                Some("ARTIST_NAME")
            );
        }
    }

    #[test]
    fn test_or_inside_and_keeps_its_parentheses() {
        let query = SelectQuery::object("Artist")
            .where_(Expression::or(vec![
                artist_name().equal_to(Expression::scalar("A")),
                artist_name().equal_to(Expression::scalar("B")),
            ]))
            .where_(Expression::obj_path("dateOfBirth").equal_to(Expression::Scalar(Value::Null)));

        assert_eq!(
            where_clause(query),
            "(t0.ARTIST_NAME = ? OR t0.ARTIST_NAME = ?) AND t0.DATE_OF_BIRTH IS NULL"
        );
    }

    #[test]
    fn test_between_binds_both_bounds() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting")
            .columns(vec![Property::scalar(Expression::obj_path("paintingTitle"))])
            .where_(
                Expression::obj_path("estimatedPrice")
                    .between(Expression::scalar(100), Expression::scalar(200)),
            );
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.PAINTING_TITLE FROM PAINTING t0 \
             WHERE t0.ESTIMATED_PRICE BETWEEN ? AND ?"
        );
        assert!(translation
            .bindings
            .iter()
            .all(|b| b.jdbc_type == JdbcType::Decimal));
    }

    #[test]
    fn test_arithmetic_operand_is_not_parenthesized_under_comparison() {
        let query = SelectQuery::object("Painting")
            .columns(vec![Property::scalar(Expression::obj_path("paintingTitle"))])
            .where_(
                Expression::arithmetic(
                    ArithmeticOp::Multiply,
                    vec![Expression::obj_path("estimatedPrice"), Expression::scalar(2)],
                )
                .greater_than(Expression::scalar(1000)),
            );

        assert_eq!(where_clause(query), "t0.ESTIMATED_PRICE * ? > ?");
    }

    #[test]
    fn test_array_outside_in_is_rejected() {
        let query = SelectQuery::object("Artist").where_(
            artist_name().equal_to(Expression::Scalar(Value::Array(vec!["A".into()]))),
        );
        let err = translation_error(query);

        assert!(matches!(err.root_cause(), TranslatorError::ArrayArgument(_)));
        assert_eq!(err.category(), ErrorCategory::InvalidQuery);
    }

    #[test]
    fn test_unknown_property_is_unresolved() {
        let query = SelectQuery::object("Artist")
            .where_(Expression::obj_path("nickname").equal_to(Expression::scalar("X")));
        let err = translation_error(query);

        assert_eq!(err.category(), ErrorCategory::Unresolved);
        assert!(matches!(
            err.root_cause(),
            TranslatorError::UnresolvedPath { segment, .. } if segment == "nickname"
        ));
    }

    #[test]
    fn test_to_one_object_id_uses_foreign_key_without_join() {
        let catalog = gallery_catalog();
        let artist = ObjectId::new("Artist").with("ARTIST_ID", 5i64);
        let query = SelectQuery::object("Painting")
            .columns(vec![Property::scalar(Expression::obj_path("paintingTitle"))])
            .where_(Expression::obj_path("toArtist").equal_to(Expression::scalar(artist)));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.PAINTING_TITLE FROM PAINTING t0 WHERE t0.ARTIST_ID = ?"
        );
        assert!(!translation.has_joins);
        assert_eq!(translation.bindings[0].value, Value::Int(5));
        assert_eq!(translation.bindings[0].jdbc_type, JdbcType::BigInt);
    }

    #[test]
    fn test_composite_object_id_matches_each_foreign_key_column() {
        let catalog = order_catalog();
        let order = ObjectId::new("Order")
            .with("REGION", "EU")
            .with("ORDER_NO", 42i64);
        let query = SelectQuery::object("LineItem")
            .columns(vec![Property::scalar(Expression::obj_path("sku"))])
            .where_(Expression::obj_path("order").equal_to(Expression::scalar(order)));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.SKU FROM LINE_ITEM t0 WHERE t0.ORDER_REGION = ? AND t0.ORDER_NO = ?"
        );
        assert!(!translation.has_joins);
        let values: Vec<Value> = translation.bindings.iter().map(|b| b.value.clone()).collect();
        assert_eq!(values, vec![Value::from("EU"), Value::Int(42)]);
        assert_eq!(translation.bindings[0].jdbc_type, JdbcType::Char);
    }

    #[test]
    fn test_composite_object_id_not_equal_is_any_column() {
        let catalog = order_catalog();
        let order = ObjectId::new("Order")
            .with("REGION", "EU")
            .with("ORDER_NO", 42i64);
        let query = SelectQuery::object("LineItem")
            .columns(vec![Property::scalar(Expression::obj_path("sku"))])
            .where_(Expression::obj_path("order").not_equal_to(Expression::scalar(order)));
        let translation = translate(&catalog, &query);

        assert!(translation
            .sql
            .ends_with("WHERE t0.ORDER_REGION <> ? OR t0.ORDER_NO <> ?"));
    }

    #[test]
    fn test_multi_column_id_against_single_column_is_rejected() {
        let id = ObjectId::new("Artist")
            .with("ARTIST_ID", 5i64)
            .with("ARTIST_NAME", "Monet");
        let query = SelectQuery::object("Painting")
            .where_(Expression::obj_path("toArtist").equal_to(Expression::scalar(id)));
        let err = translation_error(query);

        assert!(matches!(err.root_cause(), TranslatorError::InvalidQuery(_)));
    }

    #[test]
    fn test_embedded_value_matches_every_column() {
        let catalog = gallery_catalog();
        let mut properties = BTreeMap::new();
        properties.insert("city".to_string(), Value::from("Paris"));
        let address = Value::Embedded(EmbeddedValue {
            embeddable: "Address".to_string(),
            properties,
        });
        let query = SelectQuery::object("Gallery")
            .where_(Expression::obj_path("address").equal_to(Expression::Scalar(address)));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.GALLERY_NAME, t0.GALLERY_STREET, t0.GALLERY_CITY, t0.GALLERY_ID \
             FROM GALLERY t0 WHERE t0.GALLERY_STREET IS NULL AND t0.GALLERY_CITY = ?"
        );
        assert_eq!(translation.bindings.len(), 1);
    }

    #[test]
    fn test_embedded_property_path() {
        let query = SelectQuery::object("Gallery")
            .where_(Expression::obj_path("address.city").equal_to(Expression::scalar("Paris")));
        assert_eq!(where_clause(query), "t0.GALLERY_CITY = ?");
    }

    #[test]
    fn test_exists_over_path_becomes_correlated_subquery() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist").where_(Expression::exists(
            Expression::obj_path("paintingArray.paintingTitle").like("A%"),
        ));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            format!(
                "{} WHERE EXISTS (SELECT t1.PAINTING_ID FROM PAINTING t1 \
                 WHERE t1.ARTIST_ID = t0.ARTIST_ID AND t1.PAINTING_TITLE LIKE ?)",
                ARTIST_COLUMNS
            )
        );
        assert_eq!(translation.bindings.len(), 1);
        assert_eq!(translation.bindings[0].value, Value::from("A%"));
        // the subquery joins nothing into the outer statement
        assert!(!translation.has_joins);
    }

    #[test]
    fn test_exists_keeps_each_relationship_in_its_own_subquery() {
        let query = SelectQuery::object("Painting").where_(Expression::exists(Expression::and(
            vec![
                Expression::obj_path("toArtist.artistName").equal_to(Expression::scalar("X")),
                Expression::obj_path("toGallery.galleryName").equal_to(Expression::scalar("Y")),
            ],
        )));

        assert_eq!(
            where_clause(query),
            "EXISTS (SELECT t2.ARTIST_ID FROM ARTIST t2 \
             WHERE t2.ARTIST_ID = t0.ARTIST_ID AND t2.ARTIST_NAME = ?) \
             AND EXISTS (SELECT t3.GALLERY_ID FROM GALLERY t3 \
             WHERE t3.GALLERY_ID = t0.GALLERY_ID AND t3.GALLERY_NAME = ?)"
        );
    }

    #[test]
    fn test_not_exists_over_bare_relationship() {
        let query = SelectQuery::object("Artist")
            .where_(Expression::not_exists(Expression::obj_path("paintingArray")));

        assert_eq!(
            where_clause(query),
            "NOT EXISTS (SELECT t1.PAINTING_ID FROM PAINTING t1 WHERE t1.ARTIST_ID = t0.ARTIST_ID)"
        );
    }

    #[test]
    fn test_explicit_subquery_reads_enclosing_columns() {
        let paintings = SelectQuery::db("PAINTING").where_(
            Expression::db_path("ARTIST_ID")
                .equal_to(Expression::enclosing(Expression::db_path("ARTIST_ID"))),
        );
        let query = SelectQuery::object("Artist")
            .where_(Expression::exists(Expression::subquery(paintings)));

        assert_eq!(
            where_clause(query),
            "EXISTS (SELECT t1.PAINTING_ID FROM PAINTING t1 WHERE t1.ARTIST_ID = t0.ARTIST_ID)"
        );
    }

    #[test]
    fn test_in_subquery_with_explicit_columns() {
        let titles = SelectQuery::db("PAINTING")
            .columns(vec![Property::scalar(Expression::db_path("PAINTING_TITLE"))]);
        let query = SelectQuery::object("Artist").where_(Expression::In {
            operand: Box::new(artist_name()),
            values: Box::new(Expression::subquery(titles)),
            not: false,
        });

        assert_eq!(
            where_clause(query),
            "t0.ARTIST_NAME IN (SELECT t1.PAINTING_TITLE FROM PAINTING t1)"
        );
    }

    #[test]
    fn test_enclosing_reference_outside_subquery_is_rejected() {
        let query = SelectQuery::object("Artist").where_(
            Expression::enclosing(artist_name()).equal_to(Expression::scalar("X")),
        );
        let err = translation_error(query);

        assert!(matches!(err.root_cause(), TranslatorError::InvalidQuery(_)));
    }

    #[test]
    fn test_inheritance_qualifier_is_applied_to_root() {
        let catalog = staff_catalog();
        let translation = translate(&catalog, &SelectQuery::object("Manager"));

        assert_eq!(
            translation.sql,
            "SELECT t0.NAME, t0.PERSON_TYPE, t0.DEPT_ID, t0.PERSON_ID FROM PERSON t0 \
             WHERE t0.PERSON_TYPE = ?"
        );
        assert_eq!(translation.bindings[0].value, Value::from("M"));
        assert_eq!(translation.bindings[0].jdbc_type, JdbcType::Char);
    }

    #[test]
    fn test_inner_joined_entity_qualifier_goes_to_where() {
        let catalog = staff_catalog();
        let query = SelectQuery::object("Manager")
            .where_(Expression::obj_path("department.name").equal_to(Expression::scalar("R&D")));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.NAME, t0.PERSON_TYPE, t0.DEPT_ID, t0.PERSON_ID FROM PERSON t0 \
             JOIN DEPT t1 ON t0.DEPT_ID = t1.DEPT_ID \
             WHERE t1.NAME = ? AND t0.PERSON_TYPE = ? AND t1.ACTIVE = ?"
        );
        let values: Vec<Value> = translation.bindings.iter().map(|b| b.value.clone()).collect();
        assert_eq!(values, vec![Value::from("R&D"), Value::from("M"), Value::Bool(true)]);
    }

    #[test]
    fn test_outer_joined_entity_qualifier_goes_to_join_condition() {
        let catalog = staff_catalog();
        let query = SelectQuery::object("Manager")
            .where_(Expression::obj_path("department+.name").equal_to(Expression::scalar("R&D")));
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.NAME, t0.PERSON_TYPE, t0.DEPT_ID, t0.PERSON_ID FROM PERSON t0 \
             LEFT JOIN DEPT t1 ON t0.DEPT_ID = t1.DEPT_ID AND t1.ACTIVE = ? \
             WHERE t1.NAME = ? AND t0.PERSON_TYPE = ?"
        );
        // ON bindings come first, in text order
        assert_eq!(translation.bindings[0].value, Value::Bool(true));
        assert_eq!(translation.bindings[0].jdbc_type, JdbcType::Boolean);
    }
}
