//! Prefetch handling: joint prefetches spliced into the root columns,
//! disjoint-by-id id columns and the limit policy

#[cfg(test)]
mod prefetch_tests {
    use selectgraph::query::Property;
    use selectgraph::translator::{TranslationWarning, TranslatorError};
    use selectgraph::{
        Expression, PrefetchLimitPolicy, PrefetchSemantics, SelectQuery, SelectTranslator,
        TranslatorConfig, Value,
    };

    use crate::fixtures::{gallery_catalog, staff_catalog, translate};

    fn keys(translation: &selectgraph::SelectTranslation) -> Vec<String> {
        translation
            .columns
            .iter()
            .map(|c| c.data_row_key.clone())
            .collect()
    }

    #[test]
    fn test_joint_to_many_prefetch_is_outer_joined() {
        let catalog = gallery_catalog();
        let query =
            SelectQuery::object("Artist").prefetch("paintingArray", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT DISTINCT t0.ARTIST_NAME, t0.DATE_OF_BIRTH, t0.ARTIST_ID, \
             t1.PAINTING_TITLE, t1.ESTIMATED_PRICE, t2.GALLERY_ID, t2.GALLERY_NAME, \
             t1.ARTIST_ID, t1.GALLERY_ID, t1.PAINTING_ID FROM ARTIST t0 \
             LEFT JOIN PAINTING t1 ON t0.ARTIST_ID = t1.ARTIST_ID \
             LEFT JOIN GALLERY t2 ON t1.GALLERY_ID = t2.GALLERY_ID"
        );
        assert_eq!(
            keys(&translation),
            vec![
                "ARTIST_NAME",
                "DATE_OF_BIRTH",
                "ARTIST_ID",
                "paintingArray.PAINTING_TITLE",
                "paintingArray.ESTIMATED_PRICE",
                "paintingArray.toGallery.GALLERY_ID",
                "paintingArray.toGallery.GALLERY_NAME",
                "paintingArray.ARTIST_ID",
                "paintingArray.GALLERY_ID",
                "paintingArray.PAINTING_ID",
            ]
        );
    }

    #[test]
    fn test_joint_to_one_prefetch_follows_root_columns() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting").prefetch("toArtist", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.PAINTING_TITLE, t0.ESTIMATED_PRICE, t1.GALLERY_ID, t1.GALLERY_NAME, \
             t0.ARTIST_ID, t0.GALLERY_ID, t0.PAINTING_ID, \
             t2.ARTIST_NAME, t2.DATE_OF_BIRTH, t2.ARTIST_ID \
             FROM PAINTING t0 LEFT JOIN GALLERY t1 ON t0.GALLERY_ID = t1.GALLERY_ID \
             LEFT JOIN ARTIST t2 ON t0.ARTIST_ID = t2.ARTIST_ID"
        );
    }

    #[test]
    fn test_root_columns_stay_ahead_of_prefetch_and_custom_columns() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Painting")
            .columns(vec![
                Property::full_object(Expression::FullObject(None)),
                Property::scalar(Expression::obj_path("paintingTitle")).alias("title"),
            ])
            .prefetch("toArtist", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert_eq!(
            keys(&translation),
            vec![
                "PAINTING_TITLE",
                "ESTIMATED_PRICE",
                "toGallery.GALLERY_ID",
                "toGallery.GALLERY_NAME",
                "ARTIST_ID",
                "GALLERY_ID",
                "PAINTING_ID",
                "toArtist.ARTIST_NAME",
                "toArtist.DATE_OF_BIRTH",
                "toArtist.ARTIST_ID",
                "title",
            ]
        );
        assert!(!translation.sql.starts_with("SELECT DISTINCT"));
    }

    #[test]
    fn test_paginated_query_ignores_joint_prefetch() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .page_size(10)
            .prefetch("paintingArray", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert_eq!(translation.sql, "SELECT t0.ARTIST_ID FROM ARTIST t0");
        assert_eq!(keys(&translation), vec!["ARTIST_ID"]);
    }

    #[test]
    fn test_prefetch_join_is_separate_from_qualifier_join() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .where_(
                Expression::obj_path("paintingArray.paintingTitle")
                    .equal_to(Expression::scalar("X")),
            )
            .prefetch("paintingArray", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert!(translation
            .sql
            .contains("LEFT JOIN PAINTING t1 ON t0.ARTIST_ID = t1.ARTIST_ID"));
        assert!(translation
            .sql
            .contains(" JOIN PAINTING t3 ON t0.ARTIST_ID = t3.ARTIST_ID"));
        assert!(translation.sql.ends_with("WHERE t3.PAINTING_TITLE = ?"));
    }

    #[test]
    fn test_joint_prefetch_qualifier_goes_to_join_condition() {
        let catalog = staff_catalog();
        let query = SelectQuery::object("Manager").prefetch("department", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert_eq!(
            translation.sql,
            "SELECT t0.NAME, t0.PERSON_TYPE, t0.DEPT_ID, t0.PERSON_ID, \
             t1.NAME, t1.ACTIVE, t1.DEPT_ID FROM PERSON t0 \
             LEFT JOIN DEPT t1 ON t0.DEPT_ID = t1.DEPT_ID AND t1.ACTIVE = ? \
             WHERE t0.PERSON_TYPE = ?"
        );
        let values: Vec<Value> = translation.bindings.iter().map(|b| b.value.clone()).collect();
        assert_eq!(values, vec![Value::Bool(true), Value::from("M")]);
    }

    #[test]
    fn test_to_many_prefetch_with_limit_warns_by_default() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .prefetch("paintingArray", PrefetchSemantics::Joint)
            .limit(5);
        let translation = translate(&catalog, &query);

        assert!(translation.sql.ends_with("LIMIT 5"));
        assert_eq!(
            translation.warnings,
            vec![TranslationWarning::ToManyPrefetchWithLimit {
                path: "paintingArray".to_string()
            }]
        );
    }

    #[test]
    fn test_to_many_prefetch_with_limit_can_be_rejected() {
        let catalog = gallery_catalog();
        let config = TranslatorConfig {
            prefetch_limit_policy: PrefetchLimitPolicy::Reject,
            ..Default::default()
        };
        let query = SelectQuery::object("Artist")
            .prefetch("paintingArray", PrefetchSemantics::Joint)
            .offset(10);
        let err = SelectTranslator::new(&catalog, &config)
            .translate(&query)
            .unwrap_err();

        assert_eq!(
            err.root_cause(),
            &TranslatorError::PrefetchWithLimit {
                path: "paintingArray".to_string()
            }
        );
    }

    #[test]
    fn test_to_one_prefetch_with_limit_is_fine() {
        let catalog = gallery_catalog();
        let config = TranslatorConfig {
            prefetch_limit_policy: PrefetchLimitPolicy::Reject,
            ..Default::default()
        };
        let query = SelectQuery::object("Painting")
            .prefetch("toArtist", PrefetchSemantics::Joint)
            .limit(5);
        let translation = SelectTranslator::new(&catalog, &config)
            .translate(&query)
            .unwrap();

        assert!(translation.warnings.is_empty());
    }

    #[test]
    fn test_disjoint_by_id_to_one_reads_foreign_key() {
        let catalog = gallery_catalog();
        let query =
            SelectQuery::object("Painting").prefetch("toArtist", PrefetchSemantics::DisjointById);
        let translation = translate(&catalog, &query);

        let last = translation.columns.last().unwrap();
        assert_eq!(last.data_row_key, "toArtist.ARTIST_ID");
        assert_eq!(last.table_alias.as_deref(), Some("t0"));
        // only the flattened galleryName join
        assert_eq!(translation.sql.matches("JOIN").count(), 1);
    }

    #[test]
    fn test_disjoint_by_id_to_many_keeps_roots_without_children() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .prefetch("paintingArray", PrefetchSemantics::DisjointById);
        let translation = translate(&catalog, &query);

        assert!(translation
            .sql
            .contains("FROM ARTIST t0 LEFT JOIN PAINTING t1 ON t0.ARTIST_ID = t1.ARTIST_ID"));
        assert_eq!(
            keys(&translation).last().map(String::as_str),
            Some("paintingArray.PAINTING_ID")
        );
    }

    #[test]
    fn test_disjoint_prefetch_leaves_statement_alone() {
        let catalog = gallery_catalog();
        let plain = translate(&catalog, &SelectQuery::object("Artist"));
        let disjoint = translate(
            &catalog,
            &SelectQuery::object("Artist").prefetch("paintingArray", PrefetchSemantics::Disjoint),
        );

        assert_eq!(plain.sql, disjoint.sql);
    }

    #[test]
    fn test_prefetch_ignored_without_root_object_column() {
        let catalog = gallery_catalog();
        let query = SelectQuery::object("Artist")
            .columns(vec![Property::scalar(Expression::obj_path("artistName"))])
            .prefetch("paintingArray", PrefetchSemantics::Joint);
        let translation = translate(&catalog, &query);

        assert_eq!(translation.sql, "SELECT t0.ARTIST_NAME FROM ARTIST t0");
    }

    #[test]
    fn test_prefetch_of_attribute_is_rejected() {
        let catalog = gallery_catalog();
        let config = TranslatorConfig::default();
        let query = SelectQuery::object("Artist").prefetch("artistName", PrefetchSemantics::Joint);
        let err = SelectTranslator::new(&catalog, &config)
            .translate(&query)
            .unwrap_err();

        assert!(matches!(err.root_cause(), TranslatorError::InvalidQuery(_)));
    }
}
