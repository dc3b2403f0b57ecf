//! Loading catalogs and translator settings from YAML files

#[cfg(test)]
mod catalog_loading_tests {
    use std::io::Write;

    use selectgraph::entity_catalog::CatalogError;
    use selectgraph::{
        EntityCatalogConfig, PrefetchLimitPolicy, PrefetchSemantics, SelectQuery,
        SelectTranslator, TranslatorConfig, TranslatorError,
    };
    use tempfile::NamedTempFile;

    use crate::fixtures::GALLERY_YAML;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_catalog_from_file_translates() {
        let file = yaml_file(GALLERY_YAML);
        let config = EntityCatalogConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("gallery"));

        let catalog = config.to_catalog().unwrap();
        let translator_config = TranslatorConfig::default();
        let translation = SelectTranslator::new(&catalog, &translator_config)
            .translate(&SelectQuery::object("Gallery"))
            .unwrap();

        assert_eq!(
            translation.sql,
            "SELECT t0.GALLERY_NAME, t0.GALLERY_STREET, t0.GALLERY_CITY, t0.GALLERY_ID \
             FROM GALLERY t0"
        );
    }

    #[test]
    fn test_translator_config_from_file() -> anyhow::Result<()> {
        let file = yaml_file(
            "prefetch_limit_policy: reject\n\
             case_insensitive_function: LOWER\n",
        );
        let config = TranslatorConfig::from_yaml_file(file.path())?;

        assert_eq!(config.prefetch_limit_policy, PrefetchLimitPolicy::Reject);
        assert_eq!(config.case_insensitive_function, "LOWER");
        assert_eq!(config.generated_column_prefix, "__c");

        let catalog = EntityCatalogConfig::from_yaml_str(GALLERY_YAML)?.to_catalog()?;
        let err = SelectTranslator::new(&catalog, &config)
            .translate(
                &SelectQuery::object("Artist")
                    .prefetch("paintingArray", PrefetchSemantics::Joint)
                    .limit(1),
            )
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            TranslatorError::PrefetchWithLimit { .. }
        ));
        Ok(())
    }

    #[test]
    fn test_empty_function_name_fails_validation() {
        let result = TranslatorConfig::from_yaml_str("case_insensitive_function: \"\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = EntityCatalogConfig::from_yaml_file(dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(CatalogError::ConfigRead { .. })));
    }

    #[test]
    fn test_malformed_catalog_yaml() {
        let result = EntityCatalogConfig::from_yaml_str("catalog: [not, a, map");
        assert!(matches!(result, Err(CatalogError::ConfigParse { .. })));
    }

    #[test]
    fn test_duplicate_db_entity_is_rejected() {
        let yaml = r#"
catalog:
  db_entities:
    - name: ARTIST
      attributes:
        - { name: ARTIST_ID, type: BIGINT, primary_key: true }
    - name: ARTIST
      attributes:
        - { name: ARTIST_ID, type: BIGINT, primary_key: true }
"#;
        let config = EntityCatalogConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.to_catalog(),
            Err(CatalogError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_relationship_to_unknown_entity_is_rejected() {
        let yaml = r#"
catalog:
  db_entities:
    - name: ARTIST
      attributes:
        - { name: ARTIST_ID, type: BIGINT, primary_key: true }
      relationships:
        - name: paintingArray
          target: PAINTING
          to_many: true
          joins:
            - { source: ARTIST_ID, target: ARTIST_ID }
"#;
        let config = EntityCatalogConfig::from_yaml_str(yaml).unwrap();
        assert!(config.to_catalog().is_err());
    }

    #[test]
    fn test_object_relationship_takes_to_many_from_db_path() {
        let catalog = EntityCatalogConfig::from_yaml_str(GALLERY_YAML)
            .unwrap()
            .to_catalog()
            .unwrap();

        let artist = catalog.obj_entity("Artist").unwrap();
        assert!(artist.relationship("paintingArray").unwrap().to_many);
        let painting = catalog.obj_entity("Painting").unwrap();
        assert!(!painting.relationship("toArtist").unwrap().to_many);
    }
}
