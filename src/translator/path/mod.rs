//! Path resolution against the entity catalog.
//!
//! Resolving a path walks its segments from a starting entity, registers a
//! table-tree join for every relationship hop and reports the db attributes
//! the path ends on. Results are cached per translator context; the cache
//! key carries the path marker, so prefetch paths and plain paths of the same
//! shape resolve independently.

mod db_path;
mod obj_path;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::entity_catalog::{
    DbAttribute, DbEntity, DbRelationship, Embeddable, EntityCatalog, ObjEntity,
};
use crate::expression::{Path, PathSegment};

use super::errors::{TranslatorError, TranslatorResult};
use super::table_tree::TableTree;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathTranslationResult {
    /// Table path the walk ended on.
    pub final_path: Path,
    /// Table path of each entry in `attributes`.
    pub attribute_paths: Vec<Path>,
    pub attributes: Vec<DbAttribute>,
    /// Set when the path ends on a relationship.
    pub relationship: Option<DbRelationship>,
    /// Set when the path ends on a whole embedded attribute.
    pub embeddable: Option<Embeddable>,
    /// The path ended on a to-one relationship and resolved to the source
    /// side foreign key instead of joining the target.
    pub fk_shortcut: bool,
    /// Primary keys of belongs-to targets passed through on the way, with
    /// their table paths, in walk order.
    pub prefetched: Vec<(Path, DbAttribute)>,
}

impl PathTranslationResult {
    pub fn last_attribute(&self) -> Option<&DbAttribute> {
        self.attributes.last()
    }

    pub fn last_attribute_path(&self) -> Option<&Path> {
        self.attribute_paths.last()
    }

    /// Only paths ending on a whole embedded attribute or on a composite
    /// relationship compare column by column.
    pub fn is_multi_column(&self) -> bool {
        self.embeddable.is_some() || (self.relationship.is_some() && self.attributes.len() > 1)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&Path, &DbAttribute)> {
        self.attribute_paths.iter().zip(self.attributes.iter())
    }

    /// Pre-fetched keys followed by the columns the path ends on.
    pub fn all_columns(&self) -> impl Iterator<Item = (&Path, &DbAttribute)> {
        self.prefetched
            .iter()
            .map(|(path, attribute)| (path, attribute))
            .chain(self.columns())
    }
}

/// Borrowed state a path walk needs: the catalog to look entities up in, the
/// table tree to register joins with and the query's path aliases.
pub struct PathScope<'s, 'a> {
    pub catalog: &'a EntityCatalog,
    pub table_tree: &'s mut TableTree<'a>,
    pub aliases: &'s BTreeMap<String, String>,
}

type CacheKey = (String, Path, Path);
type PathCache = Mutex<HashMap<CacheKey, Arc<PathTranslationResult>>>;

#[derive(Debug, Default)]
pub struct PathTranslator {
    obj_cache: PathCache,
    db_cache: PathCache,
}

impl PathTranslator {
    pub fn new() -> Self {
        PathTranslator::default()
    }

    /// Resolves an object path starting at `entity`, below table path
    /// `parent`.
    pub fn translate_obj_path<'a>(
        &self,
        scope: PathScope<'_, 'a>,
        entity: &'a ObjEntity,
        path: &Path,
        parent: &Path,
    ) -> TranslatorResult<Arc<PathTranslationResult>> {
        let key = (entity.name.clone(), path.clone(), parent.clone());
        if let Some(hit) = lock(&self.obj_cache).get(&key) {
            return Ok(Arc::clone(hit));
        }

        log::debug!("PathTranslator: resolving obj path `{}` on {}", path, entity.name);
        let result = Arc::new(obj_path::translate(scope, entity, path, start_path(path, parent))?);
        Ok(Arc::clone(lock(&self.obj_cache).entry(key).or_insert(result)))
    }

    pub fn translate_db_path<'a>(
        &self,
        scope: PathScope<'_, 'a>,
        entity: &'a DbEntity,
        path: &Path,
        parent: &Path,
    ) -> TranslatorResult<Arc<PathTranslationResult>> {
        let key = (entity.name.clone(), path.clone(), parent.clone());
        if let Some(hit) = lock(&self.db_cache).get(&key) {
            return Ok(Arc::clone(hit));
        }

        log::debug!("PathTranslator: resolving db path `{}` on {}", path, entity.name);
        let result = Arc::new(db_path::translate(scope, entity, path, start_path(path, parent))?);
        Ok(Arc::clone(lock(&self.db_cache).entry(key).or_insert(result)))
    }

    /// An id path names a single column of `entity` and never joins.
    pub fn translate_id_path(
        &self,
        entity: &DbEntity,
        path: &Path,
    ) -> TranslatorResult<PathTranslationResult> {
        let attribute = match path.segments() {
            [segment] => entity.attribute(&segment.name),
            _ => None,
        };
        let attribute = attribute.ok_or_else(|| {
            unresolved(
                &entity.name,
                path,
                path.first().map(|s| s.name.as_str()).unwrap_or_default(),
            )
        })?;

        Ok(PathTranslationResult {
            final_path: Path::root(),
            attribute_paths: vec![Path::root()],
            attributes: vec![attribute.clone()],
            ..Default::default()
        })
    }
}

fn lock(cache: &PathCache) -> MutexGuard<'_, HashMap<CacheKey, Arc<PathTranslationResult>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table path a walk starts from: `parent`, carrying the marker of `path`
/// unless the parent already has one.
fn start_path(path: &Path, parent: &Path) -> Path {
    parent.join(&Path::root().with_marker(path.marker()))
}

pub(crate) fn unresolved(entity: &str, path: &Path, segment: &str) -> TranslatorError {
    TranslatorError::UnresolvedPath {
        entity: entity.to_string(),
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

/// One segment to walk, after path aliases are expanded.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub name: String,
    /// Segment the resulting join is keyed by.
    pub key: PathSegment,
    /// The alias this step came from, if it starts an aliased sub-path.
    pub aliased: Option<String>,
}

/// Replaces aliased segments by the path they stand for. The first hop of
/// an aliased path is keyed by the alias, which splits its joins off from
/// unaliased walks over the same relationship.
pub(crate) fn expand_steps(path: &Path, aliases: &BTreeMap<String, String>) -> Vec<Step> {
    let mut steps = Vec::with_capacity(path.len());
    for segment in path.segments() {
        let Some(target) = aliases.get(&segment.name) else {
            steps.push(Step {
                name: segment.name.clone(),
                key: segment.clone(),
                aliased: None,
            });
            continue;
        };

        for (i, hop) in Path::parse(target).segments().iter().enumerate() {
            if i == 0 {
                steps.push(Step {
                    name: hop.name.clone(),
                    key: PathSegment {
                        name: segment.name.clone(),
                        outer: segment.outer || hop.outer,
                    },
                    aliased: Some(segment.name.clone()),
                });
            } else {
                steps.push(Step {
                    name: hop.name.clone(),
                    key: hop.clone(),
                    aliased: None,
                });
            }
        }
    }
    steps
}
