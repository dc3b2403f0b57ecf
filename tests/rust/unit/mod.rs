//! Unit tests - individual building blocks through the public API
//!
//! Catalog lookups, the query builder and SQL tree rendering, each tested
//! without running the translation pipeline.
