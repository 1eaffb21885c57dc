//! Per-build identity allocation for images, categories and annotations.

use std::collections::HashMap;

use crate::coco::Category;

/// Hands out stable ids for one corpus build.
///
/// Images and categories are deduplicated by their natural key (relative path
/// and label name); annotations always get a fresh id. Every namespace starts
/// at 1 and grows by exactly 1 per new entry, in first-encounter order.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    image_ids: HashMap<String, u32>,
    category_ids: HashMap<String, u32>,
    last_annotation_id: u32,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `path`, and whether it was allocated by this call.
    pub fn image_id(&mut self, path: &str) -> (u32, bool) {
        get_or_insert(&mut self.image_ids, path)
    }

    pub fn category_id(&mut self, name: &str) -> u32 {
        get_or_insert(&mut self.category_ids, name).0
    }

    pub fn next_annotation_id(&mut self) -> u32 {
        self.last_annotation_id += 1;
        self.last_annotation_id
    }

    /// Categories ordered by id, i.e. by first encounter.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .category_ids
            .iter()
            .map(|(name, &id)| Category::new(id, name.clone()))
            .collect();
        categories.sort_by_key(|c| c.id);
        categories
    }

    pub fn image_count(&self) -> usize {
        self.image_ids.len()
    }

    pub fn category_count(&self) -> usize {
        self.category_ids.len()
    }

    pub fn annotation_count(&self) -> usize {
        self.last_annotation_id as usize
    }
}

fn get_or_insert(ids: &mut HashMap<String, u32>, key: &str) -> (u32, bool) {
    if let Some(&id) = ids.get(key) {
        return (id, false);
    }
    let id = ids.len() as u32 + 1;
    ids.insert(key.to_string(), id);
    (id, true)
}
