//! Category buckets for the public listing pages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_VISIBLE: usize = 6;
pub const MAX_VISIBLE: usize = 100;

/// Query for the grouped listing endpoints; "load more" raises `visible`.
#[derive(Debug, Deserialize)]
pub struct GroupedQuery {
    pub visible: Option<usize>,
}

impl GroupedQuery {
    pub fn visible(&self) -> usize {
        self.visible.unwrap_or(DEFAULT_VISIBLE).clamp(1, MAX_VISIBLE)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket<T> {
    pub category: String,
    pub total: usize,
    pub has_more: bool,
    pub items: Vec<T>,
}

/// Group `items` by `key`, buckets in order of first appearance, each
/// truncated to `visible` items.
pub fn group_by<T, F>(items: Vec<T>, key: F, visible: usize) -> Vec<CategoryBucket<T>>
where
    F: Fn(&T) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();

    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(category, mut items)| {
            let total = items.len();
            items.truncate(visible);
            CategoryBucket {
                category,
                total,
                has_more: total > visible,
                items,
            }
        })
        .collect()
}
