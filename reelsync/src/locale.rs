// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Current content language
//!
//! Kept up to date by whoever owns the user's locale and read synchronously when a
//! new stream picks its partition. Changing it never touches existing partitions.

use crate::model::{Category, PartitionKey};
use parking_lot::RwLock;

#[derive(Debug)]
pub struct LocaleCache {
    language: RwLock<String>,
}

impl LocaleCache {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: RwLock::new(language.into()),
        }
    }

    pub fn language(&self) -> String {
        self.language.read().clone()
    }

    /// Returns the previous language
    pub fn set_language(&self, language: impl Into<String>) -> String {
        std::mem::replace(&mut *self.language.write(), language.into())
    }

    /// Partition of `category` in the current language
    pub fn partition(&self, category: Category) -> PartitionKey {
        PartitionKey::new(category, self.language())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_change_yields_new_partition() {
        let locale = LocaleCache::new("en-US");
        let before = locale.partition(Category::Popular);
        assert_eq!(locale.set_language("es-ES"), "en-US");
        let after = locale.partition(Category::Popular);
        assert_ne!(before, after);
        assert_eq!(after.language, "es-ES");
        assert_eq!(before.category, after.category);
    }
}
