//! Category Manager for LinkShelf.
//!
//! Categories are stored as one list. Links reference categories by id;
//! deleting a category leaves those references in place.

use tracing::info;
use uuid::Uuid;

use crate::storage::{keys, Storage};
use crate::types::category::{Category, PRESET_ICONS};
use crate::types::errors::CategoryError;

/// Trait defining category management operations.
pub trait CategoryManagerTrait {
    fn list_categories(&self) -> Result<Vec<Category>, CategoryError>;
    fn get_category(&self, id: &str) -> Result<Option<Category>, CategoryError>;
    fn create_category(
        &self,
        name: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category, CategoryError>;
    fn save_category(&self, category: Category) -> Result<Vec<Category>, CategoryError>;
    fn delete_category(&self, id: &str) -> Result<(), CategoryError>;
}

/// Category manager backed by the shared key-value storage.
#[derive(Clone)]
pub struct CategoryManager {
    storage: Storage,
}

impl CategoryManager {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    fn load(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.storage.get_or_default(keys::CATEGORIES)?)
    }

    /// Trims the name, drops empty color/icon strings and checks every field.
    fn validate(category: Category, existing: &[Category]) -> Result<Category, CategoryError> {
        let name = category.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }

        let lower = name.to_lowercase();
        if existing
            .iter()
            .any(|c| c.id != category.id && c.name.to_lowercase() == lower)
        {
            return Err(CategoryError::DuplicateName(name));
        }

        let color = category.color.filter(|c| !c.is_empty());
        if let Some(c) = &color {
            if !is_hex_color(c) {
                return Err(CategoryError::InvalidColor(c.clone()));
            }
        }

        let icon = category.icon.filter(|i| !i.is_empty());
        if let Some(i) = &icon {
            if !PRESET_ICONS.contains(&i.as_str()) {
                return Err(CategoryError::InvalidIcon(i.clone()));
            }
        }

        Ok(Category {
            id: category.id,
            name,
            color,
            icon,
        })
    }
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

impl CategoryManagerTrait for CategoryManager {
    fn list_categories(&self) -> Result<Vec<Category>, CategoryError> {
        self.load()
    }

    fn get_category(&self, id: &str) -> Result<Option<Category>, CategoryError> {
        Ok(self.load()?.into_iter().find(|c| c.id == id))
    }

    /// Creates a category with a fresh id.
    fn create_category(
        &self,
        name: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category, CategoryError> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
            icon: icon.map(str::to_string),
        };
        let id = category.id.clone();
        let saved = self.save_category(category)?;
        saved
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(CategoryError::NotFound(id))
    }

    /// Inserts or replaces (by id) a category. Returns the full list.
    fn save_category(&self, category: Category) -> Result<Vec<Category>, CategoryError> {
        let mut categories = self.load()?;
        let category = Self::validate(category, &categories)?;

        match categories.iter_mut().find(|c| c.id == category.id) {
            Some(slot) => *slot = category,
            None => categories.push(category),
        }
        self.storage.set(keys::CATEGORIES, &categories)?;
        Ok(categories)
    }

    fn delete_category(&self, id: &str) -> Result<(), CategoryError> {
        let mut categories = self.load()?;
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(CategoryError::NotFound(id.to_string()));
        }
        self.storage.set(keys::CATEGORIES, &categories)?;
        info!(category_id = id, "category deleted");
        Ok(())
    }
}
