// SPDX-License-Identifier: Apache-2.0

use crate::fields::{ParseError, Slug};
use crate::ids::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Category {
    #[must_use]
    pub fn new(id: CategoryId, name: String, slug: Slug, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            slug,
            parent_id: None,
            description: None,
            image_url: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(ParseError::InvalidFormat(
                "category must not be its own parent",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_refuses_self_parenting() {
        let mut category = Category::new(
            CategoryId::generate(),
            "Rugs".to_string(),
            Slug::parse("rugs").expect("slug"),
            Utc::now(),
        );
        assert!(category.validate().is_ok());
        category.parent_id = Some(category.id);
        assert!(category.validate().is_err());
    }
}
