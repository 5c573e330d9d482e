//! Location-to-view resolution.
//!
//! The resolver is a pure function of the current location: it never keeps
//! state and identical input always yields an identical view descriptor.
//! Navigation target builders preserve the active search query so a search
//! term survives moving between views; category/tag display names ride
//! along as transient state (`name` parameter) and are optional; views
//! re-derive the name from the fetched lists once loaded.

use hubcart_core::{CategoryId, ProductId, TagId};

/// Resolved representation of "what screen is currently active".
///
/// Computed from the location on every request, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    Category {
        id: CategoryId,
        name: Option<String>,
    },
    Tag {
        id: TagId,
        name: Option<String>,
    },
    Product {
        id: ProductId,
    },
    Orders,
}

impl View {
    /// Whether this view shows catalog data (home/category/tag).
    #[must_use]
    pub const fn shows_catalog(&self) -> bool {
        matches!(self, Self::Home | Self::Category { .. } | Self::Tag { .. })
    }
}

/// Transient navigation state passed by the origin link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    pub name: Option<String>,
}

/// Safely parse an id from a path segment.
fn parse_id(value: &str) -> Option<i32> {
    value.parse::<i32>().ok()
}

/// Resolve a location into exactly one view.
///
/// Mapping: `/` → home; `/categories/{id}` → category; `/tags/{id}` → tag;
/// `/products/{id}` → product; `/orders` → orders; anything unmatched or
/// with an unparseable id falls back to home.
#[must_use]
pub fn resolve(path: &str, state: &NavState) -> View {
    let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());

    match (segments.next(), segments.next(), segments.next()) {
        (None, ..) => View::Home,
        (Some("orders"), None, _) => View::Orders,
        (Some("categories"), Some(raw_id), None) => parse_id(raw_id).map_or(View::Home, |id| {
            View::Category {
                id: CategoryId::new(id),
                name: state.name.clone(),
            }
        }),
        (Some("tags"), Some(raw_id), None) => parse_id(raw_id).map_or(View::Home, |id| View::Tag {
            id: TagId::new(id),
            name: state.name.clone(),
        }),
        (Some("products"), Some(raw_id), None) => {
            parse_id(raw_id).map_or(View::Home, |id| View::Product {
                id: ProductId::new(id),
            })
        }
        _ => View::Home,
    }
}

/// Build a query string from optional search and transient name, preserving
/// the search term across navigation.
fn build_query(search: Option<&str>, name: Option<&str>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Some(search) = search
        && !search.is_empty()
    {
        serializer.append_pair("search", search);
    }
    if let Some(name) = name
        && !name.is_empty()
    {
        serializer.append_pair("name", name);
    }

    let query = serializer.finish();
    if query.is_empty() {
        query
    } else {
        format!("?{query}")
    }
}

/// Target for "go home".
#[must_use]
pub fn home_target(search: Option<&str>) -> String {
    format!("/{}", build_query(search, None))
}

/// Target for a category view; the display name travels as transient state.
#[must_use]
pub fn category_target(id: CategoryId, name: Option<&str>, search: Option<&str>) -> String {
    format!("/categories/{id}{}", build_query(search, name))
}

/// Target for a tag view.
#[must_use]
pub fn tag_target(id: TagId, name: Option<&str>, search: Option<&str>) -> String {
    format!("/tags/{id}{}", build_query(search, name))
}

/// Target for a product detail view.
#[must_use]
pub fn product_target(id: ProductId) -> String {
    format!("/products/{id}")
}

/// Target for the orders view.
#[must_use]
pub fn orders_target(search: Option<&str>) -> String {
    format!("/orders{}", build_query(search, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_home() {
        assert_eq!(resolve("/", &NavState::default()), View::Home);
        assert_eq!(resolve("", &NavState::default()), View::Home);
    }

    #[test]
    fn test_resolve_category_with_name() {
        let state = NavState {
            name: Some("Чай".to_string()),
        };
        assert_eq!(
            resolve("/categories/7", &state),
            View::Category {
                id: CategoryId::new(7),
                name: Some("Чай".to_string()),
            }
        );
    }

    #[test]
    fn test_resolve_tolerates_absent_name() {
        assert_eq!(
            resolve("/tags/3", &NavState::default()),
            View::Tag {
                id: TagId::new(3),
                name: None,
            }
        );
    }

    #[test]
    fn test_unparseable_id_falls_back_to_home() {
        assert_eq!(resolve("/categories/abc", &NavState::default()), View::Home);
        assert_eq!(resolve("/tags/1.5", &NavState::default()), View::Home);
        assert_eq!(resolve("/products/", &NavState::default()), View::Home);
    }

    #[test]
    fn test_unmatched_path_falls_back_to_home() {
        assert_eq!(resolve("/checkout/extra", &NavState::default()), View::Home);
        assert_eq!(resolve("/categories/1/2", &NavState::default()), View::Home);
    }

    #[test]
    fn test_resolve_is_pure() {
        let state = NavState {
            name: Some("Сыр".to_string()),
        };
        assert_eq!(resolve("/categories/2", &state), resolve("/categories/2", &state));
    }

    #[test]
    fn test_targets_preserve_search() {
        assert_eq!(home_target(Some("чай")), "/?search=%D1%87%D0%B0%D0%B9");
        assert_eq!(orders_target(None), "/orders");
        assert_eq!(
            category_target(CategoryId::new(4), Some("Чай"), Some("зел")),
            "/categories/4?search=%D0%B7%D0%B5%D0%BB&name=%D0%A7%D0%B0%D0%B9"
        );
        assert_eq!(product_target(ProductId::new(9)), "/products/9");
    }

    #[test]
    fn test_empty_search_omitted() {
        assert_eq!(home_target(Some("")), "/");
        assert_eq!(tag_target(TagId::new(1), None, None), "/tags/1");
    }
}
