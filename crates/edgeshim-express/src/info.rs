use serde::Serialize;

use crate::route::RouteDescriptor;

/// Body of `GET /api/info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApiInfo {
    pub categories: Vec<Category>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub items: Vec<InfoItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InfoItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub method: String,
}

/// Group every descriptor that carries metadata by category, in first-seen order. Descriptors
/// without a handler are still listed.
pub fn api_info(routes: &[RouteDescriptor]) -> ApiInfo {
    let mut categories: Vec<Category> = Vec::new();

    for meta in routes.iter().filter_map(RouteDescriptor::meta) {
        let item = InfoItem {
            name: meta.name.clone(),
            description: meta.description.clone(),
            path: meta.advertised_path(),
            author: meta.author.clone(),
            method: meta.method_label().to_string(),
        };

        match categories
            .iter_mut()
            .find(|category| category.name == meta.category)
        {
            Some(category) => category.items.push(item),
            None => categories.push(Category {
                name: meta.category.clone(),
                items: vec![item],
            }),
        }
    }

    ApiInfo { categories }
}
